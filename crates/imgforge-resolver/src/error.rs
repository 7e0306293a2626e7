use miette::Diagnostic;
use thiserror::Error;

/// Fatal resolution failures. Any of them aborts the whole resolve call.
///
/// The messages are stable: missing dependencies always say "not found",
/// conflicts always say "conflicting".
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ResolveError {
    /// No package in the catalog satisfies the capability or any of its alternatives.
    #[error("dependency '{capability}' required by '{requirer}' not found in catalog")]
    #[diagnostic(
        code(imgforge::resolve::missing),
        help("add a catalog that provides it, or remove the package that requires it")
    )]
    Missing { capability: String, requirer: String },

    /// Two requesters impose mutually exclusive constraints on one capability.
    #[error("conflicting requirements for '{capability}': {first} vs {second}")]
    #[diagnostic(code(imgforge::resolve::conflicting))]
    Conflicting {
        capability: String,
        first: String,
        second: String,
    },
}
