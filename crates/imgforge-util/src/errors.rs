use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for imgforge operations that touch the outside world.
///
/// The resolver has its own typed error; this one covers loading templates,
/// reading catalogs and writing lockfiles.
#[derive(Debug, Error, Diagnostic)]
pub enum ImgforgeError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or malformed image template (e.g. imgforge.toml).
    #[error("Template error: {message}")]
    #[diagnostic(help("Check your imgforge.toml for syntax errors"))]
    Template { message: String },

    /// A package catalog could not be read or parsed.
    #[error("Catalog error: {message}")]
    #[diagnostic(help("Catalogs are JSON arrays of package records"))]
    Catalog { message: String },

    /// Dependency resolution failed (conflicts, missing packages).
    #[error("Dependency resolution failed: {message}")]
    Resolution { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type ImgforgeResult<T> = miette::Result<T>;
