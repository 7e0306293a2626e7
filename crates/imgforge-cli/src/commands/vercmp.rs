//! Handler for `imgforge vercmp`.

use imgforge_core::package::EcosystemKind;
use imgforge_ops::ops_vercmp;
use miette::Result;

pub fn exec(a: &str, b: &str, ecosystem: EcosystemKind) -> Result<()> {
    let ord = ops_vercmp::vercmp(a, b, ecosystem);
    println!("{}", ops_vercmp::symbol(ord));
    Ok(())
}
