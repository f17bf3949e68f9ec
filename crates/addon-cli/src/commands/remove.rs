//! The `add-on remove` command

use addon_core::{Manifest, Output, Project, Remover};

use crate::error::Result;

pub fn run_remove(
    project: &dyn Project,
    output: &dyn Output,
    identifier: &str,
    verbose: bool,
) -> Result<Manifest> {
    let manifest = Remover::new(project, output)
        .verbose(verbose)
        .remove(identifier)?;
    Ok(manifest)
}
