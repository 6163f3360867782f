pub mod inspect;
pub mod lammps;
pub mod powerup;
pub mod run;

use crate::error::{CliError, Result};
use matflow::core::io::json::JsonFile;
use matflow::core::io::traits::WorkflowFile;
use matflow::core::models::workflow::Workflow;
use std::path::Path;
use tracing::info;

pub(crate) fn read_workflow(path: &Path) -> Result<Workflow> {
    info!("Loading workflow from {:?}", path);
    JsonFile::read_from_path(path).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    })
}

pub(crate) fn write_workflow(workflow: &Workflow, path: &Path) -> Result<()> {
    info!("Writing workflow '{}' to {:?}", workflow.name(), path);
    JsonFile::write_to_path(workflow, path).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    })
}
