use super::traits::WorkflowFile;
use crate::core::models::error::ModelError;
use crate::core::models::workflow::Workflow;
use std::io::{BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowFileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed workflow document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid workflow: {0}")]
    Model(#[from] ModelError),
}

/// Workflow documents in the FireWorks JSON layout, pretty-printed on write.
pub struct JsonFile;

impl WorkflowFile for JsonFile {
    type Error = WorkflowFileError;

    fn read_from(reader: &mut impl BufRead) -> Result<Workflow, Self::Error> {
        let workflow: Workflow = serde_json::from_reader(reader)?;
        workflow.validate()?;
        Ok(workflow)
    }

    fn write_to(workflow: &Workflow, writer: &mut impl Write) -> Result<(), Self::Error> {
        serde_json::to_writer_pretty(&mut *writer, workflow)?;
        writeln!(writer)?;
        Ok(())
    }
}
