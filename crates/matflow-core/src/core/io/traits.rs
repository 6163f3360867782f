use crate::core::models::workflow::Workflow;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Defines the interface for reading and writing serialized workflows.
///
/// Implementors handle one document format; the path helpers are shared.
pub trait WorkflowFile {
    /// The error type for I/O operations.
    type Error: Error + From<io::Error>;

    /// Reads a workflow from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails, the document does not describe a valid
    /// workflow, or I/O operations encounter issues.
    fn read_from(reader: &mut impl BufRead) -> Result<Workflow, Self::Error>;

    /// Writes a workflow to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    fn write_to(workflow: &Workflow, writer: &mut impl Write) -> Result<(), Self::Error>;

    /// Reads a workflow from a file path.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Workflow, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    /// Writes a workflow to a file path, replacing any existing file.
    fn write_to_path<P: AsRef<Path>>(workflow: &Workflow, path: P) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(workflow, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
