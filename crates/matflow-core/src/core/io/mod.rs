//! # I/O Module
//!
//! Readers and writers for the files this library produces or edits itself.
//!
//! - [`traits`] - The [`traits::WorkflowFile`] interface for workflow documents
//! - [`json`] - Workflow documents in the FireWorks JSON layout
//! - [`incar`] - VASP INCAR parameter files
//! - [`poscar`] - VASP POSCAR and KPOINTS writers

pub mod incar;
pub mod json;
pub mod poscar;
pub mod traits;
