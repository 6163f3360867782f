//! # Core Module
//!
//! Stateless building blocks shared by the engine and workflow layers.
//!
//! - [`models`] - Workflow, firework, task, tracker and structure models
//! - [`io`] - Readers and writers for workflow files and VASP input files
//! - [`lammps`] - LAMMPS input templates and rendering
//! - [`utils`] - Slugs and worker environment lookups

pub mod io;
pub mod lammps;
pub mod models;
pub mod utils;
