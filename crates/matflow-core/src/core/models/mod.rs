//! # Core Models Module
//!
//! Data structures describing a workflow in the FireWorks model.
//!
//! ## Key Components
//!
//! - [`workflow`] - The workflow: ordered fireworks plus parent/child links
//! - [`firework`] - One job: a name and a spec holding the task list and metadata
//! - [`task`] - Task kinds the library builds and rewrites, plus opaque pass-through tasks
//! - [`tracker`] - File trackers that tail output files of a running job
//! - [`structure`] - Crystal structures fed to VASP input writers
//! - [`input_set`] - Named VASP parameter sets
//! - [`ids`] - Firework identifiers
//! - [`error`] - Errors raised by structural edits
//!
//! ## Usage
//!
//! ```ignore
//! use matflow::core::models::{firework::Firework, task::Task, workflow::Workflow};
//!
//! let fw = Firework::new(-1, "static", vec![Task::run_vasp_direct("vasp")]);
//! let wf = Workflow::from_firework(fw, "single static");
//! ```

pub mod error;
pub mod firework;
pub mod ids;
pub mod input_set;
pub mod structure;
pub mod task;
pub mod tracker;
pub mod workflow;
