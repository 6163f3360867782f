//! # Workflows Module
//!
//! The user-facing layer: functions that build complete workflows from domain
//! parameters and powerups that rewrite an existing workflow.
//!
//! - **LAMMPS** ([`lammps`]) - Write-input then run pipelines, from a template file or the
//!   canned NVT template
//! - **VASP** ([`vasp`]) - The basic structure optimization -> static workflow
//! - **Powerups** ([`powerups`]) - Error correction, replay, trackers, priorities,
//!   marker files and INCAR edits applied to VASP workflows
//! - **Configuration** ([`config`]) - Builders and parameter sets for the above

pub mod config;
pub mod lammps;
pub mod powerups;
pub mod vasp;
