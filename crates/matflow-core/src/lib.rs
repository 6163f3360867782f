//! # matflow Core Library
//!
//! Builders and powerups for LAMMPS and VASP job workflows expressed in the
//! FireWorks model (workflows made of fireworks, fireworks made of tasks).
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer layout:
//!
//! - **[`core`]: The Foundation.** Serializable data models (`Workflow`, `Firework`,
//!   `Task`, `Structure`), LAMMPS input rendering and file I/O for the few plain-text
//!   formats the library writes itself (INCAR, POSCAR, KPOINTS, workflow JSON).
//!
//! - **[`engine`]: The Replay Backend.** A small in-process launchpad and rocket launcher
//!   that executes workflows one firework at a time. It only exists so that workflows and
//!   powerups can be exercised end to end without a real orchestration server.
//!
//! - **[`workflows`]: The Public API.** Workflow builders for LAMMPS and VASP and the
//!   powerups that rewrite an existing workflow (error correction, replay, trackers,
//!   priorities, marker files).

pub mod core;
pub mod engine;
pub mod workflows;
