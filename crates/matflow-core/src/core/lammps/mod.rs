//! # LAMMPS Module
//!
//! Template-driven LAMMPS input files.
//!
//! A [`input::LammpsInput`] is an ordered list of LAMMPS commands plus the data
//! file they read. It is built either from a template file (JSON, or TOML by
//! extension) or from the canned NVT template, with user settings layered on
//! top, and renders to the plain-text input LAMMPS expects.

pub mod input;
