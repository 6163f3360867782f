//! # Engine Module
//!
//! An in-process replay backend for workflows.
//!
//! ## Overview
//!
//! Real workflows are executed by an external orchestration server. This module
//! provides just enough of one to run a workflow locally, one firework at a time,
//! which is how workflows and their powerups are exercised end to end in tests:
//! a workflow decorated with replay tasks runs without any simulation binary.
//!
//! ## Architecture
//!
//! - **Launchpad** ([`launchpad`]) - Stores fireworks, their states and their launches
//! - **Worker** ([`worker`]) - Name and environment of the machine running fireworks
//! - **Rocket launcher** ([`rocket`]) - Runs ready fireworks in fresh launch directories
//! - **Executor** ([`executor`]) - Executes individual tasks inside a launch directory
//! - **Progress** ([`progress`]) - Progress events for front-ends
//! - **Error Handling** ([`error`]) - Engine-specific error types

pub mod error;
pub(crate) mod executor;
pub mod launchpad;
pub mod progress;
pub mod rocket;
pub mod worker;
