// src/exec/mod.rs

//! Worker execution layer.
//!
//! The scheduler talks to a [`WorkerInvoker`] instead of spawning processes
//! itself, so tests can swap in a scripted invoker.
//!
//! - [`command`] is the production invoker: one shell command per worker,
//!   taken from `[worker.<name>]` in the config.
//! - [`runner`] spawns and supervises that command.

pub mod command;
pub mod invoker;
pub mod runner;

pub use command::CommandInvoker;
pub use invoker::{SUBPROCESS_ENV_VAR, WorkerInvoker, WorkerRequest};
