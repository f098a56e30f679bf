// src/config/mod.rs

//! Configuration loading and validation for ripplewatch.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk, tolerating its absence (`loader.rs`).
//! - Validate basic invariants like worker names and timeout tiers
//!   (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{ConfigFile, ConfigSection, RawConfigFile, TimeoutSection, WorkerConfig};
