// src/graph/mod.rs

//! The persisted dependency graph and the analyses run over it.

pub mod cycle;
pub mod impact;
pub mod model;
pub mod resolve;
pub mod risk;
pub mod store;

pub use cycle::{ImportGraph, has_cycle};
pub use impact::ImpactAnalyzer;
pub use model::{DependencyGraphEntry, ImpactEntry, ImpactReason, SignatureChange};
pub use resolve::{ImportResolver, SubstringResolver};
pub use risk::{RiskAssessment, classify};
pub use store::DependencyGraphStore;
