// src/exec/invoker.rs

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;

use crate::types::RiskLevel;

/// Set in the environment of every worker process. A run that sees it
/// analyses as usual but dispatches no workers of its own.
pub const SUBPROCESS_ENV_VAR: &str = "RIPPLEWATCH_SUBPROCESS";

/// What a worker is asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerRequest {
    pub name: String,
    pub root: PathBuf,
    pub risk: RiskLevel,
    pub changed_files: Vec<String>,
    pub prompt: Option<String>,
    /// Budget the scheduler enforces; informational for the worker.
    pub timeout: Duration,
}

/// Runs one worker to completion.
///
/// The scheduler wraps every call in its own timeout and drops the future
/// when it expires, so implementations must clean up on drop.
pub trait WorkerInvoker: Send + Sync {
    /// Returns the worker's textual result, or an error if it failed.
    fn invoke(
        &self,
        request: WorkerRequest,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + '_>>;
}
