// src/exec/command.rs

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use anyhow::anyhow;

use crate::config::WorkerConfig;
use crate::exec::invoker::{WorkerInvoker, WorkerRequest};
use crate::exec::runner::run_worker_command;

/// Production invoker: runs the shell command configured for each worker.
#[derive(Debug, Clone, Default)]
pub struct CommandInvoker {
    workers: BTreeMap<String, WorkerConfig>,
}

impl CommandInvoker {
    pub fn new(workers: BTreeMap<String, WorkerConfig>) -> Self {
        Self { workers }
    }
}

impl WorkerInvoker for CommandInvoker {
    fn invoke(
        &self,
        request: WorkerRequest,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + '_>> {
        Box::pin(async move {
            let worker = self
                .workers
                .get(&request.name)
                .ok_or_else(|| anyhow!("no command configured for worker '{}'", request.name))?;
            run_worker_command(&request, &worker.cmd).await
        })
    }
}
