// src/exec/runner.rs

//! Worker process runner.

use std::process::Stdio;

use anyhow::{Context, Result, bail};
use tokio::process::Command;
use tracing::{debug, info};

use crate::exec::invoker::{SUBPROCESS_ENV_VAR, WorkerRequest};

const STDERR_TAIL_LINES: usize = 5;

fn shell(cmd: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    }
}

/// Run `cmd` for `request` in the project root and return its stdout.
///
/// The child is killed if the returned future is dropped, which is how the
/// scheduler's timeout terminates it. A non-zero exit is an error carrying
/// the tail of stderr.
pub async fn run_worker_command(request: &WorkerRequest, cmd: &str) -> Result<String> {
    info!(worker = %request.name, cmd = %cmd, "starting worker process");

    let mut command = shell(cmd);
    command
        .current_dir(&request.root)
        .env(SUBPROCESS_ENV_VAR, "1")
        .env("RIPPLEWATCH_WORKER", &request.name)
        .env("RIPPLEWATCH_RISK", request.risk.to_string())
        .env("RIPPLEWATCH_CHANGED_FILES", request.changed_files.join("\n"))
        .env("RIPPLEWATCH_TIMEOUT_SECS", request.timeout.as_secs().to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(prompt) = &request.prompt {
        command.env("RIPPLEWATCH_PROMPT", prompt);
    }

    let child = command
        .spawn()
        .with_context(|| format!("spawning process for worker '{}'", request.name))?;

    let output = child
        .wait_with_output()
        .await
        .with_context(|| format!("waiting for process of worker '{}'", request.name))?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    for line in stderr.lines() {
        debug!(worker = %request.name, "stderr: {}", line);
    }

    let code = output.status.code().unwrap_or(-1);
    info!(
        worker = %request.name,
        exit_code = code,
        success = output.status.success(),
        "worker process exited"
    );

    if !output.status.success() {
        let lines: Vec<&str> = stderr.lines().collect();
        let tail = lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join("\n");
        if tail.is_empty() {
            bail!("worker '{}' exited with code {}", request.name, code);
        }
        bail!("worker '{}' exited with code {}: {}", request.name, code, tail);
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
}
