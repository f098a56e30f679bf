use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use ripplewatch::exec::{WorkerInvoker, WorkerRequest};

/// What a scripted worker does when invoked.
#[derive(Debug, Clone)]
pub enum Behaviour {
    Succeed(String),
    Fail(String),
    /// Sleep, then succeed with this output.
    Delay(Duration, String),
    Panic,
}

/// A fake invoker that:
/// - records which workers were invoked (and with which request)
/// - tracks how many invocations overlapped
/// - behaves per worker as scripted (default: succeed with "ok").
#[derive(Clone, Default)]
pub struct FakeInvoker {
    behaviours: Arc<Mutex<HashMap<String, Behaviour>>>,
    invoked: Arc<Mutex<Vec<WorkerRequest>>>,
    running: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

struct RunningGuard<'a> {
    running: &'a AtomicUsize,
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.running.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FakeInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, worker: &str, behaviour: Behaviour) -> Self {
        self.behaviours
            .lock()
            .unwrap()
            .insert(worker.to_string(), behaviour);
        self
    }

    pub fn invoked(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .invoked
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn requests(&self) -> Vec<WorkerRequest> {
        self.invoked.lock().unwrap().clone()
    }

    /// Largest number of workers observed running at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl WorkerInvoker for FakeInvoker {
    fn invoke(
        &self,
        request: WorkerRequest,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + '_>> {
        Box::pin(async move {
            let behaviour = self
                .behaviours
                .lock()
                .unwrap()
                .get(&request.name)
                .cloned()
                .unwrap_or_else(|| Behaviour::Succeed("ok".to_string()));
            self.invoked.lock().unwrap().push(request);

            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            let _running = RunningGuard {
                running: &self.running,
            };

            match behaviour {
                Behaviour::Succeed(out) => {
                    // Yield so sibling workers get a chance to overlap.
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok(out)
                }
                Behaviour::Fail(msg) => Err(anyhow!(msg)),
                Behaviour::Delay(d, out) => {
                    tokio::time::sleep(d).await;
                    Ok(out)
                }
                Behaviour::Panic => panic!("scripted worker panic"),
            }
        })
    }
}
