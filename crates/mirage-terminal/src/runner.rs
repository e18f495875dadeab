//! Dual-mode pipeline dispatcher.
//!
//! On construction the runner probes for an isolated execution unit — a
//! worker thread running the streaming interpreter and answering over a
//! channel. If the probe fails, every request takes the synchronous path
//! permanently. With a worker, each request is correlated by a fresh id and
//! drained under a deadline; on deadline expiry the id is orphaned (the
//! worker keeps computing, its chunks are discarded — a known resource
//! leak) and the same command is re-run synchronously. Re-execution is not
//! safe for side-effecting commands; the current verb set is read-only over
//! the files map, which is what keeps the fallback sound today.

use std::collections::{BTreeMap, HashSet};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use mirage_types::error::{MirageError, Result};

use crate::interpreter::{self, ChunkMode};
use crate::message::{PipelineRequest, PipelineResponse};

/// Default time to wait for the execution unit before falling back.
pub const DEFAULT_TIMEOUT_MS: u64 = 6000;

/// Execution backend selected at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Worker thread with streaming chunked responses.
    Threaded,
    /// Run every pipeline inline in the caller's context.
    Synchronous,
}

/// Per-call options for [`PipelineRunner::run`].
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Named text blobs the pipeline verbs operate on.
    pub files: BTreeMap<String, String>,
    /// Milliseconds to wait for the worker before the synchronous fallback.
    pub timeout_ms: u64,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            files: BTreeMap::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

enum WorkerRequest {
    Run(PipelineRequest),
    Shutdown,
}

struct Worker {
    tx: mpsc::Sender<WorkerRequest>,
    rx: mpsc::Receiver<PipelineResponse>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    fn spawn() -> std::io::Result<Self> {
        let (req_tx, req_rx) = mpsc::channel::<WorkerRequest>();
        let (resp_tx, resp_rx) = mpsc::channel::<PipelineResponse>();
        let handle = thread::Builder::new()
            .name("mirage-pipeline".into())
            .spawn(move || worker_loop(&req_rx, &resp_tx))?;
        Ok(Self {
            tx: req_tx,
            rx: resp_rx,
            handle: Some(handle),
        })
    }

    fn shutdown(&mut self) {
        let _ = self.tx.send(WorkerRequest::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn worker_loop(rx: &mpsc::Receiver<WorkerRequest>, tx: &mpsc::Sender<PipelineResponse>) {
    while let Ok(request) = rx.recv() {
        match request {
            WorkerRequest::Run(req) => {
                for chunk in interpreter::eval(&req.command, &req.files, ChunkMode::Streaming) {
                    if tx
                        .send(PipelineResponse::Data { id: req.id, chunk })
                        .is_err()
                    {
                        return;
                    }
                }
                if tx.send(PipelineResponse::End { id: req.id }).is_err() {
                    return;
                }
            },
            WorkerRequest::Shutdown => return,
        }
    }
}

enum Drain {
    Done(String),
    TimedOut,
    Fault,
}

/// Decides how a pipeline string is executed and returns its full output.
pub struct PipelineRunner {
    worker: Option<Worker>,
    next_id: u64,
    /// Ids abandoned by a timeout; late messages for them are dropped.
    orphaned: HashSet<u64>,
    timeouts: u64,
}

impl PipelineRunner {
    /// Probe for the worker backend; fall back to synchronous permanently if
    /// the probe fails.
    pub fn new() -> Self {
        Self::with_backend(Backend::Threaded)
    }

    /// Construct with an explicit backend choice (deterministic tests).
    pub fn with_backend(backend: Backend) -> Self {
        let worker = match backend {
            Backend::Threaded => match Worker::spawn() {
                Ok(worker) => Some(worker),
                Err(e) => {
                    log::warn!("pipeline worker unavailable, using synchronous execution: {e}");
                    None
                },
            },
            Backend::Synchronous => None,
        };
        Self {
            worker,
            next_id: 0,
            orphaned: HashSet::new(),
            timeouts: 0,
        }
    }

    /// Whether the worker backend is active.
    pub fn is_threaded(&self) -> bool {
        self.worker.is_some()
    }

    /// Number of requests that hit the timeout fallback so far.
    pub fn timed_out_requests(&self) -> u64 {
        self.timeouts
    }

    /// Execute a pipeline string and return its full textual output.
    pub fn run(&mut self, command: &str, opts: &RunOptions) -> Result<String> {
        if self.worker.is_none() {
            return Ok(interpreter::eval_to_string(command, &opts.files));
        }

        self.next_id += 1;
        let id = self.next_id;
        let request = PipelineRequest {
            id,
            command: command.to_string(),
            files: opts.files.clone(),
        };

        let outcome = self.drain(id, request, Duration::from_millis(opts.timeout_ms));
        match outcome {
            Drain::Done(output) => Ok(output),
            Drain::TimedOut => {
                // Caller-side abandonment: the worker's computation keeps
                // running, its chunks are dropped on arrival.
                self.orphaned.insert(id);
                self.timeouts += 1;
                log::warn!(
                    "pipeline request {id} exceeded {}ms, re-running synchronously",
                    opts.timeout_ms
                );
                Ok(interpreter::eval_to_string(command, &opts.files))
            },
            Drain::Fault => {
                self.discard_worker();
                Err(MirageError::Worker(
                    "execution unit terminated unexpectedly".to_string(),
                ))
            },
        }
    }

    fn drain(&mut self, id: u64, request: PipelineRequest, timeout: Duration) -> Drain {
        let Some(worker) = self.worker.as_ref() else {
            return Drain::Fault;
        };
        if worker.tx.send(WorkerRequest::Run(request)).is_err() {
            return Drain::Fault;
        }

        let deadline = Instant::now() + timeout;
        let mut chunks: Vec<String> = Vec::new();
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Drain::TimedOut;
            }
            match worker.rx.recv_timeout(remaining) {
                Ok(PipelineResponse::Data { id: rid, chunk }) if rid == id => chunks.push(chunk),
                Ok(PipelineResponse::End { id: rid }) if rid == id => {
                    return Drain::Done(chunks.concat());
                },
                Ok(response) => {
                    // A message for an orphaned or unknown id; drop it.
                    let rid = response.id();
                    if matches!(response, PipelineResponse::End { .. }) {
                        self.orphaned.remove(&rid);
                    }
                },
                Err(RecvTimeoutError::Timeout) => return Drain::TimedOut,
                Err(RecvTimeoutError::Disconnected) => return Drain::Fault,
            }
        }
    }

    fn discard_worker(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            if let Some(handle) = worker.handle.take() {
                let _ = handle.join();
            }
        }
        self.orphaned.clear();
    }

    /// Terminate the execution unit and drop all pending bookkeeping. Called
    /// automatically on drop; only needed explicitly at session teardown.
    pub fn dispose(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            worker.shutdown();
        }
        self.orphaned.clear();
    }

    /// Test-only: a worker that accepts requests but never answers, to drive
    /// the timeout fallback deterministically.
    #[cfg(test)]
    fn with_stalled_worker() -> Self {
        let (req_tx, req_rx) = mpsc::channel::<WorkerRequest>();
        let (resp_tx, resp_rx) = mpsc::channel::<PipelineResponse>();
        let handle = thread::Builder::new()
            .name("mirage-pipeline-stalled".into())
            .spawn(move || {
                let _keep_alive = resp_tx;
                while let Ok(request) = req_rx.recv() {
                    if matches!(request, WorkerRequest::Shutdown) {
                        return;
                    }
                }
            })
            .expect("spawn stalled worker");
        Self {
            worker: Some(Worker {
                tx: req_tx,
                rx: resp_rx,
                handle: Some(handle),
            }),
            next_id: 0,
            orphaned: HashSet::new(),
            timeouts: 0,
        }
    }
}

impl Default for PipelineRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PipelineRunner {
    fn drop(&mut self) {
        self.dispose();
    }
}
