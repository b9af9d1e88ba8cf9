//! Worker pool for `bandsteer batch` (§2a/§5).
//!
//! The teacher crate has no concurrency primitives of its own beyond the
//! follow-loop's `thread::sleep`; this is the first real worker pool in
//! the codebase, so it sticks to the plainest thing that works: a job
//! queue behind `std::sync::mpsc`, `max_workers` threads draining it, and
//! `tracing` for per-capture progress instead of bare `eprintln!` (§1a).

use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

use bandsteer_core::{EngineConfig, UserMetadata};

pub type BatchResult = Result<(PathBuf, PathBuf), (PathBuf, String)>;

/// Runs `analyze_capture` + `persist_analysis` for every path in `inputs`
/// across `worker_count` threads, returning one [`BatchResult`] per input
/// in the same order `inputs` was given.
pub fn run_batch(inputs: Vec<PathBuf>, config: EngineConfig, worker_count: usize) -> Vec<BatchResult> {
    let total = inputs.len();
    let (job_tx, job_rx) = mpsc::channel::<(usize, PathBuf)>();
    let job_rx = Arc::new(Mutex::new(job_rx));
    let (result_tx, result_rx) = mpsc::channel::<(usize, BatchResult)>();

    for (index, path) in inputs.into_iter().enumerate() {
        job_tx
            .send((index, path))
            .expect("receiver outlives all sends: workers join before this fn returns");
    }
    drop(job_tx);

    let mut handles = Vec::with_capacity(worker_count);
    for _ in 0..worker_count {
        let job_rx = Arc::clone(&job_rx);
        let result_tx = result_tx.clone();
        let config = config.clone();

        handles.push(thread::spawn(move || {
            loop {
                let job = {
                    let rx = job_rx.lock().expect("worker job queue lock poisoned");
                    rx.recv()
                };
                let Ok((index, path)) = job else {
                    break;
                };

                tracing::info!(capture = %path.display(), "analyzing");
                let outcome = analyze_one(&path, &config);
                if let Err((_, ref message)) = outcome {
                    tracing::warn!(capture = %path.display(), error = %message, "analysis failed");
                }
                if result_tx.send((index, outcome)).is_err() {
                    break;
                }
            }
        }));
    }
    drop(result_tx);

    let mut ordered: Vec<Option<BatchResult>> = (0..total).map(|_| None).collect();
    for (index, outcome) in result_rx {
        ordered[index] = Some(outcome);
    }

    for handle in handles {
        let _ = handle.join();
    }

    ordered
        .into_iter()
        .map(|entry| entry.expect("every sent job produces exactly one result"))
        .collect()
}

fn analyze_one(path: &PathBuf, config: &EngineConfig) -> BatchResult {
    let metadata = UserMetadata::default();
    let analysis = bandsteer_core::analyze_capture(path, &metadata, config)
        .map_err(|err| (path.clone(), err.to_string()))?;
    let json_path = bandsteer_core::persist::persist_analysis(&analysis, path, config)
        .map_err(|err| (path.clone(), err.to_string()))?;
    Ok((path.clone(), json_path))
}
