//! Bounded parallel sub-tasks inside one unit of work.
//!
//! Jobs run on scoped worker threads pulled from a shared queue. Every
//! outcome is reported back over a channel; once any job fails the
//! remaining queued jobs are skipped and the first real failure is
//! returned to the caller, which is expected to roll back.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use tracing::warn;

use crate::deadline::Deadline;
use crate::error::{EngineError, Result};

pub type Job<'env, T> = Box<dyn FnOnce() -> Result<T> + Send + 'env>;

enum Outcome<T> {
    Done(T),
    Failed(EngineError),
    Skipped,
}

/// Run `jobs` on at most `workers` threads and return their results in
/// submission order, or the first error any of them produced.
pub fn run_bounded<'env, T: Send>(
    workers: usize,
    deadline: Deadline,
    jobs: Vec<Job<'env, T>>,
) -> Result<Vec<T>> {
    let total = jobs.len();
    if total == 0 {
        return Ok(Vec::new());
    }

    let (job_tx, job_rx) = crossbeam_channel::unbounded::<(usize, Job<'env, T>)>();
    for (idx, job) in jobs.into_iter().enumerate() {
        job_tx
            .send((idx, job))
            .map_err(|_| EngineError::Internal("job queue closed".into()))?;
    }
    drop(job_tx);

    let (result_tx, result_rx) = crossbeam_channel::unbounded::<(usize, Outcome<T>)>();
    let failed = AtomicBool::new(false);
    let mut panicked = false;

    thread::scope(|scope| {
        let handles: Vec<_> = (0..workers.clamp(1, total))
            .map(|_| {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                let failed = &failed;
                scope.spawn(move || {
                    for (idx, job) in job_rx.iter() {
                        let outcome = if failed.load(Ordering::Acquire) {
                            Outcome::Skipped
                        } else if deadline.expired() {
                            Outcome::Failed(EngineError::DeadlineExceeded)
                        } else {
                            match job() {
                                Ok(value) => Outcome::Done(value),
                                Err(e) => Outcome::Failed(e),
                            }
                        };

                        if matches!(outcome, Outcome::Failed(_)) {
                            failed.store(true, Ordering::Release);
                        }
                        if result_tx.send((idx, outcome)).is_err() {
                            break;
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            if handle.join().is_err() {
                panicked = true;
            }
        }
    });
    drop(result_tx);

    if panicked {
        warn!("fan-out worker panicked");
        return Err(EngineError::Internal("worker panicked".into()));
    }

    let mut slots: Vec<Option<T>> = (0..total).map(|_| None).collect();
    let mut first_error = None;
    for (idx, outcome) in result_rx.iter() {
        match outcome {
            Outcome::Done(value) => slots[idx] = Some(value),
            Outcome::Failed(e) => {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
            Outcome::Skipped => {}
        }
    }

    if let Some(e) = first_error {
        return Err(e);
    }

    slots
        .into_iter()
        .map(|slot| slot.ok_or_else(|| EngineError::Internal("job produced no result".into())))
        .collect()
}
