use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, RecvTimeoutError};
use log::{debug, info};

use super::{GeneratedLevel, LevelGenerator, WorkerMetrics};
use crate::cancel::CancelToken;
use crate::config::{GenerateOptions, OptionsErr};

/// Outer deadline after which all workers are cancelled.
pub const DRIVER_DEADLINE: Duration = Duration::from_secs(65);

/// The driver's result: the race winner (if any worker produced a solvable
/// level) and metrics for every worker that ran to completion.
#[derive(Debug)]
pub struct GenerationOutcome {
    pub level: Option<GeneratedLevel>,
    pub metrics: Vec<WorkerMetrics>,
}

/// Runs one generator worker to completion.
pub fn run_worker(
    options: &GenerateOptions,
    worker: usize,
    cancel: &CancelToken,
) -> (Option<GeneratedLevel>, WorkerMetrics) {
    let seed = options.worker_seed(worker);
    let started = Instant::now();

    let mut generator = LevelGenerator::new(seed);
    let (level, attempts, states_explored) = generator.generate(options, cancel);

    let metrics = WorkerMetrics {
        worker,
        seed,
        attempts,
        states_explored,
        elapsed: started.elapsed(),
        solved: level.is_some(),
    };
    (level, metrics)
}

/// Races `thread_count` generator workers; the first solvable level wins.
///
/// With `wait_for_full_completion` unset the rest of the pool is cancelled
/// as soon as a winner appears, otherwise every worker runs its budget out.
/// Either way the call returns only after all workers have reported, so
/// metrics cover the whole pool.
pub fn generate_level(options: &GenerateOptions) -> Result<GenerationOutcome, OptionsErr> {
    options.validate()?;

    let cancel = CancelToken::new();
    let started = Instant::now();
    let (tx, rx) = unbounded();

    let outcome = thread::scope(|scope| {
        for worker in 0..options.thread_count {
            let tx = tx.clone();
            let cancel = cancel.clone();
            scope.spawn(move || {
                let result = run_worker(options, worker, &cancel);
                // the driver hanging up early is not the worker's problem
                let _ = tx.send(result);
            });
        }
        drop(tx);

        let mut level: Option<GeneratedLevel> = None;
        let mut metrics = Vec::with_capacity(options.thread_count);
        let mut deadline_hit = false;

        while metrics.len() < options.thread_count {
            let received = if deadline_hit {
                // already cancelled, workers are wrapping up
                rx.recv().map_err(|_| RecvTimeoutError::Disconnected)
            } else {
                rx.recv_timeout(DRIVER_DEADLINE.saturating_sub(started.elapsed()))
            };

            match received {
                Ok((worker_level, worker_metrics)) => {
                    debug!(
                        "worker {} finished, solved: {}",
                        worker_metrics.worker, worker_metrics.solved
                    );
                    metrics.push(worker_metrics);
                    if worker_level.is_some() && level.is_none() {
                        level = worker_level;
                        if !options.wait_for_full_completion {
                            cancel.cancel();
                        }
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    info!("generation deadline reached, cancelling workers");
                    cancel.cancel();
                    deadline_hit = true;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        GenerationOutcome { level, metrics }
    });

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    fn options() -> GenerateOptions {
        GenerateOptions {
            min_size: 8,
            max_size: 10,
            target_count: 1,
            hole_count: 0,
            use_entrance_exit: true,
            seed: 123_456,
            seed_offset: 0,
            thread_count: 1,
            wait_for_full_completion: true,
        }
    }

    #[test]
    fn invalid_options_are_rejected() {
        let mut bad = options();
        bad.thread_count = 0;
        assert_eq!(generate_level(&bad).unwrap_err(), OptionsErr::NoThreads);
    }

    #[test]
    fn single_thread_runs_are_reproducible() {
        let options = options();
        let first = generate_level(&options).unwrap();
        let second = generate_level(&options).unwrap();

        let first_level = first.level.expect("no level generated");
        let second_level = second.level.expect("no level generated");

        assert_eq!(first_level.state, second_level.state);
        assert_eq!(first_level.solution.moves, second_level.solution.moves);
        assert_eq!(
            parser::render(&first_level.state),
            parser::render(&second_level.state)
        );
    }

    #[test]
    fn metrics_cover_every_worker() {
        let options = GenerateOptions {
            thread_count: 3,
            ..options()
        };
        let outcome = generate_level(&options).unwrap();
        assert!(outcome.level.is_some());
        assert_eq!(outcome.metrics.len(), 3);

        // seed_offset 0 runs identical copies; with full completion they
        // must all have solved
        assert!(outcome.metrics.iter().all(|m| m.solved));
        let seeds: Vec<u64> = outcome.metrics.iter().map(|m| m.seed).collect();
        assert_eq!(seeds, vec![123_456, 123_456, 123_456]);
    }

    #[test]
    fn racing_cancels_losers() {
        let options = GenerateOptions {
            thread_count: 4,
            seed_offset: 1,
            wait_for_full_completion: false,
            ..options()
        };
        let outcome = generate_level(&options).unwrap();
        // someone must have won and everyone must have reported back
        assert!(outcome.level.is_some());
        assert_eq!(outcome.metrics.len(), 4);
    }

    #[test]
    fn exhausted_pool_returns_no_level() {
        // a 3x3 canvas trims to a single floor cell - features can never fit
        let options = GenerateOptions {
            min_size: 3,
            max_size: 3,
            thread_count: 2,
            ..options()
        };
        let outcome = generate_level(&options).unwrap();
        assert!(outcome.level.is_none());
        assert_eq!(outcome.metrics.len(), 2);
        assert!(outcome.metrics.iter().all(|m| !m.solved));
    }
}
