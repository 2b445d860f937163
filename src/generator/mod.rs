pub mod driver;
pub mod features;
pub mod layout;

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::cancel::CancelToken;
use crate::config::GenerateOptions;
use crate::data::Terrain;
use crate::solution::Solution;
use crate::solver::{Solver, GENERATOR_MAX_ITERATIONS};
use crate::state::State;

/// Per-worker retry budget.
pub const MAX_ATTEMPTS: u32 = 5000;
/// Per-worker wall-time budget.
pub const ATTEMPT_TIME_LIMIT: Duration = Duration::from_secs(60);

/// A solvable level together with the witness the acceptance search found.
#[derive(Debug, Clone)]
pub struct GeneratedLevel {
    pub state: State,
    pub solution: Solution,
}

/// What one worker did, whether it won the race or not.
#[derive(Debug, Clone, Copy)]
pub struct WorkerMetrics {
    pub worker: usize,
    pub seed: u64,
    pub attempts: u32,
    pub states_explored: u64,
    pub elapsed: Duration,
    pub solved: bool,
}

/// The retry loop: shape a room, place features, ask the solver. First
/// accepted candidate wins; rejected ones are thrown away.
#[derive(Debug)]
pub struct LevelGenerator {
    rng: ChaCha8Rng,
}

impl LevelGenerator {
    pub fn new(seed: u64) -> LevelGenerator {
        LevelGenerator {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Up to [`MAX_ATTEMPTS`] tries or [`ATTEMPT_TIME_LIMIT`], whichever
    /// comes first. Returns the level (if any), attempts used and states
    /// explored across all acceptance searches.
    pub fn generate(
        &mut self,
        options: &GenerateOptions,
        cancel: &CancelToken,
    ) -> (Option<GeneratedLevel>, u32, u64) {
        let started = Instant::now();
        let mut explored: u64 = 0;

        for attempt in 1..=MAX_ATTEMPTS {
            if cancel.is_cancelled() || started.elapsed() > ATTEMPT_TIME_LIMIT {
                return (None, attempt - 1, explored);
            }

            let width = self.draw_size(options.min_size, options.max_size);
            let height = self.draw_size(options.min_size, options.max_size);
            let shape = layout::generate_layout(width, height, &mut self.rng);

            let candidate = match features::place_features(
                &shape,
                options.target_count,
                options.hole_count,
                options.use_entrance_exit,
                &mut self.rng,
            ) {
                Some(candidate) => candidate,
                None => continue,
            };

            let solver = Solver::new(&candidate);
            let outcome = solver.is_solvable(&candidate, GENERATOR_MAX_ITERATIONS, cancel);
            explored += outcome.states_explored;

            if let Some(solution) = outcome.solution {
                let state = match decorate(&candidate) {
                    Some(state) => state,
                    None => {
                        warn!("post-processing broke a solvable candidate, retrying");
                        continue;
                    }
                };
                debug!(
                    "accepted a level after {} attempts, {} states explored",
                    attempt, explored
                );
                let solution = Solution {
                    moves: solution.moves,
                    initial_state: state.clone(),
                    states_explored: solution.states_explored,
                };
                return (Some(GeneratedLevel { state, solution }), attempt, explored);
            }
        }

        (None, MAX_ATTEMPTS, explored)
    }

    fn draw_size(&mut self, min: i32, max: i32) -> i32 {
        use rand::Rng;
        if min >= max {
            min
        } else {
            self.rng.gen_range(min..max)
        }
    }
}

/// Cosmetic pass applied after acceptance: the perimeter becomes solid wall
/// (except entrance and exit) and every inner wall turns into a fake hole.
/// The accepted solution never touches the changed cells, so it stays valid.
fn decorate(state: &State) -> Option<State> {
    let src = state.terrain();
    let mut terrain = src.clone();

    for pos in src.positions() {
        let on_border =
            pos.x == 0 || pos.y == 0 || pos.x == src.width() - 1 || pos.y == src.height() - 1;
        let cell = src[pos];
        if on_border {
            if cell != Terrain::Entrance && cell != Terrain::Exit {
                terrain[pos] = Terrain::Wall;
            }
        } else if cell == Terrain::Wall {
            terrain[pos] = Terrain::FakeHole;
        }
    }

    State::create(
        Arc::new(terrain),
        state.player(),
        state.crates().to_vec(),
        state.filled_holes().clone(),
    )
    .ok()
}
