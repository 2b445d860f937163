pub mod dead_squares;

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use fnv::FnvHashMap;
use log::debug;
use typed_arena::Arena;

use crate::cancel::CancelToken;
use crate::data::{Dir, Move, Pos, Terrain, DIRECTIONS};
use crate::rules;
use crate::solution::Solution;
use crate::state::State;

use self::dead_squares::DeadSquareMap;

/// Iteration cap for the standalone solving API.
pub const DEFAULT_MAX_ITERATIONS: u64 = 10_000_000;
/// Tight cap used by the generator's acceptance calls.
pub const GENERATOR_MAX_ITERATIONS: u64 = 1500;
/// Absolute wall-time ceiling per search.
pub const SOLVER_TIME_LIMIT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// A winning path was found.
    Solved,
    /// The whole reachable state space was searched, there is no solution.
    Exhausted,
    /// Iteration or wall-time cap hit; solvability unknown, reported as
    /// unsolvable to callers.
    BudgetExceeded,
    /// Cooperative cancellation was observed.
    Cancelled,
}

#[derive(Debug)]
pub struct SolveOutcome {
    pub status: SolveStatus,
    pub solution: Option<Solution>,
    pub states_explored: u64,
}

impl SolveOutcome {
    pub fn solvable(&self) -> bool {
        self.status == SolveStatus::Solved
    }
}

/// Breadth-first search over game states.
///
/// States are arena-allocated; the visited/parent map borrows them by
/// reference, so a state is stored exactly once no matter how many times it
/// is reached.
#[derive(Debug)]
pub struct Solver {
    dead_squares: DeadSquareMap,
}

impl Solver {
    pub fn new(state: &State) -> Solver {
        Solver {
            dead_squares: DeadSquareMap::build(state.terrain()),
        }
    }

    /// Decides solvability within `max_iterations` dequeues and
    /// [`SOLVER_TIME_LIMIT`], producing a witness path when solvable.
    pub fn is_solvable(
        &self,
        initial: &State,
        max_iterations: u64,
        cancel: &CancelToken,
    ) -> SolveOutcome {
        let started = Instant::now();

        let arena = Arena::new();
        let mut parents: FnvHashMap<&State, Option<(&State, Move)>> = FnvHashMap::default();
        let mut queue = VecDeque::new();

        let root: &State = arena.alloc(initial.clone());
        parents.insert(root, None);
        queue.push_back(root);

        let mut iterations: u64 = 0;
        while let Some(current) = queue.pop_front() {
            if cancel.is_cancelled() {
                return SolveOutcome {
                    status: SolveStatus::Cancelled,
                    solution: None,
                    states_explored: iterations,
                };
            }
            // the clock is polled in batches, elapsed() is not free
            if iterations > max_iterations
                || (iterations % 1024 == 0 && started.elapsed() > SOLVER_TIME_LIMIT)
            {
                debug!("solver budget exhausted after {} states", iterations);
                return SolveOutcome {
                    status: SolveStatus::BudgetExceeded,
                    solution: None,
                    states_explored: iterations,
                };
            }

            if current.is_win() {
                debug!("solved after exploring {} states", iterations);
                let solution = reconstruct(&parents, current, initial, iterations);
                return SolveOutcome {
                    status: SolveStatus::Solved,
                    solution: Some(solution),
                    states_explored: iterations,
                };
            }

            for mov in self.valid_moves(current) {
                let next = rules::apply_move(current, &mov);
                if !parents.contains_key(&next) {
                    let next: &State = arena.alloc(next);
                    parents.insert(next, Some((current, mov)));
                    queue.push_back(next);
                }
            }
            iterations += 1;
        }

        SolveOutcome {
            status: SolveStatus::Exhausted,
            solution: None,
            states_explored: iterations,
        }
    }

    /// Convenience wrapper: the witness path under default bounds, or none.
    pub fn find_solution_path(&self, state: &State) -> Option<Vec<Move>> {
        self.is_solvable(state, DEFAULT_MAX_ITERATIONS, &CancelToken::new())
            .solution
            .map(|solution| solution.moves)
    }

    /// Candidate moves in fixed direction order (up, down, left, right) so
    /// searches are reproducible.
    fn valid_moves(&self, state: &State) -> Vec<Move> {
        let mut moves = Vec::with_capacity(4);
        let player_from = state.player();

        for &dir in &DIRECTIONS {
            let player_to = player_from + dir;
            if !state.terrain().contains(player_to) {
                continue;
            }
            if state.can_player_walk(player_to) {
                moves.push(Move::PlayerMove {
                    player_from,
                    player_to,
                });
            } else if state.is_crate_at(player_to) {
                let crate_to = player_to + dir;
                if state.can_receive_crate(crate_to) && self.push_allowed(state, crate_to) {
                    moves.push(Move::CratePush {
                        player_from,
                        player_to,
                        crate_from: player_to,
                        crate_to,
                        dir,
                    });
                }
            }
        }

        moves
    }

    fn push_allowed(&self, state: &State, crate_to: Pos) -> bool {
        let terrain = state.terrain().at(crate_to);
        if terrain == Terrain::Target {
            return true;
        }
        if terrain.is_hole() && !state.is_filled_hole_at(crate_to) {
            // the crate disappears into the hole, it never has to leave
            // this square again - the static pruning tables don't apply
            return true;
        }
        !self.dead_squares.is_dead(crate_to) && !is_corner_deadlock(state, crate_to)
    }
}

/// A non-target square blocked by walls or edges on both axes traps a crate
/// forever.
fn is_corner_deadlock(state: &State, pos: Pos) -> bool {
    if state.terrain().at(pos) == Terrain::Target {
        return false;
    }
    let wall = |p: Pos| state.terrain().at(p) == Terrain::Wall;
    (wall(pos + Dir::Left) || wall(pos + Dir::Right))
        && (wall(pos + Dir::Up) || wall(pos + Dir::Down))
}

fn reconstruct(
    parents: &FnvHashMap<&State, Option<(&State, Move)>>,
    winning: &State,
    initial: &State,
    states_explored: u64,
) -> Solution {
    let mut moves = Vec::new();
    let mut cur = winning;
    while let Some(&Some((prev, mov))) = parents.get(cur) {
        moves.push(mov);
        cur = prev;
    }
    moves.reverse();
    Solution {
        moves,
        initial_state: initial.clone(),
        states_explored,
    }
}
