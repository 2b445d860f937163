use std::fmt::{self, Debug, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::data::{Move, Pos, Terrain};
use crate::state::State;

/// A witness path found by the solver, together with the state it starts
/// from and the search effort it took.
#[derive(Debug, Clone)]
pub struct Solution {
    pub moves: Vec<Move>,
    pub initial_state: State,
    pub states_explored: u64,
}

impl Solution {
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn push_cnt(&self) -> usize {
        self.moves.iter().filter(|m| m.is_push()).count()
    }

    pub fn metrics(&self) -> Metrics {
        Metrics::of(self)
    }
}

impl Display for Solution {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        // lowercase steps, uppercase pushes
        for mov in &self.moves {
            write!(f, "{}", mov)?;
        }
        Ok(())
    }
}

/// Difficulty metrics over a solution. The constants are a contract - they
/// decide user-visible difficulty labels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    pub length: usize,
    pub pushes: usize,
    pub true_holes: usize,
    pub targets: usize,
    pub dispersion: f64,
    pub difficulty: f64,
}

impl Metrics {
    pub fn of(solution: &Solution) -> Metrics {
        let state = &solution.initial_state;
        let length = solution.len();
        let pushes = solution.push_cnt();
        let true_holes = state.terrain().count(Terrain::Hole);
        let targets = state.targets().len();
        let dispersion = dispersion(state);

        let explored = solution.states_explored as f64;
        let search_density = (explored / length.max(1) as f64 + 1.0).log2();
        let push_weight = 0.3 * log5(pushes as f64 + 1.0);
        let feature_weight = 0.3 * ((true_holes + targets) as f64 + 1.0).log2();
        let difficulty =
            (search_density + push_weight + feature_weight + dispersion / 100.0).clamp(0.5, 10.0);

        Metrics {
            length,
            pushes,
            true_holes,
            targets,
            dispersion,
            difficulty,
        }
    }
}

impl Display for Metrics {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "Moves: {}", self.length)?;
        writeln!(f, "Pushes: {}", self.pushes)?;
        writeln!(f, "Holes: {}", self.true_holes)?;
        writeln!(f, "Targets: {}", self.targets)?;
        writeln!(f, "Dispersion: {:.2}", self.dispersion)?;
        write!(f, "Difficulty: {:.2}", self.difficulty)
    }
}

/// Mean over crates of the Manhattan distance to the nearest target,
/// divided by the crate count.
fn dispersion(state: &State) -> f64 {
    let crates = state.crates();
    if crates.is_empty() {
        return 0.0;
    }
    let total: i32 = crates
        .iter()
        .map(|&c| {
            state
                .targets()
                .iter()
                .map(|&t| c.dist(t))
                .min()
                .unwrap_or(0)
        })
        .sum();
    let mean = f64::from(total) / crates.len() as f64;
    mean / crates.len() as f64
}

fn log5(x: f64) -> f64 {
    x.ln() / 5f64.ln()
}

/// On-disk solution document, `{LevelName, StepCount, SolveTimeMs, Moves[]}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolutionDoc {
    #[serde(rename = "LevelName")]
    pub level_name: String,
    #[serde(rename = "StepCount")]
    pub step_count: usize,
    #[serde(rename = "SolveTimeMs")]
    pub solve_time_ms: u64,
    #[serde(rename = "Moves")]
    pub moves: Vec<MoveRecord>,
}

/// One move of a solution document. `crate_from`/`crate_to`/`direction` are
/// zero-valued for plain player moves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveRecord {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "playerFrom")]
    pub player_from: Pos,
    #[serde(rename = "playerTo")]
    pub player_to: Pos,
    #[serde(rename = "crateFrom")]
    pub crate_from: Pos,
    #[serde(rename = "crateTo")]
    pub crate_to: Pos,
    #[serde(rename = "direction")]
    pub direction: Pos,
}

impl MoveRecord {
    pub fn from_move(mov: &Move) -> MoveRecord {
        match *mov {
            Move::PlayerMove {
                player_from,
                player_to,
            } => MoveRecord {
                kind: "PlayerMove".to_owned(),
                player_from,
                player_to,
                crate_from: Pos::default(),
                crate_to: Pos::default(),
                direction: Pos::default(),
            },
            Move::CratePush {
                player_from,
                player_to,
                crate_from,
                crate_to,
                dir,
            } => {
                let (dx, dy) = dir.offset();
                MoveRecord {
                    kind: "CratePush".to_owned(),
                    player_from,
                    player_to,
                    crate_from,
                    crate_to,
                    direction: Pos::new(dx, dy),
                }
            }
        }
    }
}

impl SolutionDoc {
    pub fn new(level_name: &str, solution: &Solution, solve_time_ms: u64) -> SolutionDoc {
        SolutionDoc {
            level_name: level_name.to_owned(),
            step_count: solution.len(),
            solve_time_ms,
            moves: solution.moves.iter().map(MoveRecord::from_move).collect(),
        }
    }
}
