use std::error::Error;
use std::fmt::{self, Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use fnv::{FnvHashSet, FnvHasher};

use crate::data::Pos;
use crate::grid::TerrainGrid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateErr {
    PlayerBlocked(Pos),
    DuplicateCrate(Pos),
    PlayerOnCrate(Pos),
    CrateBlocked(Pos),
    NotAHole(Pos),
}

impl Display for StateErr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            StateErr::PlayerBlocked(pos) => write!(f, "Player at {} can't stand there", pos),
            StateErr::DuplicateCrate(pos) => write!(f, "More than one crate at {}", pos),
            StateErr::PlayerOnCrate(pos) => write!(f, "Player and crate both at {}", pos),
            StateErr::CrateBlocked(pos) => write!(f, "Crate at {} can't rest there", pos),
            StateErr::NotAHole(pos) => write!(f, "Filled hole at {} but terrain is not a hole", pos),
        }
    }
}

impl Error for StateErr {}

/// The set of holes that have swallowed a crate.
///
/// Copy-on-write: adding an element that is already present shares the
/// backing set, otherwise a fresh set is allocated. State transitions that
/// don't fill a hole pay nothing.
#[derive(Clone, Default)]
pub struct FilledHoles(Arc<FnvHashSet<Pos>>);

impl FilledHoles {
    pub fn new() -> FilledHoles {
        FilledHoles::default()
    }

    pub fn contains(&self, pos: Pos) -> bool {
        self.0.contains(&pos)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Pos> + '_ {
        self.0.iter().copied()
    }

    pub fn with(&self, pos: Pos) -> FilledHoles {
        if self.0.contains(&pos) {
            FilledHoles(Arc::clone(&self.0))
        } else {
            let mut set = (*self.0).clone();
            set.insert(pos);
            FilledHoles(Arc::new(set))
        }
    }
}

impl PartialEq for FilledHoles {
    fn eq(&self, other: &FilledHoles) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for FilledHoles {}

impl Debug for FilledHoles {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut sorted: Vec<_> = self.0.iter().collect();
        sorted.sort();
        f.debug_set().entries(sorted).finish()
    }
}

/// Immutable puzzle state: shared terrain, player, canonically sorted crates
/// and the filled-hole set. Transitions produce new states via
/// [`with_player_move`](State::with_player_move) and
/// [`with_crate_push`](State::with_crate_push).
#[derive(Clone)]
pub struct State {
    terrain: Arc<TerrainGrid>,
    targets: Arc<Vec<Pos>>,
    player: Pos,
    crates: Arc<Vec<Pos>>,
    filled_holes: FilledHoles,
}

impl State {
    pub fn create(
        terrain: Arc<TerrainGrid>,
        player: Pos,
        mut crates: Vec<Pos>,
        filled_holes: FilledHoles,
    ) -> Result<State, StateErr> {
        crates.sort();
        let targets = Arc::new(terrain.targets());
        let state = State {
            terrain,
            targets,
            player,
            crates: Arc::new(crates),
            filled_holes,
        };
        state.check_invariants()?;
        Ok(state)
    }

    #[cfg(debug_assertions)]
    fn check_invariants(&self) -> Result<(), StateErr> {
        for window in self.crates.windows(2) {
            if window[0] == window[1] {
                return Err(StateErr::DuplicateCrate(window[0]));
            }
        }
        for &pos in self.crates.iter() {
            let terrain = self.terrain.at(pos);
            if !terrain.can_receive_crate() || terrain.is_hole() {
                return Err(StateErr::CrateBlocked(pos));
            }
            if self.filled_holes.contains(pos) {
                return Err(StateErr::CrateBlocked(pos));
            }
            if pos == self.player {
                return Err(StateErr::PlayerOnCrate(pos));
            }
        }
        for pos in self.filled_holes.iter() {
            if !self.terrain.at(pos).is_hole() {
                return Err(StateErr::NotAHole(pos));
            }
        }
        if !self.terrain.at(self.player).player_can_walk()
            && !self.filled_holes.contains(self.player)
        {
            return Err(StateErr::PlayerBlocked(self.player));
        }
        Ok(())
    }

    #[cfg(not(debug_assertions))]
    fn check_invariants(&self) -> Result<(), StateErr> {
        Ok(())
    }

    pub fn terrain(&self) -> &TerrainGrid {
        &self.terrain
    }

    pub fn terrain_handle(&self) -> &Arc<TerrainGrid> {
        &self.terrain
    }

    pub fn player(&self) -> Pos {
        self.player
    }

    pub fn crates(&self) -> &[Pos] {
        &self.crates
    }

    pub fn filled_holes(&self) -> &FilledHoles {
        &self.filled_holes
    }

    pub fn targets(&self) -> &[Pos] {
        &self.targets
    }

    pub fn is_crate_at(&self, pos: Pos) -> bool {
        // crate count is small, a scan beats hashing
        self.crates.contains(&pos)
    }

    pub fn is_player_at(&self, pos: Pos) -> bool {
        self.player == pos
    }

    pub fn is_filled_hole_at(&self, pos: Pos) -> bool {
        self.filled_holes.contains(pos)
    }

    /// Whether the player may stand on `pos`: walkable (or filled-hole)
    /// terrain and no crate on it.
    pub fn can_player_walk(&self, pos: Pos) -> bool {
        if !self.terrain.contains(pos) {
            return false;
        }
        if !self.terrain[pos].player_can_walk() && !self.filled_holes.contains(pos) {
            return false;
        }
        !self.is_crate_at(pos)
    }

    /// Whether a crate may be pushed onto `pos`. A filled hole still accepts
    /// a crate (it rests on top).
    pub fn can_receive_crate(&self, pos: Pos) -> bool {
        if !self.terrain.contains(pos) {
            return false;
        }
        if !self.terrain[pos].can_receive_crate() {
            return false;
        }
        !self.is_crate_at(pos)
    }

    /// True iff every target cell is occupied by a crate.
    pub fn is_solved(&self) -> bool {
        self.targets.iter().all(|&target| self.is_crate_at(target))
    }

    pub fn exit(&self) -> Option<Pos> {
        self.terrain.exit()
    }

    /// Solved, and standing on the exit if the level has one.
    pub fn is_win(&self) -> bool {
        if !self.is_solved() {
            return false;
        }
        match self.exit() {
            Some(exit) => self.player == exit,
            None => true,
        }
    }

    pub fn with_player_move(&self, to: Pos) -> State {
        State {
            terrain: Arc::clone(&self.terrain),
            targets: Arc::clone(&self.targets),
            player: to,
            crates: Arc::clone(&self.crates),
            filled_holes: self.filled_holes.clone(),
        }
    }

    /// Push the crate at `old_crate` to `new_crate`, the player ending up on
    /// `new_player`. A crate pushed onto an unfilled hole disappears and
    /// fills it.
    pub fn with_crate_push(&self, new_player: Pos, old_crate: Pos, new_crate: Pos) -> State {
        debug_assert!(self.is_crate_at(old_crate));

        let fell_in_hole =
            self.terrain.at(new_crate).is_hole() && !self.filled_holes.contains(new_crate);

        let (crates, filled_holes) = if fell_in_hole {
            let crates = self
                .crates
                .iter()
                .copied()
                .filter(|&c| c != old_crate)
                .collect();
            (crates, self.filled_holes.with(new_crate))
        } else {
            // delete old_crate and insert new_crate in one pass, keeping the
            // canonical order
            let mut crates = Vec::with_capacity(self.crates.len());
            let mut inserted = false;
            for &c in self.crates.iter() {
                if c == old_crate {
                    continue;
                }
                if !inserted && new_crate < c {
                    crates.push(new_crate);
                    inserted = true;
                }
                crates.push(c);
            }
            if !inserted {
                crates.push(new_crate);
            }
            (crates, self.filled_holes.clone())
        };

        State {
            terrain: Arc::clone(&self.terrain),
            targets: Arc::clone(&self.targets),
            player: new_player,
            crates: Arc::new(crates),
            filled_holes,
        }
    }
}

impl PartialEq for State {
    fn eq(&self, other: &State) -> bool {
        let terrain_eq =
            Arc::ptr_eq(&self.terrain, &other.terrain) || *self.terrain == *other.terrain;
        terrain_eq
            && self.player == other.player
            && self.crates == other.crates
            && self.filled_holes == other.filled_holes
    }
}

impl Eq for State {}

impl Hash for State {
    fn hash<H: Hasher>(&self, hasher: &mut H) {
        self.player.hash(hasher);
        for c in self.crates.iter() {
            c.hash(hasher);
        }
        // XOR fold keeps the hash independent of set iteration order
        let mut acc = 0u64;
        for pos in self.filled_holes.iter() {
            let mut h = FnvHasher::default();
            pos.hash(&mut h);
            acc ^= h.finish();
        }
        hasher.write_u64(acc);
    }
}

impl Debug for State {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "player {} crates {:?} filled {:?}",
            self.player, self.crates, self.filled_holes
        )
    }
}
