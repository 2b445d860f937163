use std::collections::VecDeque;

use fnv::FnvHashMap;

use crate::data::Pos;
use crate::scanner::{FloodFillScanner, GridGraph};
use crate::state::State;

/// Player-only BFS path finding. Used by interactive controllers; the solver
/// searches over pushes and never calls this.
#[derive(Debug, Default, Clone, Copy)]
pub struct Pather;

impl Pather {
    /// The cells from the first step after `from` through `to`, or `None`
    /// if `to` is unreachable by walking.
    pub fn find_path(state: &State, from: Pos, to: Pos) -> Option<Vec<Pos>> {
        if from == to {
            return Some(Vec::new());
        }

        let mut prevs = FnvHashMap::default();
        prevs.insert(from, from);

        let mut queue = VecDeque::new();
        queue.push_back(from);

        'bfs: while let Some(pos) = queue.pop_front() {
            for next in pos.neighbors() {
                if !state.can_player_walk(next) || prevs.contains_key(&next) {
                    continue;
                }
                prevs.insert(next, pos);
                if next == to {
                    break 'bfs;
                }
                queue.push_back(next);
            }
        }

        if !prevs.contains_key(&to) {
            return None;
        }

        let mut path = Vec::new();
        let mut cur = to;
        while cur != from {
            path.push(cur);
            cur = prevs[&cur];
        }
        path.reverse();
        Some(path)
    }
}

/// The terrain a player can stand on, ignoring crates. Crates are passed to
/// the scanner as obstacles instead so the flood fill can reuse its visit
/// map.
struct WalkableTerrain<'a>(&'a State);

impl GridGraph for WalkableTerrain<'_> {
    fn width(&self) -> i32 {
        self.0.terrain().width()
    }

    fn height(&self) -> i32 {
        self.0.terrain().height()
    }

    fn is_valid(&self, pos: Pos) -> bool {
        self.0.terrain()[pos].player_can_walk() || self.0.is_filled_hole_at(pos)
    }
}

/// Flood-fills the player's reachable area, treating crates as blockers and
/// filled holes as walkable.
#[derive(Default)]
pub struct WalkableAreaScanner {
    scanner: FloodFillScanner,
}

impl WalkableAreaScanner {
    pub fn new() -> WalkableAreaScanner {
        WalkableAreaScanner::default()
    }

    /// Returns the reached cells and the canonical player position - the
    /// minimum of the reached set in (x, y) order. States that differ only
    /// in where the player stands within the same region share it, so it
    /// can serve as an equivalence-class hash key.
    pub fn walkable_area(&mut self, state: &State) -> (&[Pos], Pos) {
        let graph = WalkableTerrain(state);
        self.scanner.scan(&graph, state.player(), state.crates());
        let canonical = self
            .scanner
            .reached()
            .iter()
            .copied()
            .min()
            .unwrap_or_else(|| state.player());
        (self.scanner.reached(), canonical)
    }
}

impl std::fmt::Debug for WalkableAreaScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WalkableAreaScanner")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::data::Terrain::*;
    use crate::grid::Grid;
    use crate::state::FilledHoles;

    fn room() -> State {
        // . . . . .
        // . # B # .
        // . # P # .
        let terrain = Arc::new(Grid::from_rows(vec![
            vec![Floor, Floor, Floor, Floor, Floor],
            vec![Floor, Wall, Floor, Wall, Floor],
            vec![Floor, Wall, Floor, Wall, Floor],
        ]));
        State::create(
            terrain,
            Pos::new(2, 2),
            vec![Pos::new(2, 1)],
            FilledHoles::new(),
        )
        .unwrap()
    }

    #[test]
    fn path_around_walls() {
        // the crate blocks the direct way up, no path out of the niche
        let state = room();
        assert_eq!(Pather::find_path(&state, state.player(), Pos::new(0, 0)), None);

        // without the crate the path goes straight up
        let open = state.with_crate_push(Pos::new(2, 1), Pos::new(2, 1), Pos::new(2, 0));
        // player ended where the crate was; path to the row above
        assert_eq!(
            Pather::find_path(&open, Pos::new(2, 1), Pos::new(2, 1)),
            Some(vec![])
        );
        let path = Pather::find_path(&open, Pos::new(2, 1), Pos::new(0, 0));
        // crate now sits at (2,0), so the way leads around it
        assert!(path.is_none());
    }

    #[test]
    fn walkable_area_blocked_by_crates() {
        let state = room();
        let mut scanner = WalkableAreaScanner::new();
        let (reached, canonical) = scanner.walkable_area(&state);
        // boxed into the niche
        assert_eq!(reached, &[Pos::new(2, 2)]);
        assert_eq!(canonical, Pos::new(2, 2));
    }

    #[test]
    fn canonical_position_is_component_minimum() {
        let terrain = Arc::new(Grid::from_rows(vec![vec![
            Floor, Floor, Floor, Floor,
        ]]));
        let left = State::create(terrain, Pos::new(3, 0), vec![], FilledHoles::new()).unwrap();
        let mut scanner = WalkableAreaScanner::new();
        let (reached, canonical) = scanner.walkable_area(&left);
        assert_eq!(reached.len(), 4);
        assert_eq!(canonical, Pos::new(0, 0));

        // same region, different player cell, same canonical position
        let moved = left.with_player_move(Pos::new(1, 0));
        let (_, canonical2) = scanner.walkable_area(&moved);
        assert_eq!(canonical, canonical2);
    }
}
