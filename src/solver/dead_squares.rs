use std::collections::VecDeque;

use crate::data::{Pos, Terrain, DIRECTIONS};
use crate::grid::{Grid, TerrainGrid};

/// Static table of squares from which no crate can ever reach any target,
/// independent of other crates. Built once per solver invocation.
///
/// Safe squares are found by pulling backwards from the targets: a square A
/// is safe if some safe square B is one push away and the pusher has a
/// non-wall cell to stand on behind A.
#[derive(Debug)]
pub struct DeadSquareMap {
    safe: Grid<bool>,
}

impl DeadSquareMap {
    pub fn build(terrain: &TerrainGrid) -> DeadSquareMap {
        let mut safe = terrain.scratchpad::<bool>();
        let mut queue: VecDeque<Pos> = VecDeque::new();

        for target in terrain.targets() {
            safe[target] = true;
            queue.push_back(target);
        }

        while let Some(b) = queue.pop_front() {
            for &dir in &DIRECTIONS {
                let a = b - dir; // candidate crate cell
                let c = a - dir; // cell the pusher must stand on
                if !terrain.contains(a) || !terrain.contains(c) {
                    continue;
                }
                if terrain[a] == Terrain::Wall || terrain[c] == Terrain::Wall {
                    continue;
                }
                if !safe[a] {
                    safe[a] = true;
                    queue.push_back(a);
                }
            }
        }

        DeadSquareMap { safe }
    }

    /// True for out-of-bounds, walls and every square never marked safe.
    pub fn is_dead(&self, pos: Pos) -> bool {
        !self.safe.contains(pos) || !self.safe[pos]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Terrain::*;

    fn parse_shape(rows: &[&[Terrain]]) -> TerrainGrid {
        Grid::from_rows(rows.iter().map(|r| r.to_vec()).collect())
    }

    #[test]
    fn corridor_with_blocked_pusher() {
        // #####
        // #T..#
        // #####
        // The crate on (3,1) can't be pushed left - the pusher would have to
        // stand inside the wall at (4,1).
        let terrain = parse_shape(&[
            &[Wall, Wall, Wall, Wall, Wall],
            &[Wall, Target, Floor, Floor, Wall],
            &[Wall, Wall, Wall, Wall, Wall],
        ]);
        let map = DeadSquareMap::build(&terrain);

        assert!(!map.is_dead(Pos::new(1, 1)));
        assert!(!map.is_dead(Pos::new(2, 1)));
        assert!(map.is_dead(Pos::new(3, 1)));
    }

    #[test]
    fn walls_and_outside_are_dead() {
        let terrain = parse_shape(&[
            &[Wall, Wall, Wall],
            &[Wall, Target, Wall],
            &[Wall, Wall, Wall],
        ]);
        let map = DeadSquareMap::build(&terrain);
        assert!(!map.is_dead(Pos::new(1, 1)));
        assert!(map.is_dead(Pos::new(0, 0)));
        assert!(map.is_dead(Pos::new(-1, 1)));
        assert!(map.is_dead(Pos::new(3, 1)));
    }

    #[test]
    fn corners_of_an_open_room_are_dead() {
        // ......
        // ..T...
        // ......
        // no surrounding walls - the edges themselves block the pusher
        let floor_row: Vec<Terrain> = vec![Floor; 6];
        let mut target_row = floor_row.clone();
        target_row[2] = Target;
        let terrain = Grid::from_rows(vec![floor_row.clone(), target_row, floor_row]);
        let map = DeadSquareMap::build(&terrain);

        // cells on the border can't be pushed back inward
        assert!(map.is_dead(Pos::new(0, 0)));
        assert!(map.is_dead(Pos::new(5, 2)));
        // the inner row is reachable by pulls from the target
        assert!(!map.is_dead(Pos::new(2, 1)));
        assert!(!map.is_dead(Pos::new(4, 1)));
    }

    #[test]
    fn holes_do_not_block_the_pull() {
        // holes are not walls - a crate may travel across a hole cell on the
        // way to a target as far as this table is concerned
        let terrain = parse_shape(&[
            &[Wall, Wall, Wall, Wall, Wall, Wall],
            &[Wall, Target, Hole, Floor, Floor, Wall],
            &[Wall, Wall, Wall, Wall, Wall, Wall],
        ]);
        let map = DeadSquareMap::build(&terrain);
        assert!(!map.is_dead(Pos::new(2, 1)));
        assert!(!map.is_dead(Pos::new(3, 1)));
    }
}
