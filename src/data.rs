use std::fmt::{self, Debug, Display, Formatter};
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// A cell position as (x, y), x growing right, y growing down (row 0 at the top).
///
/// The derived `Ord` (x ascending, then y ascending) is the canonical crate
/// order - `State` relies on it to keep its crate list sorted.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Pos {
    pub fn new(x: i32, y: i32) -> Pos {
        Pos { x, y }
    }

    /// Manhattan distance.
    pub fn dist(self, other: Pos) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    pub fn neighbors(self) -> [Pos; 4] {
        [
            self + Dir::Up,
            self + Dir::Down,
            self + Dir::Left,
            self + Dir::Right,
        ]
    }
}

impl Add<Dir> for Pos {
    type Output = Pos;

    fn add(self, dir: Dir) -> Pos {
        let (dx, dy) = dir.offset();
        Pos::new(self.x + dx, self.y + dy)
    }
}

impl Sub<Dir> for Pos {
    type Output = Pos;

    fn sub(self, dir: Dir) -> Pos {
        self + dir.inverse()
    }
}

impl Debug for Pos {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

impl Display for Pos {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Cardinal direction. Enumeration order is fixed - the solver depends on it
/// for deterministic move generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dir {
    Up,
    Down,
    Left,
    Right,
}

pub const DIRECTIONS: [Dir; 4] = [Dir::Up, Dir::Down, Dir::Left, Dir::Right];

impl Dir {
    pub fn offset(self) -> (i32, i32) {
        match self {
            Dir::Up => (0, -1),
            Dir::Down => (0, 1),
            Dir::Left => (-1, 0),
            Dir::Right => (1, 0),
        }
    }

    pub fn inverse(self) -> Dir {
        match self {
            Dir::Up => Dir::Down,
            Dir::Down => Dir::Up,
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }

    /// The direction whose offset is `to - from`, if they are one cardinal
    /// step apart.
    pub fn between(from: Pos, to: Pos) -> Option<Dir> {
        DIRECTIONS.iter().copied().find(|&d| from + d == to)
    }
}

impl Display for Dir {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let c = match *self {
            Dir::Up => 'u',
            Dir::Down => 'd',
            Dir::Left => 'l',
            Dir::Right => 'r',
        };
        write!(f, "{}", c)
    }
}

/// Static cell kind. Holes and fake holes swallow the first crate pushed onto
/// them; a fake hole is an inner wall converted for looks and is ignored by
/// difficulty metrics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Terrain {
    Floor,
    #[default]
    Wall,
    Hole,
    FakeHole,
    Target,
    Entrance,
    Exit,
}

impl Terrain {
    pub fn player_can_walk(self) -> bool {
        // Exit has to be walkable - winning requires standing on it
        matches!(
            self,
            Terrain::Floor | Terrain::Target | Terrain::Entrance | Terrain::Exit
        )
    }

    pub fn can_receive_crate(self) -> bool {
        matches!(
            self,
            Terrain::Floor | Terrain::Target | Terrain::Hole | Terrain::FakeHole
        )
    }

    pub fn is_hole(self) -> bool {
        matches!(self, Terrain::Hole | Terrain::FakeHole)
    }

    pub fn is_true_hole(self) -> bool {
        self == Terrain::Hole
    }
}

impl Display for Terrain {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let c = match *self {
            Terrain::Floor => '.',
            Terrain::Wall => '#',
            Terrain::Hole => 'H',
            Terrain::FakeHole => 'h',
            Terrain::Target => 'T',
            Terrain::Entrance => '>',
            Terrain::Exit => '<',
        };
        write!(f, "{}", c)
    }
}

/// A single transition of the game state.
///
/// Both variants carry the player's cells; a push additionally tracks the
/// crate's cells and the (redundant) push direction for logging.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    PlayerMove {
        player_from: Pos,
        player_to: Pos,
    },
    CratePush {
        player_from: Pos,
        player_to: Pos,
        crate_from: Pos,
        crate_to: Pos,
        dir: Dir,
    },
}

impl Move {
    pub fn player_from(&self) -> Pos {
        match *self {
            Move::PlayerMove { player_from, .. } | Move::CratePush { player_from, .. } => {
                player_from
            }
        }
    }

    pub fn player_to(&self) -> Pos {
        match *self {
            Move::PlayerMove { player_to, .. } | Move::CratePush { player_to, .. } => player_to,
        }
    }

    pub fn is_push(&self) -> bool {
        matches!(self, Move::CratePush { .. })
    }

    pub fn dir(&self) -> Dir {
        match *self {
            Move::PlayerMove {
                player_from,
                player_to,
            } => Dir::between(player_from, player_to).unwrap_or(Dir::Up),
            Move::CratePush { dir, .. } => dir,
        }
    }
}

impl Display for Move {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        // lowercase step, uppercase push
        if self.is_push() {
            write!(f, "{}", self.dir().to_string().to_uppercase())
        } else {
            write!(f, "{}", self.dir())
        }
    }
}

impl Debug for Move {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}
