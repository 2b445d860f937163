use std::fmt::{self, Debug, Display, Formatter};
use std::ops::{Index, IndexMut};

use crate::data::{Pos, Terrain};

/// Rectangular grid with flat row-major storage, indexed by `Pos`.
#[derive(Clone, PartialEq, Eq)]
pub struct Grid<T> {
    data: Vec<T>,
    width: i32,
    height: i32,
}

/// The static cell layer of a level. Shared by reference across all states
/// derived from it and never mutated after construction.
pub type TerrainGrid = Grid<Terrain>;

impl<T> Grid<T> {
    pub fn new(width: i32, height: i32, default: T) -> Grid<T>
    where
        T: Clone,
    {
        assert!(width > 0 && height > 0);
        Grid {
            data: vec![default; (width * height) as usize],
            width,
            height,
        }
    }

    pub fn from_rows(rows: Vec<Vec<T>>) -> Grid<T>
    where
        T: Copy,
    {
        assert!(!rows.is_empty() && !rows[0].is_empty());
        let width = rows[0].len();
        assert!(rows.iter().all(|row| row.len() == width));

        let height = rows.len() as i32;
        let mut data = Vec::with_capacity(width * rows.len());
        for row in &rows {
            data.extend_from_slice(row);
        }
        Grid {
            data,
            width: width as i32,
            height,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn contains(&self, pos: Pos) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    pub fn get(&self, pos: Pos) -> Option<&T> {
        if self.contains(pos) {
            Some(&self.data[self.index_of(pos)])
        } else {
            None
        }
    }

    /// Row-major iteration over all positions.
    pub fn positions(&self) -> impl Iterator<Item = Pos> {
        let (width, height) = (self.width, self.height);
        (0..height).flat_map(move |y| (0..width).map(move |x| Pos::new(x, y)))
    }

    /// A same-sized grid for marking cells during a search.
    pub fn scratchpad_with_default<U>(&self, default: U) -> Grid<U>
    where
        U: Clone,
    {
        Grid {
            data: vec![default; self.data.len()],
            width: self.width,
            height: self.height,
        }
    }

    pub fn scratchpad<U>(&self) -> Grid<U>
    where
        U: Clone + Default,
    {
        self.scratchpad_with_default(U::default())
    }

    fn index_of(&self, pos: Pos) -> usize {
        debug_assert!(self.contains(pos), "{:?} out of {}x{}", pos, self.width, self.height);
        (pos.y * self.width + pos.x) as usize
    }
}

impl TerrainGrid {
    /// Terrain at `pos`, walls outside the bounds.
    pub fn at(&self, pos: Pos) -> Terrain {
        self.get(pos).copied().unwrap_or(Terrain::Wall)
    }

    pub fn targets(&self) -> Vec<Pos> {
        self.positions()
            .filter(|&pos| self[pos] == Terrain::Target)
            .collect()
    }

    pub fn count(&self, terrain: Terrain) -> usize {
        self.positions().filter(|&pos| self[pos] == terrain).count()
    }

    pub fn exit(&self) -> Option<Pos> {
        self.positions().find(|&pos| self[pos] == Terrain::Exit)
    }
}

impl<T> Index<Pos> for Grid<T> {
    type Output = T;

    fn index(&self, pos: Pos) -> &T {
        &self.data[self.index_of(pos)]
    }
}

impl<T> IndexMut<Pos> for Grid<T> {
    fn index_mut(&mut self, pos: Pos) -> &mut T {
        let index = self.index_of(pos);
        &mut self.data[index]
    }
}

impl<T: Display> Display for Grid<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for row in self.data.chunks(self.width as usize) {
            for cell in row {
                write!(f, "{}", cell)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl<T: Display> Debug for Grid<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}
