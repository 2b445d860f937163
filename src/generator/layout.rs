use rand::Rng;

use crate::data::Pos;
use crate::grid::Grid;
use crate::scanner::FloodFillScanner;

const TILE: i32 = 5;

/// The room-shape vocabulary. Each mask is stamped with "or" semantics and
/// may be rotated by any multiple of 90 degrees; a placement is rejected if
/// one of its 0 cells would sit on floor that is already there. The set
/// decides how generated levels look, so it is part of the contract.
pub const TEMPLATES: [[[u8; 5]; 5]; 17] = [
    // solid block
    [
        [1, 1, 1, 1, 1],
        [1, 1, 1, 1, 1],
        [1, 1, 1, 1, 1],
        [1, 1, 1, 1, 1],
        [1, 1, 1, 1, 1],
    ],
    // wide hall
    [
        [0, 0, 0, 0, 0],
        [1, 1, 1, 1, 1],
        [1, 1, 1, 1, 1],
        [1, 1, 1, 1, 1],
        [0, 0, 0, 0, 0],
    ],
    // small chamber
    [
        [0, 0, 0, 0, 0],
        [0, 1, 1, 1, 0],
        [0, 1, 1, 1, 0],
        [0, 1, 1, 1, 0],
        [0, 0, 0, 0, 0],
    ],
    // plus
    [
        [0, 0, 1, 0, 0],
        [0, 0, 1, 0, 0],
        [1, 1, 1, 1, 1],
        [0, 0, 1, 0, 0],
        [0, 0, 1, 0, 0],
    ],
    // ring around a pillar
    [
        [1, 1, 1, 1, 1],
        [1, 1, 1, 1, 1],
        [1, 1, 0, 1, 1],
        [1, 1, 1, 1, 1],
        [1, 1, 1, 1, 1],
    ],
    // big L
    [
        [1, 1, 0, 0, 0],
        [1, 1, 0, 0, 0],
        [1, 1, 0, 0, 0],
        [1, 1, 1, 1, 1],
        [1, 1, 1, 1, 1],
    ],
    // T junction
    [
        [1, 1, 1, 1, 1],
        [1, 1, 1, 1, 1],
        [0, 0, 1, 1, 0],
        [0, 0, 1, 1, 0],
        [0, 0, 1, 1, 0],
    ],
    // staircase
    [
        [1, 1, 0, 0, 0],
        [1, 1, 1, 0, 0],
        [0, 1, 1, 1, 0],
        [0, 0, 1, 1, 1],
        [0, 0, 0, 1, 1],
    ],
    // U room
    [
        [1, 1, 0, 1, 1],
        [1, 1, 0, 1, 1],
        [1, 1, 0, 1, 1],
        [1, 1, 1, 1, 1],
        [1, 1, 1, 1, 1],
    ],
    // S bend
    [
        [0, 0, 1, 1, 1],
        [0, 0, 1, 1, 1],
        [0, 0, 1, 0, 0],
        [1, 1, 1, 0, 0],
        [1, 1, 1, 0, 0],
    ],
    // narrow corridor
    [
        [0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0],
        [1, 1, 1, 1, 1],
        [0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0],
    ],
    // corner blob
    [
        [1, 1, 1, 0, 0],
        [1, 1, 1, 0, 0],
        [1, 1, 1, 1, 0],
        [0, 0, 1, 1, 1],
        [0, 0, 0, 1, 1],
    ],
    // H rooms
    [
        [1, 1, 0, 1, 1],
        [1, 1, 0, 1, 1],
        [1, 1, 1, 1, 1],
        [1, 1, 0, 1, 1],
        [1, 1, 0, 1, 1],
    ],
    // diamond
    [
        [0, 0, 1, 0, 0],
        [0, 1, 1, 1, 0],
        [1, 1, 1, 1, 1],
        [0, 1, 1, 1, 0],
        [0, 0, 1, 0, 0],
    ],
    // two parallel halls
    [
        [1, 1, 1, 1, 1],
        [1, 1, 1, 1, 1],
        [0, 0, 0, 0, 0],
        [1, 1, 1, 1, 1],
        [1, 1, 1, 1, 1],
    ],
    // hooked corridor
    [
        [1, 1, 1, 1, 1],
        [0, 0, 0, 0, 1],
        [0, 0, 0, 0, 1],
        [0, 0, 0, 0, 1],
        [1, 1, 1, 1, 1],
    ],
    // alcove wall
    [
        [1, 1, 1, 1, 1],
        [1, 1, 1, 1, 1],
        [1, 0, 0, 0, 1],
        [1, 1, 0, 1, 1],
        [1, 1, 1, 1, 1],
    ],
];

fn rotate_cw(tile: &[[u8; 5]; 5]) -> [[u8; 5]; 5] {
    let mut out = [[0u8; 5]; 5];
    for (y, row) in out.iter_mut().enumerate() {
        for (x, cell) in row.iter_mut().enumerate() {
            *cell = tile[4 - x][y];
        }
    }
    out
}

/// Stamps random templates into a w x h canvas until about a third of it is
/// floor (or placements keep failing), keeps the largest 4-connected
/// component and trims it to its bounding box plus a one-cell wall ring.
/// `true` cells are floor.
pub fn generate_layout(width: i32, height: i32, rng: &mut impl Rng) -> Grid<bool> {
    let mut cells = Grid::new(width, height, false);
    let mut placed = 0;
    let goal = width * height / 3;

    let mut failures = 0;
    while placed < goal && failures < 100 {
        if width < TILE || height < TILE {
            failures += 1;
            continue;
        }

        let mut tile = TEMPLATES[rng.gen_range(0..TEMPLATES.len())];
        for _ in 0..rng.gen_range(0..4) {
            tile = rotate_cw(&tile);
        }
        let x0 = rng.gen_range(0..=width - TILE);
        let y0 = rng.gen_range(0..=height - TILE);

        match stamp(&mut cells, &tile, x0, y0) {
            Some(added) => {
                placed += added;
                failures = 0;
            }
            None => failures += 1,
        }
    }

    if placed == 0 {
        cells[Pos::new(width / 2, height / 2)] = true;
    }

    let component = largest_component(&cells);
    trim(&component)
}

/// Or-in `tile` at (x0, y0) and report how many new floor cells appeared,
/// or `None` when a 0 cell of the tile would cover existing floor.
fn stamp(cells: &mut Grid<bool>, tile: &[[u8; 5]; 5], x0: i32, y0: i32) -> Option<i32> {
    for (dy, row) in tile.iter().enumerate() {
        for (dx, &cell) in row.iter().enumerate() {
            let pos = Pos::new(x0 + dx as i32, y0 + dy as i32);
            if cell == 0 && cells[pos] {
                return None;
            }
        }
    }

    let mut added = 0;
    for (dy, row) in tile.iter().enumerate() {
        for (dx, &cell) in row.iter().enumerate() {
            let pos = Pos::new(x0 + dx as i32, y0 + dy as i32);
            if cell == 1 && !cells[pos] {
                cells[pos] = true;
                added += 1;
            }
        }
    }
    Some(added)
}

fn largest_component(cells: &Grid<bool>) -> Vec<Pos> {
    let mut scanner = FloodFillScanner::new();
    let mut assigned = cells.scratchpad::<bool>();
    let mut best: Vec<Pos> = Vec::new();

    for pos in cells.positions() {
        if !cells[pos] || assigned[pos] {
            continue;
        }
        let reached = scanner.scan(cells, pos, &[]).to_vec();
        for &p in &reached {
            assigned[p] = true;
        }
        if reached.len() > best.len() {
            best = reached;
        }
    }

    best
}

fn trim(component: &[Pos]) -> Grid<bool> {
    let min_x = component.iter().map(|p| p.x).min().unwrap_or(0);
    let max_x = component.iter().map(|p| p.x).max().unwrap_or(0);
    let min_y = component.iter().map(|p| p.y).min().unwrap_or(0);
    let max_y = component.iter().map(|p| p.y).max().unwrap_or(0);

    let mut out = Grid::new(max_x - min_x + 3, max_y - min_y + 3, false);
    for &p in component {
        out[Pos::new(p.x - min_x + 1, p.y - min_y + 1)] = true;
    }
    out
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn templates_are_17_and_nonempty() {
        assert_eq!(TEMPLATES.len(), 17);
        for tile in &TEMPLATES {
            let floor: u32 = tile.iter().flatten().map(|&c| u32::from(c)).sum();
            assert!(floor > 0);
            assert!(tile.iter().flatten().all(|&c| c <= 1));
        }
    }

    #[test]
    fn rotation_cycles() {
        for tile in &TEMPLATES {
            let once = rotate_cw(tile);
            let four = rotate_cw(&rotate_cw(&rotate_cw(&once)));
            assert_eq!(&four, tile);
        }
        // a concrete quarter turn
        let mut marker = [[0u8; 5]; 5];
        marker[0][1] = 1;
        let rotated = rotate_cw(&marker);
        assert_eq!(rotated[1][4], 1);
    }

    #[test]
    fn layout_has_wall_ring_and_one_component() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let layout = generate_layout(12, 10, &mut rng);

        // padded border is wall
        for x in 0..layout.width() {
            assert!(!layout[Pos::new(x, 0)]);
            assert!(!layout[Pos::new(x, layout.height() - 1)]);
        }
        for y in 0..layout.height() {
            assert!(!layout[Pos::new(0, y)]);
            assert!(!layout[Pos::new(layout.width() - 1, y)]);
        }

        // exactly one connected component of floor
        let floors: Vec<Pos> = layout.positions().filter(|&p| layout[p]).collect();
        assert!(!floors.is_empty());
        let mut scanner = FloodFillScanner::new();
        let reached = scanner.scan(&layout, floors[0], &[]);
        assert_eq!(reached.len(), floors.len());
    }

    #[test]
    fn tiny_canvas_degenerates_to_single_floor() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let layout = generate_layout(3, 3, &mut rng);
        let floors = layout.positions().filter(|&p| layout[p]).count();
        assert_eq!(floors, 1);
        assert_eq!(layout.width(), 3);
        assert_eq!(layout.height(), 3);
    }

    #[test]
    fn layouts_are_deterministic_per_seed() {
        let a = generate_layout(14, 14, &mut ChaCha8Rng::seed_from_u64(7));
        let b = generate_layout(14, 14, &mut ChaCha8Rng::seed_from_u64(7));
        assert_eq!(
            a.positions().filter(|&p| a[p]).collect::<Vec<_>>(),
            b.positions().filter(|&p| b[p]).collect::<Vec<_>>()
        );
    }
}
