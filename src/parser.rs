use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use log::warn;

use crate::data::{Pos, Terrain};
use crate::grid::Grid;
use crate::state::{FilledHoles, State, StateErr};

#[derive(Debug, PartialEq, Eq)]
pub enum ParserErr {
    MissingHeader,
    BadHeader(String),
    RowCount { expected: usize, found: usize },
    RowLength { row: usize, expected: usize, found: usize },
    MultiplePlayers,
    NoPlayer,
    NoCrates,
    NoTargets,
    FewerCratesThanTargets { crates: usize, targets: usize },
    Invalid(StateErr),
}

impl Display for ParserErr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            ParserErr::MissingHeader => write!(f, "Missing \"W H\" header line"),
            ParserErr::BadHeader(ref line) => write!(f, "Invalid \"W H\" header: {:?}", line),
            ParserErr::RowCount { expected, found } => {
                write!(f, "Expected {} rows, found {}", expected, found)
            }
            ParserErr::RowLength {
                row,
                expected,
                found,
            } => write!(
                f,
                "Row {} has {} cells, expected {}",
                row, found, expected
            ),
            ParserErr::MultiplePlayers => write!(f, "Too many players"),
            ParserErr::NoPlayer => write!(f, "No player"),
            ParserErr::NoCrates => write!(f, "No crates"),
            ParserErr::NoTargets => write!(f, "No targets"),
            ParserErr::FewerCratesThanTargets { crates, targets } => write!(
                f,
                "{} crates can never cover {} targets",
                crates, targets
            ),
            ParserErr::Invalid(ref err) => write!(f, "Inconsistent level: {}", err),
        }
    }
}

impl Error for ParserErr {}

/// Parses the level text format: a "W H" header line followed by H rows of W
/// space-separated single-character cells, row 0 at the top.
///
/// Unrecognized symbols are logged and treated as floor. With `validate`
/// set, a level must have a player, at least one crate and target, and at
/// least as many crates as targets.
pub fn parse(text: &str, validate: bool) -> Result<State, ParserErr> {
    // trim so levels are easy to write as raw strings
    let mut lines = text.trim_matches('\n').lines();

    let header = lines.next().ok_or(ParserErr::MissingHeader)?;
    let (width, height) = parse_header(header)?;

    let mut rows = Vec::with_capacity(height);
    let mut player = None;
    let mut crates = Vec::new();

    for (y, line) in lines.by_ref().take(height).enumerate() {
        let mut row = Vec::with_capacity(width);
        for (x, token) in line.split_whitespace().enumerate() {
            let pos = Pos::new(x as i32, y as i32);
            let terrain = match token {
                "." | "E" => Terrain::Floor,
                "#" | "X" => Terrain::Wall,
                "H" => Terrain::Hole,
                "T" => Terrain::Target,
                "P" => {
                    set_player(&mut player, pos)?;
                    Terrain::Floor
                }
                "B" => {
                    crates.push(pos);
                    Terrain::Floor
                }
                "p" => {
                    set_player(&mut player, pos)?;
                    Terrain::Target
                }
                "b" => {
                    crates.push(pos);
                    Terrain::Target
                }
                ">" => {
                    set_player(&mut player, pos)?;
                    Terrain::Entrance
                }
                "<" => Terrain::Exit,
                other => {
                    warn!(
                        "unrecognized symbol {:?} at [{}, {}], treating as floor",
                        other, x, y
                    );
                    Terrain::Floor
                }
            };
            row.push(terrain);
        }
        if row.len() != width {
            return Err(ParserErr::RowLength {
                row: y,
                expected: width,
                found: row.len(),
            });
        }
        rows.push(row);
    }

    let trailing = lines.filter(|l| !l.trim().is_empty()).count();
    if rows.len() != height || trailing > 0 {
        return Err(ParserErr::RowCount {
            expected: height,
            found: rows.len() + trailing,
        });
    }

    let player = player.ok_or(ParserErr::NoPlayer)?;
    let terrain = Arc::new(Grid::from_rows(rows));

    if validate {
        let targets = terrain.count(Terrain::Target);
        if crates.is_empty() {
            return Err(ParserErr::NoCrates);
        }
        if targets == 0 {
            return Err(ParserErr::NoTargets);
        }
        if crates.len() < targets {
            return Err(ParserErr::FewerCratesThanTargets {
                crates: crates.len(),
                targets,
            });
        }
    }

    // a malformed grid surfaces here (e.g. the player on a wall)
    State::create(terrain, player, crates, FilledHoles::new()).map_err(ParserErr::Invalid)
}

fn parse_header(line: &str) -> Result<(usize, usize), ParserErr> {
    let mut parts = line.split_whitespace();
    let width = parts.next().and_then(|p| p.parse::<usize>().ok());
    let height = parts.next().and_then(|p| p.parse::<usize>().ok());
    match (width, height, parts.next()) {
        (Some(w), Some(h), None) if w > 0 && h > 0 => Ok((w, h)),
        _ => Err(ParserErr::BadHeader(line.to_owned())),
    }
}

fn set_player(player: &mut Option<Pos>, pos: Pos) -> Result<(), ParserErr> {
    if player.is_some() {
        return Err(ParserErr::MultiplePlayers);
    }
    *player = Some(pos);
    Ok(())
}

/// Renders a state back into the level text format. Inverse of [`parse`]
/// for initial states restricted to the round-tripping symbol subset;
/// fake holes are written as the walls they used to be.
pub fn render(state: &State) -> String {
    let terrain = state.terrain();
    let mut out = format!("{} {}", terrain.width(), terrain.height());

    for y in 0..terrain.height() {
        out.push('\n');
        for x in 0..terrain.width() {
            let pos = Pos::new(x, y);
            if x > 0 {
                out.push(' ');
            }
            out.push(symbol_at(state, pos));
        }
    }
    out
}

fn symbol_at(state: &State, pos: Pos) -> char {
    let terrain = state.terrain()[pos];
    if state.is_crate_at(pos) {
        return if terrain == Terrain::Target { 'b' } else { 'B' };
    }
    if state.is_player_at(pos) {
        return match terrain {
            Terrain::Target => 'p',
            Terrain::Entrance => '>',
            _ => 'P',
        };
    }
    match terrain {
        Terrain::Floor => '.',
        Terrain::Wall | Terrain::FakeHole => '#',
        Terrain::Hole => 'H',
        Terrain::Target => 'T',
        Terrain::Entrance => '>',
        Terrain::Exit => '<',
    }
}

impl Display for State {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", render(self))
    }
}
