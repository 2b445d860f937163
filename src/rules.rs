use crate::data::{Dir, Move};
use crate::state::State;

/// Classifies the cell one step from the player: a walkable cell yields a
/// `PlayerMove`, a pushable crate yields a `CratePush`, anything else none.
pub fn try_build_move(state: &State, dir: Dir) -> Option<Move> {
    let player_from = state.player();
    let player_to = player_from + dir;

    if state.can_player_walk(player_to) {
        return Some(Move::PlayerMove {
            player_from,
            player_to,
        });
    }

    if state.is_crate_at(player_to) {
        let crate_to = player_to + dir;
        if state.can_receive_crate(crate_to) {
            return Some(Move::CratePush {
                player_from,
                player_to,
                crate_from: player_to,
                crate_to,
                dir,
            });
        }
    }

    None
}

/// Dispatches to the state's with-methods. The `Move` enum is closed, so a
/// corrupted move kind is unrepresentable here.
pub fn apply_move(state: &State, mov: &Move) -> State {
    match *mov {
        Move::PlayerMove { player_to, .. } => state.with_player_move(player_to),
        Move::CratePush {
            player_to,
            crate_from,
            crate_to,
            ..
        } => state.with_crate_push(player_to, crate_from, crate_to),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::data::Pos;
    use crate::data::Terrain::*;
    use crate::grid::Grid;
    use crate::state::FilledHoles;

    fn corridor_state() -> State {
        // P B . # .
        let terrain = Arc::new(Grid::from_rows(vec![vec![Floor, Floor, Floor, Wall, Floor]]));
        State::create(
            terrain,
            Pos::new(0, 0),
            vec![Pos::new(1, 0)],
            FilledHoles::new(),
        )
        .unwrap()
    }

    #[test]
    fn build_push() {
        let state = corridor_state();
        let mov = try_build_move(&state, Dir::Right).unwrap();
        assert_eq!(
            mov,
            Move::CratePush {
                player_from: Pos::new(0, 0),
                player_to: Pos::new(1, 0),
                crate_from: Pos::new(1, 0),
                crate_to: Pos::new(2, 0),
                dir: Dir::Right,
            }
        );

        let pushed = apply_move(&state, &mov);
        assert_eq!(pushed.player(), Pos::new(1, 0));
        assert_eq!(pushed.crates(), &[Pos::new(2, 0)]);
    }

    #[test]
    fn blocked_directions() {
        let state = corridor_state();
        // wall above/below the corridor (out of bounds)
        assert_eq!(try_build_move(&state, Dir::Up), None);
        assert_eq!(try_build_move(&state, Dir::Down), None);
        assert_eq!(try_build_move(&state, Dir::Left), None);
    }

    #[test]
    fn push_blocked_by_wall() {
        // P B # - the crate can't move into the wall
        let terrain = Arc::new(Grid::from_rows(vec![vec![Floor, Floor, Wall]]));
        let state = State::create(
            terrain,
            Pos::new(0, 0),
            vec![Pos::new(1, 0)],
            FilledHoles::new(),
        )
        .unwrap();
        assert_eq!(try_build_move(&state, Dir::Right), None);
    }

    #[test]
    fn build_step() {
        let state = corridor_state();
        let stepped = apply_move(&state, &try_build_move(&state, Dir::Right).unwrap());
        // after the push the cell ahead is free
        let mov = try_build_move(&stepped, Dir::Left).unwrap();
        assert_eq!(
            mov,
            Move::PlayerMove {
                player_from: Pos::new(1, 0),
                player_to: Pos::new(0, 0),
            }
        );
    }
}
