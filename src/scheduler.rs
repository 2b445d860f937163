use std::collections::VecDeque;
use std::fmt::{self, Debug, Formatter};

use crate::data::Move;
use crate::rules;
use crate::solution::Solution;
use crate::state::State;

/// Gets told about every applied move so HUDs, indicators and undo stacks
/// can react.
pub trait StateObserver {
    fn state_changed(&mut self, state: &State, applied: &Move);
}

/// Consumes an ordered move sequence against a host-owned state handle.
///
/// The scheduler itself is pacing-agnostic: `step_delay` is the seconds a
/// playback host should wait between [`step`](MoveScheduler::step) calls.
pub struct MoveScheduler {
    state: State,
    queue: VecDeque<Move>,
    observers: Vec<Box<dyn StateObserver>>,
    step_delay: f64,
    interrupted: bool,
}

impl MoveScheduler {
    pub fn new(initial: State) -> MoveScheduler {
        MoveScheduler {
            state: initial,
            queue: VecDeque::new(),
            observers: Vec::new(),
            step_delay: 0.25,
            interrupted: false,
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn step_delay(&self) -> f64 {
        self.step_delay
    }

    pub fn set_step_delay(&mut self, seconds: f64) {
        self.step_delay = seconds;
    }

    pub fn add_observer(&mut self, observer: Box<dyn StateObserver>) {
        self.observers.push(observer);
    }

    pub fn enqueue(&mut self, mov: Move) {
        self.queue.push_back(mov);
    }

    pub fn enqueue_all(&mut self, moves: impl IntoIterator<Item = Move>) {
        self.queue.extend(moves);
    }

    /// Replaying a solution is just enqueueing its moves in order.
    pub fn enqueue_solution(&mut self, solution: &Solution) {
        self.enqueue_all(solution.moves.iter().copied());
    }

    /// Drops all queued moves; an in-flight step still lands.
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// Drops all queued moves and tells the playback host to abort the step
    /// it is currently animating.
    pub fn clear_interrupt(&mut self) {
        self.queue.clear();
        self.interrupted = true;
    }

    /// Whether an interrupt was requested since the last call; resets it.
    pub fn take_interrupt(&mut self) -> bool {
        std::mem::take(&mut self.interrupted)
    }

    /// Applies the next queued move and notifies the observers. Returns
    /// false when the queue is empty.
    pub fn step(&mut self) -> bool {
        let mov = match self.queue.pop_front() {
            Some(mov) => mov,
            None => return false,
        };
        self.state = rules::apply_move(&self.state, &mov);
        for observer in &mut self.observers {
            observer.state_changed(&self.state, &mov);
        }
        true
    }

    /// Runs the queue dry.
    pub fn drain(&mut self) {
        while self.step() {}
    }
}

impl Debug for MoveScheduler {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MoveScheduler {{ pending: {}, observers: {}, step_delay: {} }}",
            self.queue.len(),
            self.observers.len(),
            self.step_delay
        )
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::cancel::CancelToken;
    use crate::parser;
    use crate::solver::{Solver, DEFAULT_MAX_ITERATIONS};

    struct MoveRecorder(Rc<RefCell<Vec<Move>>>);

    impl StateObserver for MoveRecorder {
        fn state_changed(&mut self, _state: &State, applied: &Move) {
            self.0.borrow_mut().push(*applied);
        }
    }

    #[test]
    fn replaying_a_solution_wins() {
        let state = parser::parse("6 1\nP B H B T .", false).unwrap();
        let solver = Solver::new(&state);
        let outcome = solver.is_solvable(&state, DEFAULT_MAX_ITERATIONS, &CancelToken::new());
        let solution = outcome.solution.unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut scheduler = MoveScheduler::new(state);
        scheduler.add_observer(Box::new(MoveRecorder(Rc::clone(&seen))));
        scheduler.enqueue_solution(&solution);
        assert_eq!(scheduler.pending(), solution.len());

        scheduler.drain();
        assert!(scheduler.state().is_win());
        assert_eq!(*seen.borrow(), solution.moves);
    }

    #[test]
    fn clear_and_interrupt() {
        let state = parser::parse("5 1\nP . . . .", false).unwrap();
        let mut scheduler = MoveScheduler::new(state);

        let step_right = |from: i32| Move::PlayerMove {
            player_from: crate::data::Pos::new(from, 0),
            player_to: crate::data::Pos::new(from + 1, 0),
        };
        scheduler.enqueue(step_right(0));
        scheduler.enqueue(step_right(1));
        assert!(scheduler.step());
        scheduler.clear();
        assert_eq!(scheduler.pending(), 0);
        assert!(!scheduler.take_interrupt());

        scheduler.enqueue(step_right(1));
        scheduler.clear_interrupt();
        assert!(scheduler.take_interrupt());
        // the flag resets once observed
        assert!(!scheduler.take_interrupt());
        assert!(!scheduler.step());
    }

    #[test]
    fn step_delay_is_a_setting() {
        let state = parser::parse("2 1\nP .", false).unwrap();
        let mut scheduler = MoveScheduler::new(state);
        scheduler.set_step_delay(0.05);
        assert!((scheduler.step_delay() - 0.05).abs() < 1e-12);
    }
}
