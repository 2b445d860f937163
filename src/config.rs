use std::error::Error;
use std::fmt::{self, Display, Formatter};

/// Everything the parallel generator needs to know. `seed_offset = 0` is
/// legal and means "run identical copies" - useful for reproducibility
/// testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerateOptions {
    pub min_size: i32,
    pub max_size: i32,
    pub target_count: usize,
    pub hole_count: usize,
    pub use_entrance_exit: bool,
    pub seed: u64,
    pub seed_offset: u64,
    pub thread_count: usize,
    pub wait_for_full_completion: bool,
}

impl Default for GenerateOptions {
    fn default() -> GenerateOptions {
        GenerateOptions {
            min_size: 8,
            max_size: 12,
            target_count: 2,
            hole_count: 1,
            use_entrance_exit: true,
            seed: 0,
            seed_offset: 1,
            thread_count: 4,
            wait_for_full_completion: false,
        }
    }
}

impl GenerateOptions {
    pub fn validate(&self) -> Result<(), OptionsErr> {
        if self.min_size < 1 || self.min_size > self.max_size {
            return Err(OptionsErr::SizeBounds(self.min_size, self.max_size));
        }
        if self.target_count < 1 {
            return Err(OptionsErr::NoTargets);
        }
        if self.thread_count < 1 {
            return Err(OptionsErr::NoThreads);
        }
        Ok(())
    }

    /// The seed of worker `index` per the derivation contract.
    pub fn worker_seed(&self, index: usize) -> u64 {
        self.seed
            .wrapping_add((index as u64).wrapping_mul(self.seed_offset))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionsErr {
    SizeBounds(i32, i32),
    NoTargets,
    NoThreads,
}

impl Display for OptionsErr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            OptionsErr::SizeBounds(min, max) => {
                write!(f, "Need 1 <= min size <= max size, got {}..{}", min, max)
            }
            OptionsErr::NoTargets => write!(f, "Need at least one target"),
            OptionsErr::NoThreads => write!(f, "Need at least one worker thread"),
        }
    }
}

impl Error for OptionsErr {}
