//! Collaborator seams the stage polls each tick: logical input and
//! randomness. Both are passed into `Stage::tick`, never reached globally.

use crate::domain::grid::Direction;

/// Logical input actions the stage understands.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Action {
    Move(Direction),
    ToggleZoom,
}

/// Level-triggered input query.
///
/// The stage calls `consume` on an action it acted on; what "consumed"
/// means (debounce, repeat) belongs to the implementor.
pub trait InputSource {
    fn is_requested(&self, action: Action) -> bool;
    fn consume(&mut self, action: Action);
}

/// Uniform integers, inclusive on both ends.
pub trait RandomSource {
    fn int_in_range(&mut self, min: u32, max: u32) -> u32;
}

impl<R: rand::Rng> RandomSource for R {
    fn int_in_range(&mut self, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        self.gen_range(min..=max)
    }
}

#[cfg(test)]
pub mod testing {
    //! Deterministic collaborators for stage tests.

    use super::*;
    use std::collections::HashSet;

    /// Actions stay requested until consumed or released.
    #[derive(Default, Debug)]
    pub struct ScriptedInput {
        pub held: HashSet<Action>,
        pub consumed: Vec<Action>,
    }

    impl ScriptedInput {
        pub fn press(&mut self, action: Action) {
            self.held.insert(action);
        }

        pub fn release_all(&mut self) {
            self.held.clear();
        }
    }

    impl InputSource for ScriptedInput {
        fn is_requested(&self, action: Action) -> bool {
            self.held.contains(&action)
        }

        fn consume(&mut self, action: Action) {
            self.consumed.push(action);
            if action == Action::ToggleZoom {
                self.held.remove(&action);
            }
        }
    }

    /// Always rolls the same value, clamped into the requested range.
    pub struct FixedRoll(pub u32);

    impl RandomSource for FixedRoll {
        fn int_in_range(&mut self, min: u32, max: u32) -> u32 {
            self.0.clamp(min, max.max(min))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn rng_stays_in_inclusive_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen_max = false;
        for _ in 0..500 {
            let v = rng.int_in_range(1, 8);
            assert!((1..=8).contains(&v));
            seen_max |= v == 8;
        }
        assert!(seen_max);
    }

    #[test]
    fn degenerate_range_returns_min() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(rng.int_in_range(1, 1), 1);
        assert_eq!(rng.int_in_range(5, 2), 5);
    }
}
