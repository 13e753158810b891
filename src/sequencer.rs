use crate::model::PlayMode;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;

/// Next/previous policy for a playlist of `len` entries.
///
/// The sequencer never holds entries, only positions into the owner's list,
/// so the owner must call [`PlaybackSequencer::reshuffle`] whenever the
/// list changes shape while in [`PlayMode::Random`].
#[derive(Debug)]
pub struct PlaybackSequencer {
    mode: PlayMode,
    shuffle_order: Vec<usize>,
    shuffle_position: usize,
    rng: SmallRng,
}

impl PlaybackSequencer {
    pub fn new(mode: PlayMode) -> Self {
        Self::with_rng(mode, rand::make_rng::<SmallRng>())
    }

    /// Deterministic shuffles, for tests and reproducible hosts.
    pub fn with_seed(mode: PlayMode, seed: u64) -> Self {
        Self::with_rng(mode, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(mode: PlayMode, rng: SmallRng) -> Self {
        Self {
            mode,
            shuffle_order: Vec::new(),
            shuffle_position: 0,
            rng,
        }
    }

    pub fn mode(&self) -> PlayMode {
        self.mode
    }

    /// Returns `true` when the mode actually changed. Entering Random
    /// regenerates the shuffle table around `current`.
    pub fn set_mode(&mut self, mode: PlayMode, len: usize, current: Option<usize>) -> bool {
        if self.mode == mode {
            return false;
        }
        self.mode = mode;
        if mode == PlayMode::Random {
            self.reshuffle(len, current);
        }
        true
    }

    pub fn shuffle_order(&self) -> &[usize] {
        &self.shuffle_order
    }

    pub fn shuffle_position(&self) -> usize {
        self.shuffle_position
    }

    pub fn reshuffle(&mut self, len: usize, current: Option<usize>) {
        self.shuffle_order = (0..len).collect();
        self.shuffle_order.shuffle(&mut self.rng);
        self.shuffle_position = 0;
        self.sync_position(current);
    }

    /// Points the shuffle cursor at `current`; unknown indices leave it as is.
    pub fn sync_position(&mut self, current: Option<usize>) {
        let Some(current) = current else {
            return;
        };
        if let Some(pos) = self.shuffle_order.iter().position(|idx| *idx == current) {
            self.shuffle_position = pos;
        }
    }

    pub fn clear(&mut self) {
        self.shuffle_order.clear();
        self.shuffle_position = 0;
    }

    pub fn next_index(&self, current: Option<usize>, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }

        match self.mode {
            PlayMode::Sequential => {
                let next = current.map_or(0, |idx| idx + 1);
                (next < len).then_some(next)
            }
            PlayMode::Loop => Some(current.map_or(0, |idx| (idx + 1) % len)),
            PlayMode::Random => {
                let order = self.live_order(len)?;
                match current {
                    Some(_) => order.get((self.shuffle_position + 1) % order.len()).copied(),
                    None => order.first().copied(),
                }
            }
            PlayMode::RepeatOne => current.filter(|idx| *idx < len),
        }
    }

    pub fn previous_index(&self, current: Option<usize>, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }

        match self.mode {
            PlayMode::Sequential => current.and_then(|idx| idx.checked_sub(1)),
            PlayMode::Loop => Some(current.map_or(len - 1, |idx| (idx + len - 1) % len)),
            PlayMode::Random => {
                let order = self.live_order(len)?;
                match current {
                    Some(_) => order
                        .get((self.shuffle_position + order.len() - 1) % order.len())
                        .copied(),
                    None => order.last().copied(),
                }
            }
            PlayMode::RepeatOne => current.filter(|idx| *idx < len),
        }
    }

    fn live_order(&self, len: usize) -> Option<&[usize]> {
        (self.shuffle_order.len() == len).then_some(self.shuffle_order.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prop_assert_eq;
    use std::collections::HashSet;

    fn sequencer(mode: PlayMode, len: usize) -> PlaybackSequencer {
        let mut sequencer = PlaybackSequencer::with_seed(PlayMode::Sequential, 7);
        sequencer.set_mode(mode, len, None);
        sequencer
    }

    #[test]
    fn sequential_stops_at_both_ends() {
        let seq = sequencer(PlayMode::Sequential, 3);
        assert_eq!(seq.next_index(Some(0), 3), Some(1));
        assert_eq!(seq.next_index(Some(2), 3), None);
        assert_eq!(seq.previous_index(Some(0), 3), None);
        assert_eq!(seq.previous_index(Some(2), 3), Some(1));
        assert_eq!(seq.next_index(None, 3), Some(0));
        assert_eq!(seq.previous_index(None, 3), None);
    }

    #[test]
    fn loop_wraps_both_ways() {
        let seq = sequencer(PlayMode::Loop, 3);
        assert_eq!(seq.next_index(Some(2), 3), Some(0));
        assert_eq!(seq.previous_index(Some(0), 3), Some(2));
        assert_eq!(seq.next_index(None, 3), Some(0));
        assert_eq!(seq.previous_index(None, 3), Some(2));
    }

    #[test]
    fn repeat_one_stays_on_current() {
        let seq = sequencer(PlayMode::RepeatOne, 4);
        assert_eq!(seq.next_index(Some(2), 4), Some(2));
        assert_eq!(seq.previous_index(Some(2), 4), Some(2));
        assert_eq!(seq.next_index(None, 4), None);
    }

    #[test]
    fn empty_list_has_no_neighbours() {
        for mode in PlayMode::ALL {
            let seq = sequencer(mode, 0);
            assert_eq!(seq.next_index(None, 0), None);
            assert_eq!(seq.previous_index(Some(0), 0), None);
        }
    }

    #[test]
    fn reshuffle_locates_current() {
        let mut seq = sequencer(PlayMode::Random, 0);
        seq.reshuffle(10, Some(6));
        assert_eq!(seq.shuffle_order()[seq.shuffle_position()], 6);

        seq.reshuffle(10, None);
        assert_eq!(seq.shuffle_position(), 0);
    }

    #[test]
    fn stale_shuffle_table_yields_nothing() {
        let seq = sequencer(PlayMode::Random, 3);
        assert_eq!(seq.next_index(Some(0), 4), None);
    }

    #[test]
    fn leaving_and_reentering_random_reshuffles() {
        let mut seq = sequencer(PlayMode::Random, 5);
        assert!(seq.set_mode(PlayMode::Loop, 5, Some(1)));
        assert!(!seq.set_mode(PlayMode::Loop, 5, Some(1)));
        assert!(seq.set_mode(PlayMode::Random, 8, Some(1)));
        assert_eq!(seq.shuffle_order().len(), 8);
        assert_eq!(seq.shuffle_order()[seq.shuffle_position()], 1);
    }

    #[test]
    fn random_walk_visits_each_index_once() {
        let len = 6;
        let mut seq = sequencer(PlayMode::Random, len);
        let mut current = seq.next_index(None, len);
        let mut seen = HashSet::new();
        for _ in 0..len {
            let idx = current.expect("random next");
            assert!(seen.insert(idx), "index {idx} repeated early");
            seq.sync_position(Some(idx));
            current = seq.next_index(Some(idx), len);
        }
        assert_eq!(seen.len(), len);
    }

    #[test]
    fn random_previous_steps_back_and_wraps() {
        let len = 7;
        let mut seq = sequencer(PlayMode::Random, len);
        let order = seq.shuffle_order().to_vec();

        seq.sync_position(Some(order[0]));
        assert_eq!(seq.previous_index(Some(order[0]), len), Some(order[len - 1]));

        seq.sync_position(Some(order[3]));
        assert_eq!(seq.previous_index(Some(order[3]), len), Some(order[2]));
        assert_eq!(seq.next_index(Some(order[3]), len), Some(order[4]));
    }

    proptest::proptest! {
        #[test]
        fn shuffle_is_a_permutation(len in 0usize..64, seed in proptest::num::u64::ANY) {
            let mut seq = PlaybackSequencer::with_seed(PlayMode::Random, seed);
            seq.reshuffle(len, None);
            let mut sorted = seq.shuffle_order().to_vec();
            sorted.sort_unstable();
            prop_assert_eq!(sorted, (0..len).collect::<Vec<_>>());
        }

        #[test]
        fn next_then_previous_returns_home(len in 1usize..40, current in 0usize..40, loop_mode in proptest::bool::ANY) {
            let current = current % len;
            let mode = if loop_mode { PlayMode::Loop } else { PlayMode::Sequential };
            let seq = sequencer(mode, len);
            if let Some(prev) = seq.previous_index(Some(current), len) {
                prop_assert_eq!(seq.next_index(Some(prev), len), Some(current));
            }
            if let Some(next) = seq.next_index(Some(current), len) {
                prop_assert_eq!(seq.previous_index(Some(next), len), Some(current));
            }
        }

        #[test]
        fn loop_is_total(len in 1usize..40, current in 0usize..40) {
            let seq = sequencer(PlayMode::Loop, len);
            let current = current % len;
            proptest::prop_assert!(seq.next_index(Some(current), len).is_some());
            proptest::prop_assert!(seq.previous_index(Some(current), len).is_some());
        }
    }
}
