// src/score.rs
//
// Sparse timeline of scheduled notes.
//
// Bars are allocated on first write and dropped once their last pulse
// has been read, so the score only ever holds the near future.

use std::collections::HashMap;

use crate::event::{Note, PulsePosition, ScheduledNote};

/// Per-performer note schedule keyed by absolute bar.
///
/// Each bar holds one note list per pulse slot. Lists are read once:
/// `take` moves the notes out and leaves the slot empty.
#[derive(Debug, Clone)]
pub struct Score {
    bar_length: usize,
    bars: HashMap<i64, Vec<Vec<Note>>>,
}

impl Score {
    pub fn new(bar_length: usize) -> Self {
        Self {
            bar_length: bar_length.max(1),
            bars: HashMap::new(),
        }
    }

    /// Schedule `note` at `position` bars from the start of playback.
    pub fn insert(&mut self, position: f64, note: Note) -> ScheduledNote {
        let position = PulsePosition::from_bars(position, self.bar_length);
        let bar_length = self.bar_length;

        self.bars
            .entry(position.bar)
            .or_insert_with(|| vec![Vec::new(); bar_length])[position.pulse]
            .push(note);

        ScheduledNote { position, note }
    }

    /// Remove and return every note at `(bar, pulse)`.
    pub fn take(&mut self, bar: i64, pulse: usize) -> Vec<Note> {
        let Some(slots) = self.bars.get_mut(&bar) else {
            return Vec::new();
        };

        let notes = slots.get_mut(pulse).map(std::mem::take).unwrap_or_default();

        if pulse + 1 >= self.bar_length {
            self.bars.remove(&bar);
        }
        notes
    }

    pub fn clear(&mut self) {
        self.bars.clear();
    }

    /// Number of notes still waiting to be played.
    pub fn pending(&self) -> usize {
        self.bars
            .values()
            .flat_map(|slots| slots.iter())
            .map(Vec::len)
            .sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pending() == 0
    }

    #[inline]
    pub fn bar_length(&self) -> usize {
        self.bar_length
    }

    /// Bars currently allocated.
    #[inline]
    pub fn allocated_bars(&self) -> usize {
        self.bars.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn on(pitch: f32) -> Note {
        Note::On {
            pitch,
            velocity: 1.0,
        }
    }

    #[test]
    fn test_insert_resolves_pulse_position() {
        let mut score = Score::new(16);
        let scheduled = score.insert(1.25, on(60.0));

        assert_eq!(scheduled.position, PulsePosition { bar: 1, pulse: 4 });
        assert_eq!(score.pending(), 1);
        assert!(score.take(1, 3).is_empty());
        assert_eq!(score.take(1, 4), vec![on(60.0)]);
    }

    #[test]
    fn test_take_is_read_once() {
        let mut score = Score::new(4);
        score.insert(0.5, on(60.0));
        score.insert(0.5, Note::Off { pitch: 62.0 });

        assert_eq!(score.take(0, 2).len(), 2);
        assert!(score.take(0, 2).is_empty());
        assert!(score.is_empty());
    }

    #[test]
    fn test_bar_dropped_after_last_pulse() {
        let mut score = Score::new(4);
        score.insert(0.0, on(60.0));
        score.insert(1.0, on(62.0));
        assert_eq!(score.allocated_bars(), 2);

        for pulse in 0..4 {
            score.take(0, pulse);
        }
        assert_eq!(score.allocated_bars(), 1);
        assert_eq!(score.pending(), 1);
    }

    #[test]
    fn test_missing_bar_is_empty() {
        let mut score = Score::new(8);
        assert!(score.take(12, 0).is_empty());
        assert!(score.take(-1, 7).is_empty());

        score.insert(3.0, on(60.0));
        score.clear();
        assert_eq!(score.allocated_bars(), 0);
    }
}
