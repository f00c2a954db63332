// src/instrument/voice_allocator.rs

use std::collections::VecDeque;

use crate::error::{Error, Result};

use super::voice::{Voice, VoiceId};

/// Allocation record of one voice.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VoiceSlot {
    pitch: Option<f32>,
    active: bool,
    order: u64,
}

impl VoiceSlot {
    /// Pitch currently held, `None` once released.
    #[inline]
    pub fn pitch(&self) -> Option<f32> {
        self.pitch
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Allocation counter value when the slot was last triggered.
    #[inline]
    pub fn order(&self) -> u64 {
        self.order
    }
}

/// Allocates pitches to a fixed pool of voices.
///
/// Responsibilities:
/// - map note-on pitches to voices, stealing the oldest when full
/// - release every voice holding a pitch on note-off
/// - keep the active-order queue consistent with the slots
///
/// Does NOT:
/// - grow the pool
/// - render audio (see `voices_mut`)
pub struct VoiceAllocator<V: Voice> {
    voices: Vec<V>,
    slots: Vec<VoiceSlot>,

    /// Active slots, oldest trigger first
    queue: VecDeque<VoiceId>,

    next_order: u64,
}

impl<V: Voice> VoiceAllocator<V> {
    pub fn new(voices: Vec<V>) -> Result<Self> {
        if voices.is_empty() {
            return Err(Error::InvalidVoiceCount);
        }

        let capacity = voices.len();
        Ok(Self {
            voices,
            slots: vec![VoiceSlot::default(); capacity],
            queue: VecDeque::with_capacity(capacity),
            next_order: 0,
        })
    }

    /// Allocate a voice for `pitch` and trigger it.
    ///
    /// Returns the slot that now plays the pitch.
    pub fn note_on(&mut self, pitch: f32, velocity: f32) -> VoiceId {
        let id = if let Some(id) = self.voices.iter().position(|v| v.is_free()) {
            // A voice can finish on its own while still tracked.
            self.untrack(id);
            id
        } else if let Some(id) = self.slots.iter().position(|s| !s.active) {
            log::trace!("Voice {} reused during release tail", id);
            id
        } else {
            match self.queue.pop_front() {
                Some(id) => {
                    log::trace!(
                        "Voice {} stolen: {:?} -> {}",
                        id,
                        self.slots[id].pitch,
                        pitch
                    );
                    id
                }
                // Unreachable with a non-empty pool, but stay total.
                None => 0,
            }
        };

        let slot = &mut self.slots[id];
        slot.pitch = Some(pitch);
        slot.active = true;
        slot.order = self.next_order;
        self.next_order += 1;
        self.queue.push_back(id);

        let voice = &mut self.voices[id];
        voice.set_pitch(pitch);
        voice.start(velocity);

        log::trace!("Note on {} -> voice {}", pitch, id);
        id
    }

    /// Release every active voice holding `pitch`.
    ///
    /// Returns the number of voices released; zero is not an error.
    pub fn note_off(&mut self, pitch: f32) -> usize {
        let mut released = 0;

        for id in 0..self.slots.len() {
            let slot = &mut self.slots[id];
            if slot.active && slot.pitch == Some(pitch) {
                slot.active = false;
                slot.pitch = None;
                self.voices[id].release();
                self.untrack(id);
                released += 1;
            }
        }

        if released == 0 {
            log::debug!("Note off {} matched no held voice", pitch);
        }
        released
    }

    /// Silence every voice and forget all allocations.
    pub fn stop_all(&mut self) {
        for (voice, slot) in self.voices.iter_mut().zip(self.slots.iter_mut()) {
            voice.stop();
            *slot = VoiceSlot::default();
        }
        self.queue.clear();
    }

    fn untrack(&mut self, id: VoiceId) {
        self.queue.retain(|&queued| queued != id);
    }

    // -------------------------------
    // MARK: Accessors
    // -------------------------------

    #[inline]
    pub fn capacity(&self) -> usize {
        self.voices.len()
    }

    /// Number of voices currently held by a note.
    #[inline]
    pub fn active_count(&self) -> usize {
        self.queue.len()
    }

    /// Active slots in trigger order, oldest first.
    pub fn active_order(&self) -> impl Iterator<Item = VoiceId> + '_ {
        self.queue.iter().copied()
    }

    pub fn slot(&self, id: VoiceId) -> Option<&VoiceSlot> {
        self.slots.get(id)
    }

    #[inline]
    pub fn is_voice_free(&self, id: VoiceId) -> bool {
        self.voices.get(id).is_some_and(|v| v.is_free())
    }

    pub fn voices(&self) -> &[V] {
        &self.voices
    }

    pub fn voices_mut(&mut self) -> &mut [V] {
        &mut self.voices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Voice with an optional release tail measured in samples.
    #[derive(Default)]
    struct TestVoice {
        pitch: f32,
        gate: bool,
        tail: usize,
        tail_length: usize,
        stops: usize,
    }

    impl TestVoice {
        fn with_tail(tail_length: usize) -> Self {
            Self {
                tail_length,
                ..Self::default()
            }
        }
    }

    impl Voice for TestVoice {
        fn set_pitch(&mut self, pitch: f32) {
            self.pitch = pitch;
        }

        fn start(&mut self, _velocity: f32) {
            self.gate = true;
            self.tail = 0;
        }

        fn release(&mut self) {
            self.gate = false;
            self.tail = self.tail_length;
        }

        fn stop(&mut self) {
            self.gate = false;
            self.tail = 0;
            self.stops += 1;
        }

        fn is_free(&self) -> bool {
            !self.gate && self.tail == 0
        }

        fn next_sample(&mut self) -> f32 {
            if self.gate {
                1.0
            } else if self.tail > 0 {
                self.tail -= 1;
                0.5
            } else {
                0.0
            }
        }
    }

    fn allocator(capacity: usize) -> VoiceAllocator<TestVoice> {
        VoiceAllocator::new((0..capacity).map(|_| TestVoice::default()).collect()).unwrap()
    }

    #[test]
    fn test_empty_pool_rejected() {
        assert_eq!(
            VoiceAllocator::<TestVoice>::new(Vec::new()).err(),
            Some(Error::InvalidVoiceCount)
        );
    }

    #[test]
    fn test_lowest_free_slot_first() {
        let mut alloc = allocator(3);
        assert_eq!(alloc.note_on(60.0, 1.0), 0);
        assert_eq!(alloc.note_on(64.0, 1.0), 1);

        alloc.note_off(60.0);
        assert_eq!(alloc.note_on(67.0, 1.0), 0);
        assert_eq!(alloc.active_order().collect::<Vec<_>>(), vec![1, 0]);
    }

    #[test]
    fn test_steals_oldest_voice() {
        let mut alloc = allocator(2);
        let a = alloc.note_on(57.0, 1.0);
        let b = alloc.note_on(59.0, 1.0);
        assert_ne!(a, b);

        // Pool full: C takes A's slot.
        let c = alloc.note_on(60.0, 1.0);
        assert_eq!(c, a);
        assert_eq!(alloc.voices()[a].pitch, 60.0);

        assert_eq!(alloc.note_off(59.0), 1);
        assert!(!alloc.slot(b).unwrap().is_active());
        assert_eq!(alloc.slot(a).unwrap().pitch(), Some(60.0));
        assert!(alloc.slot(a).unwrap().is_active());

        // A is gone entirely.
        assert_eq!(alloc.note_off(57.0), 0);
        assert_eq!(alloc.active_count(), 1);
    }

    #[test]
    fn test_steal_order_is_fifo() {
        let mut alloc = allocator(2);
        alloc.note_on(60.0, 1.0);
        alloc.note_on(62.0, 1.0);

        assert_eq!(alloc.note_on(64.0, 1.0), 0);
        assert_eq!(alloc.note_on(65.0, 1.0), 1);
        assert_eq!(alloc.note_on(67.0, 1.0), 0);

        let first = alloc.slot(1).unwrap().order();
        let second = alloc.slot(0).unwrap().order();
        assert!(first < second);
    }

    #[test]
    fn test_note_off_releases_all_duplicates() {
        let mut alloc = allocator(4);
        alloc.note_on(60.0, 1.0);
        alloc.note_on(62.0, 1.0);
        alloc.note_on(60.0, 0.5);

        assert_eq!(alloc.note_off(60.0), 2);
        assert_eq!(alloc.active_order().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_unmatched_note_off_is_noop() {
        let mut alloc = allocator(2);
        alloc.note_on(60.0, 1.0);
        assert_eq!(alloc.note_off(61.0), 0);
        assert_eq!(alloc.active_count(), 1);
    }

    #[test]
    fn test_releasing_voice_reused_before_stealing() {
        let voices = (0..2).map(|_| TestVoice::with_tail(64)).collect();
        let mut alloc = VoiceAllocator::new(voices).unwrap();

        alloc.note_on(60.0, 1.0);
        alloc.note_on(62.0, 1.0);
        alloc.note_off(60.0);
        assert!(!alloc.is_voice_free(0));

        // Slot 0 still rings but is no longer held; slot 1 must survive.
        assert_eq!(alloc.note_on(64.0, 1.0), 0);
        assert_eq!(alloc.slot(1).unwrap().pitch(), Some(62.0));
    }

    #[test]
    fn test_stop_all_clears_everything() {
        let mut alloc = allocator(3);
        alloc.note_on(60.0, 1.0);
        alloc.note_on(62.0, 1.0);

        alloc.stop_all();
        assert_eq!(alloc.active_count(), 0);
        assert!(alloc.voices().iter().all(|v| v.is_free() && v.stops == 1));
        assert!((0..3).all(|id| alloc.slot(id).unwrap().pitch().is_none()));
    }
}
