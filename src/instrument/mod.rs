// src/instrument/mod.rs
//
// The instrument boundary: what performers play into.

mod polyphonic;
mod voice;
mod voice_allocator;

pub use polyphonic::PolyphonicInstrument;
pub use voice::{Voice, VoiceId, pitch_to_frequency};
pub use voice_allocator::{VoiceAllocator, VoiceSlot};

/// Receives note events and renders audio.
///
/// Implementations mix their output into the block passed to
/// `process_block` rather than overwriting it, so several instruments
/// can share one output buffer.
pub trait Instrument: Send {
    fn note_on(&mut self, pitch: f32, velocity: f32);

    fn note_off(&mut self, pitch: f32);

    /// Force-release every voice.
    fn stop_all(&mut self);

    /// Mix one interleaved block into `output`.
    fn process_block(&mut self, output: &mut [f32], channels: usize);

    /// Voices currently held by a note.
    fn active_voices(&self) -> usize {
        0
    }
}

/// In-place processor applied to an instrument's interleaved block.
pub trait AudioEffect: Send {
    fn process_block(&mut self, data: &mut [f32], channels: usize);

    /// Disabled effects are skipped without being called.
    fn enabled(&self) -> bool {
        true
    }
}
