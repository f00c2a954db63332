// src/instrument/voice.rs

/// Index of a slot in an instrument's fixed voice pool.
pub type VoiceId = usize;

/// One sound-producing voice of a polyphonic instrument.
///
/// Voices own their DSP state. The allocator decides which voice plays
/// which pitch; the voice only renders it.
pub trait Voice: Send {
    /// Called once before rendering starts.
    fn prepare(&mut self, _sample_rate: f64) {}

    /// Retune to `pitch` (semitones, MIDI note number domain).
    fn set_pitch(&mut self, pitch: f32);

    /// Trigger (or retrigger) the voice.
    fn start(&mut self, velocity: f32);

    /// Enter the release phase; the voice may keep sounding for a while.
    fn release(&mut self);

    /// Silence immediately.
    fn stop(&mut self);

    /// Whether the voice has finished sounding and can be reused.
    fn is_free(&self) -> bool;

    /// Render one mono sample.
    fn next_sample(&mut self) -> f32;
}

/// Frequency in Hz of a pitch in semitones (A4 = 69 = 440 Hz).
#[inline]
pub fn pitch_to_frequency(pitch: f32) -> f32 {
    440.0 * 2.0_f32.powf((pitch - 69.0) / 12.0)
}
