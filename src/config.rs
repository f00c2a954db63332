// src/config.rs
//
// Top-level configuration of a musician.

use crate::clock::ClockConfig;
use crate::conductor::DEFAULT_KEY;
use crate::error::{Error, Result};

/// Everything needed to build a `Musician`, besides its generators.
#[derive(Debug, Clone, PartialEq)]
pub struct MusicianConfig {
    /// Hz
    pub sample_rate: f64,

    /// BPM before the conductor's tempo multiplier
    pub tempo: u32,

    pub pulses_per_beat: usize,
    pub beats_per_bar: usize,

    /// Also the length of each harmonic progression
    pub bars_per_section: usize,

    /// Number of sections in the form
    pub sequence_length: usize,
    pub loop_sequence: bool,

    /// Pitch of scale degree 0
    pub fundamental_key: f32,

    /// Humanization seed
    pub seed: u64,

    pub master_volume: f32,
}

impl Default for MusicianConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            tempo: 120,
            pulses_per_beat: 8,
            beats_per_bar: 4,
            bars_per_section: 4,
            sequence_length: 32,
            loop_sequence: true,
            fundamental_key: DEFAULT_KEY,
            seed: 0,
            master_volume: 1.0,
        }
    }
}

impl MusicianConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_tempo(mut self, tempo: u32) -> Self {
        self.tempo = tempo;
        self
    }

    /// Pulses per beat, beats per bar and bars per section.
    pub fn with_structure(mut self, pulses_per_beat: usize, beats_per_bar: usize, bars_per_section: usize) -> Self {
        self.pulses_per_beat = pulses_per_beat;
        self.beats_per_bar = beats_per_bar;
        self.bars_per_section = bars_per_section;
        self
    }

    pub fn with_sequence(mut self, length: usize, looping: bool) -> Self {
        self.sequence_length = length;
        self.loop_sequence = looping;
        self
    }

    pub fn with_key(mut self, fundamental_key: f32) -> Self {
        self.fundamental_key = fundamental_key;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_master_volume(mut self, volume: f32) -> Self {
        self.master_volume = volume;
        self
    }

    /// Clock part of the configuration.
    pub fn clock_config(&self) -> ClockConfig {
        ClockConfig {
            tempo: self.tempo,
            pulses_per_beat: self.pulses_per_beat,
            beats_per_bar: self.beats_per_bar,
            bars_per_section: self.bars_per_section,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(Error::InvalidSampleRate {
                sample_rate: self.sample_rate,
            });
        }
        self.clock_config().validate()?;

        if self.sequence_length == 0 {
            return Err(Error::EmptySequence);
        }
        Ok(())
    }
}
