// src/instrument/polyphonic.rs
//
// Fixed-pool polyphonic instrument.

use crate::error::Result;

use super::voice::Voice;
use super::voice_allocator::VoiceAllocator;
use super::{AudioEffect, Instrument};

/// Instrument built from a pool of identical voices.
///
/// Each block the voices are summed to mono, copied to every channel,
/// run through the effect chain in order, scaled by the instrument
/// volume, clamped to [-1, 1] and mixed into the output.
pub struct PolyphonicInstrument<V: Voice> {
    allocator: VoiceAllocator<V>,
    effects: Vec<Box<dyn AudioEffect>>,
    volume: f32,

    /// Block-sized render buffer, grown on demand
    scratch: Vec<f32>,
}

impl<V: Voice> PolyphonicInstrument<V> {
    pub fn new(voices: Vec<V>) -> Result<Self> {
        Ok(Self {
            allocator: VoiceAllocator::new(voices)?,
            effects: Vec::new(),
            volume: 1.0,
            scratch: Vec::new(),
        })
    }

    /// Build a pool of `count` voices from a constructor.
    pub fn with_voices(count: usize, make: impl FnMut(usize) -> V) -> Result<Self> {
        Self::new((0..count).map(make).collect())
    }

    /// Forward the sample rate to every voice.
    pub fn prepare(&mut self, sample_rate: f64) {
        for voice in self.allocator.voices_mut() {
            voice.prepare(sample_rate);
        }
    }

    /// Append an effect to the end of the chain.
    pub fn add_effect(&mut self, effect: Box<dyn AudioEffect>) {
        self.effects.push(effect);
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.max(0.0);
    }

    #[inline]
    pub fn volume(&self) -> f32 {
        self.volume
    }

    #[inline]
    pub fn allocator(&self) -> &VoiceAllocator<V> {
        &self.allocator
    }

    #[inline]
    pub fn effects_len(&self) -> usize {
        self.effects.len()
    }
}

impl<V: Voice> Instrument for PolyphonicInstrument<V> {
    fn note_on(&mut self, pitch: f32, velocity: f32) {
        self.allocator.note_on(pitch, velocity);
    }

    fn note_off(&mut self, pitch: f32) {
        self.allocator.note_off(pitch);
    }

    fn stop_all(&mut self) {
        self.allocator.stop_all();
    }

    fn process_block(&mut self, output: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let frames = output.len() / channels;
        let len = frames * channels;

        if self.scratch.len() < len {
            self.scratch.resize(len, 0.0);
        }
        let block = &mut self.scratch[..len];

        for frame in block.chunks_exact_mut(channels) {
            let mono: f32 = self
                .allocator
                .voices_mut()
                .iter_mut()
                .map(|voice| voice.next_sample())
                .sum();
            frame.fill(mono);
        }

        for effect in self.effects.iter_mut().filter(|e| e.enabled()) {
            effect.process_block(block, channels);
        }

        for (out, sample) in output.iter_mut().zip(block.iter()) {
            *out += (sample * self.volume).clamp(-1.0, 1.0);
        }
    }

    fn active_voices(&self) -> usize {
        self.allocator.active_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Voice that outputs its velocity while gated.
    #[derive(Default)]
    struct LevelVoice {
        level: f32,
        gate: bool,
        sample_rate: f64,
    }

    impl Voice for LevelVoice {
        fn prepare(&mut self, sample_rate: f64) {
            self.sample_rate = sample_rate;
        }

        fn set_pitch(&mut self, _pitch: f32) {}

        fn start(&mut self, velocity: f32) {
            self.level = velocity;
            self.gate = true;
        }

        fn release(&mut self) {
            self.gate = false;
        }

        fn stop(&mut self) {
            self.gate = false;
        }

        fn is_free(&self) -> bool {
            !self.gate
        }

        fn next_sample(&mut self) -> f32 {
            if self.gate { self.level } else { 0.0 }
        }
    }

    struct Halve {
        enabled: bool,
    }

    impl AudioEffect for Halve {
        fn process_block(&mut self, data: &mut [f32], _channels: usize) {
            for sample in data.iter_mut() {
                *sample *= 0.5;
            }
        }

        fn enabled(&self) -> bool {
            self.enabled
        }
    }

    fn instrument(voices: usize) -> PolyphonicInstrument<LevelVoice> {
        PolyphonicInstrument::with_voices(voices, |_| LevelVoice::default()).unwrap()
    }

    #[test]
    fn test_voices_summed_to_every_channel() {
        let mut inst = instrument(4);
        inst.note_on(60.0, 0.25);
        inst.note_on(64.0, 0.5);

        let mut out = vec![0.0; 8];
        inst.process_block(&mut out, 2);
        assert!(out.iter().all(|&s| (s - 0.75).abs() < 1e-6));
        assert_eq!(inst.active_voices(), 2);
    }

    #[test]
    fn test_output_mixed_and_clamped() {
        let mut inst = instrument(4);
        for pitch in [60.0, 62.0, 64.0] {
            inst.note_on(pitch, 0.9);
        }

        let mut out = vec![0.5; 4];
        inst.process_block(&mut out, 1);
        // Instrument output clamps to 1.0 before mixing into the buffer.
        assert!(out.iter().all(|&s| (s - 1.5).abs() < 1e-6));
    }

    #[test]
    fn test_effect_chain_and_volume() {
        let mut inst = instrument(2);
        inst.add_effect(Box::new(Halve { enabled: true }));
        inst.add_effect(Box::new(Halve { enabled: false }));
        inst.set_volume(0.5);
        inst.note_on(60.0, 1.0);

        let mut out = vec![0.0; 4];
        inst.process_block(&mut out, 2);
        assert!(out.iter().all(|&s| (s - 0.25).abs() < 1e-6));
        assert_eq!(inst.effects_len(), 2);
    }

    #[test]
    fn test_stop_all_silences() {
        let mut inst = instrument(2);
        inst.prepare(44_100.0);
        assert!(inst.allocator().voices().iter().all(|v| v.sample_rate == 44_100.0));

        inst.note_on(60.0, 1.0);
        inst.stop_all();

        let mut out = vec![0.0; 4];
        inst.process_block(&mut out, 2);
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(inst.active_voices(), 0);
    }
}
