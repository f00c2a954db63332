// src/clock.rs
//
// Sample-accurate hierarchical clock.
//
// Turns "N samples elapsed" into pulse / beat / bar / section boundary
// crossings and fans them out to registered listeners.

use crate::error::{Error, Result};

//
// ===============================
// MARK: Configuration
// ===============================
//

/// Tempo and structural ratios of the clock.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ClockConfig {
    /// Beats per minute
    pub tempo: u32,

    /// Pulses per beat (clock resolution)
    pub pulses_per_beat: usize,

    pub beats_per_bar: usize,

    pub bars_per_section: usize,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            tempo: 120,
            pulses_per_beat: 8,
            beats_per_bar: 4,
            bars_per_section: 4,
        }
    }
}

impl ClockConfig {
    /// Reject zero tempo or ratios before they reach the phase accumulator.
    pub fn validate(&self) -> Result<()> {
        if self.tempo == 0 {
            return Err(Error::InvalidTempo { tempo: self.tempo });
        }
        for (field, value) in [
            ("pulses_per_beat", self.pulses_per_beat),
            ("beats_per_bar", self.beats_per_bar),
            ("bars_per_section", self.bars_per_section),
        ] {
            if value == 0 {
                return Err(Error::InvalidStructure { field, value });
            }
        }
        Ok(())
    }
}

//
// ===============================
// MARK: State snapshot
// ===============================
//

/// Immutable snapshot of the clock handed to every listener.
///
/// Counters are -1 before the first pulse after a reset.
/// - `pulse` wraps modulo the bar length (in pulses)
/// - `beat` wraps modulo `beats_per_bar`
/// - `bar` wraps modulo `bars_per_section`
/// - `section` only grows
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ClockState {
    pub tempo: u32,
    pub pulses_per_beat: usize,
    pub beats_per_bar: usize,
    pub bars_per_section: usize,

    pub section: i64,
    pub bar: i64,
    pub beat: i64,
    pub pulse: i64,
}

impl ClockState {
    fn new(config: ClockConfig) -> Self {
        Self {
            tempo: config.tempo,
            pulses_per_beat: config.pulses_per_beat,
            beats_per_bar: config.beats_per_bar,
            bars_per_section: config.bars_per_section,
            section: -1,
            bar: -1,
            beat: -1,
            pulse: -1,
        }
    }

    fn reset(&mut self) {
        self.section = -1;
        self.bar = -1;
        self.beat = -1;
        self.pulse = -1;
    }

    /// Beat length in pulses.
    #[inline]
    pub fn beat_length(&self) -> usize {
        self.pulses_per_beat
    }

    /// Bar length in pulses.
    #[inline]
    pub fn bar_length(&self) -> usize {
        self.beats_per_bar * self.pulses_per_beat
    }

    /// Section length in pulses.
    #[inline]
    pub fn section_length(&self) -> usize {
        self.bars_per_section * self.bar_length()
    }

    /// Bar index counted from the start of playback.
    #[inline]
    pub fn absolute_bar(&self) -> i64 {
        self.section * self.bars_per_section as i64 + self.bar
    }

    /// Whether the clock has produced its first pulse since the last reset.
    #[inline]
    pub fn is_started(&self) -> bool {
        self.pulse >= 0
    }
}

//
// ===============================
// MARK: Listeners
// ===============================
//

/// Receives boundary crossings from [`Clock::advance`].
///
/// On a pulse that completes several boundaries at once the clock calls
/// `on_section`, then `on_bar`, then `on_beat`, then `on_pulse`. Every call
/// sees the same snapshot with all counters already updated.
pub trait ClockListener {
    fn on_section(&mut self, _state: &ClockState) {}

    fn on_bar(&mut self, _state: &ClockState) {}

    fn on_beat(&mut self, _state: &ClockState) {}

    fn on_pulse(&mut self, _state: &ClockState) {}
}

/// Ordered fan-out of listeners.
///
/// Listeners are notified in registration order for each boundary kind.
#[derive(Default)]
pub struct ListenerChain {
    listeners: Vec<Box<dyn ClockListener + Send>>,
}

impl ListenerChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, listener: Box<dyn ClockListener + Send>) {
        self.listeners.push(listener);
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl ClockListener for ListenerChain {
    fn on_section(&mut self, state: &ClockState) {
        for listener in &mut self.listeners {
            listener.on_section(state);
        }
    }

    fn on_bar(&mut self, state: &ClockState) {
        for listener in &mut self.listeners {
            listener.on_bar(state);
        }
    }

    fn on_beat(&mut self, state: &ClockState) {
        for listener in &mut self.listeners {
            listener.on_beat(state);
        }
    }

    fn on_pulse(&mut self, state: &ClockState) {
        for listener in &mut self.listeners {
            listener.on_pulse(state);
        }
    }
}

//
// ===============================
// MARK: Clock
// ===============================
//

/// Phase-accumulator clock driven by the audio buffer size.
///
/// This struct:
/// - owns its state exclusively
/// - never allocates while advancing
/// - recomputes the pulse interval on every call, so tempo changes apply
///   at the next buffer
#[derive(Debug)]
pub struct Clock {
    state: ClockState,

    /// Sample rate (Hz)
    sample_rate: f64,

    /// Samples accumulated since the last pulse
    phase: f64,
}

impl Clock {
    pub fn new(sample_rate: f64, config: ClockConfig) -> Result<Self> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(Error::InvalidSampleRate { sample_rate });
        }
        config.validate()?;

        let mut clock = Self {
            state: ClockState::new(config),
            sample_rate,
            phase: 0.0,
        };
        clock.reset();
        Ok(clock)
    }

    // -------------------------------
    // MARK: Configuration
    // -------------------------------

    /// Replace tempo and structure, then reset to the "before start" state.
    pub fn configure(&mut self, config: ClockConfig) -> Result<()> {
        config.validate()?;

        self.state = ClockState::new(config);
        self.reset();
        Ok(())
    }

    /// Change the tempo without touching the position.
    pub fn set_tempo(&mut self, tempo: u32) -> Result<()> {
        if tempo == 0 {
            return Err(Error::InvalidTempo { tempo });
        }
        self.state.tempo = tempo;
        Ok(())
    }

    // -------------------------------
    // MARK: Time advancement
    // -------------------------------

    /// Samples between two pulses at the current tempo.
    #[inline]
    pub fn pulse_interval(&self) -> f64 {
        60.0 * self.sample_rate / (self.state.pulses_per_beat as f64 * self.state.tempo as f64)
    }

    /// Consume `samples` audio samples, notifying `listener` of every
    /// boundary crossed in between.
    pub fn advance<L>(&mut self, samples: usize, listener: &mut L)
    where
        L: ClockListener + ?Sized,
    {
        let interval = self.pulse_interval();

        for _ in 0..samples {
            if self.phase >= interval {
                self.phase -= interval;
                self.next_pulse(listener);
            }
            self.phase += 1.0;
        }
    }

    fn next_pulse<L>(&mut self, listener: &mut L)
    where
        L: ClockListener + ?Sized,
    {
        let state = &mut self.state;

        let mut beat_crossed = false;
        let mut bar_crossed = false;
        let mut section_crossed = false;

        state.pulse = (state.pulse + 1) % state.bar_length() as i64;
        if state.pulse % state.beat_length() as i64 == 0 {
            beat_crossed = true;
            state.beat = (state.beat + 1) % state.beats_per_bar as i64;

            if state.beat == 0 {
                bar_crossed = true;
                state.bar = (state.bar + 1) % state.bars_per_section as i64;

                if state.bar == 0 {
                    section_crossed = true;
                    state.section += 1;
                }
            }
        }

        let snapshot = *state;
        if section_crossed {
            listener.on_section(&snapshot);
        }
        if bar_crossed {
            listener.on_bar(&snapshot);
        }
        if beat_crossed {
            listener.on_beat(&snapshot);
        }
        listener.on_pulse(&snapshot);
    }

    /// Return to the "before start" state.
    ///
    /// The phase is primed with a full interval so the next advance fires
    /// the first pulse on its first sample.
    pub fn reset(&mut self) {
        self.state.reset();
        self.phase = self.pulse_interval();
    }

    // -------------------------------
    // MARK: Accessors
    // -------------------------------

    #[inline]
    pub fn state(&self) -> &ClockState {
        &self.state
    }

    #[inline]
    pub fn tempo(&self) -> u32 {
        self.state.tempo
    }

    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Number of whole sections that fit in `minutes` at the current tempo.
    pub fn minutes_to_sections(&self, minutes: f64) -> usize {
        let beats = minutes * self.state.tempo as f64;
        let beats_per_section = (self.state.bars_per_section * self.state.beats_per_bar) as f64;
        (beats / beats_per_section).round().max(0.0) as usize
    }
}
