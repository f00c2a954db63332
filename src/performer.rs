// src/performer.rs
//
// Turns generated lines into timed notes for one instrument.

use std::collections::HashMap;

use crate::clock::{ClockConfig, ClockState};
use crate::conductor::Conductor;
use crate::event::{Note, NoteIntent, SectionLabel};
use crate::generation::LineGenerator;
use crate::instrument::Instrument;
use crate::score::Score;

/// One voice of the ensemble: a line generator playing an instrument.
///
/// This struct:
/// - caches one generated line per (section label, bar)
/// - schedules the current line beat by beat, through the conductor
/// - replays the schedule pulse by pulse into its instrument
///
/// Caches and schedules are private to the performer.
pub struct Performer {
    name: String,

    instrument: Box<dyn Instrument>,
    generator: Box<dyn LineGenerator>,

    lines: HashMap<SectionLabel, Vec<Option<Vec<NoteIntent>>>>,
    current: Option<(SectionLabel, usize)>,

    score: Score,
    bars_per_section: usize,
}

impl Performer {
    pub fn new(
        name: impl Into<String>,
        instrument: Box<dyn Instrument>,
        generator: Box<dyn LineGenerator>,
        clock: &ClockConfig,
    ) -> Self {
        Self {
            name: name.into(),
            instrument,
            generator,
            lines: HashMap::new(),
            current: None,
            score: Score::new(clock.beats_per_bar * clock.pulses_per_beat),
            bars_per_section: clock.bars_per_section,
        }
    }

    // -------------------------------
    // MARK: Generation
    // -------------------------------

    /// Make `(section, bar)` the current bar, generating its line on first use.
    pub fn generate_bar(&mut self, section: SectionLabel, bar: usize, harmonic: i32) {
        let lines = self
            .lines
            .entry(section)
            .or_insert_with(|| vec![None; self.bars_per_section]);

        if bar >= lines.len() {
            lines.resize(bar + 1, None);
        }

        if lines[bar].is_none() {
            let line = self.generator.generate_line(section, bar, harmonic);
            log::debug!(
                "{}: generated {:?} bar {} on {} ({} notes)",
                self.name,
                section,
                bar,
                harmonic,
                line.len()
            );
            lines[bar] = Some(line);
        }

        self.current = Some((section, bar));
    }

    /// Stop scheduling until the next `generate_bar`.
    pub fn clear_current_bar(&mut self) {
        self.current = None;
    }

    // -------------------------------
    // MARK: Scheduling
    // -------------------------------

    /// Schedule the current line's notes that start on `state.beat`.
    ///
    /// Each intent becomes a note-on at its onset and a note-off at
    /// onset + duration, measured in bars from the start of playback.
    pub fn add_beat(&mut self, state: &ClockState, conductor: &mut Conductor) {
        let Some((section, bar)) = self.current else {
            return;
        };
        let Some(line) = self
            .lines
            .get(&section)
            .and_then(|lines| lines.get(bar))
            .and_then(Option::as_ref)
        else {
            return;
        };

        let origin = state.absolute_bar() as f64;

        for intent in line.iter().filter(|i| i.beat(state.beats_per_bar) == state.beat) {
            let event = conductor.transform_note(intent);
            let start = origin + event.onset as f64;

            let on = self.score.insert(start, event.note_on());
            let off = self.score.insert(start + event.duration as f64, event.note_off());
            log::trace!(
                "{}: {} at {:?} until {:?}",
                self.name,
                event.pitch,
                on.position,
                off.position
            );
        }
    }

    /// Dispatch every note scheduled at `(bar, pulse)` to the instrument.
    pub fn play(&mut self, bar: i64, pulse: usize) {
        for note in self.score.take(bar, pulse) {
            match note {
                Note::On { pitch, velocity } => self.instrument.note_on(pitch, velocity),
                Note::Off { pitch } => self.instrument.note_off(pitch),
            }
        }
    }

    // -------------------------------
    // MARK: Lifecycle
    // -------------------------------

    /// Drop the schedule and silence the instrument. Cached lines survive.
    pub fn reset(&mut self) {
        self.score.clear();
        self.current = None;
        self.instrument.stop_all();
    }

    /// Forget every cached line so the next pass regenerates them.
    pub fn restart(&mut self) {
        self.lines.clear();
    }

    /// Mix the instrument's output into `output`.
    #[inline]
    pub fn render(&mut self, output: &mut [f32], channels: usize) {
        self.instrument.process_block(output, channels);
    }

    // -------------------------------
    // MARK: Accessors
    // -------------------------------

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn score(&self) -> &Score {
        &self.score
    }

    #[inline]
    pub fn current_bar(&self) -> Option<(SectionLabel, usize)> {
        self.current
    }

    /// Cached line for `(section, bar)`, if generated.
    pub fn line(&self, section: SectionLabel, bar: usize) -> Option<&[NoteIntent]> {
        self.lines
            .get(&section)
            .and_then(|lines| lines.get(bar))
            .and_then(|line| line.as_deref())
    }

    #[inline]
    pub fn instrument(&self) -> &dyn Instrument {
        self.instrument.as_ref()
    }

    #[inline]
    pub fn active_voices(&self) -> usize {
        self.instrument.active_voices()
    }
}
