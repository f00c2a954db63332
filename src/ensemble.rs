// src/ensemble.rs
//
// Clock-driven orchestration of generators, conductor and performers.

use crate::clock::{ClockListener, ClockState};
use crate::conductor::Conductor;
use crate::event::SectionLabel;
use crate::generation::{MacroGenerator, MesoGenerator};
use crate::performer::Performer;

/// Reacts to clock boundaries and keeps every performer in step.
///
/// On each boundary:
/// - section: resolve the section label from the macro generator
/// - bar: resolve the harmonic root and hand each performer its bar
/// - beat: let each performer schedule the notes starting on this beat
/// - pulse: let each performer play what is due
///
/// Once the form reaches `End` no further bars are generated until
/// `restart`.
pub struct Ensemble {
    macro_gen: MacroGenerator,
    meso: MesoGenerator,
    conductor: Conductor,

    performers: Vec<Performer>,
    section: SectionLabel,
}

impl Ensemble {
    pub fn new(macro_gen: MacroGenerator, meso: MesoGenerator, conductor: Conductor) -> Self {
        Self {
            macro_gen,
            meso,
            conductor,
            performers: Vec::new(),
            section: SectionLabel::None,
        }
    }

    pub fn add_performer(&mut self, performer: Performer) {
        log::info!("Performer '{}' joined", performer.name());
        self.performers.push(performer);
    }

    /// Silence every performer and forget the current section.
    pub fn stop(&mut self) {
        for performer in &mut self.performers {
            performer.reset();
        }
        self.section = SectionLabel::None;
    }

    /// Stop, then drop every generator cache so the next pass starts fresh.
    pub fn restart(&mut self) {
        self.stop();
        self.macro_gen.restart();
        self.meso.restart();
        for performer in &mut self.performers {
            performer.restart();
        }
    }

    /// Mix every performer's instrument into `output`.
    pub fn render(&mut self, output: &mut [f32], channels: usize) {
        for performer in &mut self.performers {
            performer.render(output, channels);
        }
    }

    // -------------------------------
    // MARK: Accessors
    // -------------------------------

    #[inline]
    pub fn section(&self) -> SectionLabel {
        self.section
    }

    #[inline]
    pub fn conductor(&self) -> &Conductor {
        &self.conductor
    }

    #[inline]
    pub fn conductor_mut(&mut self) -> &mut Conductor {
        &mut self.conductor
    }

    #[inline]
    pub fn macro_generator(&self) -> &MacroGenerator {
        &self.macro_gen
    }

    #[inline]
    pub fn performers(&self) -> &[Performer] {
        &self.performers
    }

    pub fn performer(&self, name: &str) -> Option<&Performer> {
        self.performers.iter().find(|p| p.name() == name)
    }

    pub fn active_voices(&self) -> usize {
        self.performers.iter().map(Performer::active_voices).sum()
    }
}

impl ClockListener for Ensemble {
    fn on_section(&mut self, state: &ClockState) {
        let index = state.section.max(0) as usize;

        self.section = match self.macro_gen.get_section(index) {
            Ok(section) => section,
            Err(e) => {
                log::error!("Section {} unresolved, ending: {}", index, e);
                SectionLabel::End
            }
        };

        log::info!("Section {}: {:?}", index, self.section);
    }

    fn on_bar(&mut self, state: &ClockState) {
        if !self.section.is_playable() {
            for performer in &mut self.performers {
                performer.clear_current_bar();
            }
            return;
        }

        let bar = state.bar.max(0) as usize;
        let harmonic = match self.meso.get_harmonic(self.section, bar) {
            Ok(harmonic) => harmonic,
            Err(e) => {
                log::error!("No harmonic for {:?} bar {}: {}", self.section, bar, e);
                0
            }
        };

        log::debug!("Bar {} of {:?} on {}", bar, self.section, harmonic);
        for performer in &mut self.performers {
            performer.generate_bar(self.section, bar, harmonic);
        }
    }

    fn on_beat(&mut self, state: &ClockState) {
        for performer in &mut self.performers {
            performer.add_beat(state, &mut self.conductor);
        }
    }

    fn on_pulse(&mut self, state: &ClockState) {
        let bar = state.absolute_bar();
        let pulse = state.pulse.max(0) as usize;

        for performer in &mut self.performers {
            performer.play(bar, pulse);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::clock::{Clock, ClockConfig};
    use crate::conductor::Mood;
    use crate::event::{Note, NoteIntent};
    use crate::generation::{ArpeggioLine, PopForm, SimpleProgression, StaticForm};
    use crate::instrument::Instrument;

    type Log = Arc<Mutex<Vec<Note>>>;

    struct Recorder {
        log: Log,
    }

    impl Instrument for Recorder {
        fn note_on(&mut self, pitch: f32, velocity: f32) {
            self.log.lock().unwrap().push(Note::On { pitch, velocity });
        }

        fn note_off(&mut self, pitch: f32) {
            self.log.lock().unwrap().push(Note::Off { pitch });
        }

        fn stop_all(&mut self) {}

        fn process_block(&mut self, _output: &mut [f32], _channels: usize) {}
    }

    // One pulse per sample keeps the arithmetic obvious:
    // 4 pulses per beat, 4 beats per bar, 2 bars per section.
    fn config() -> ClockConfig {
        ClockConfig {
            tempo: 60,
            pulses_per_beat: 4,
            beats_per_bar: 4,
            bars_per_section: 2,
        }
    }

    fn ensemble(
        macro_gen: MacroGenerator,
        line: impl crate::generation::LineGenerator + 'static,
    ) -> (Ensemble, Log) {
        let config = config();
        let meso = MesoGenerator::new(config.bars_per_section, Box::new(SimpleProgression)).unwrap();
        let mut conductor = Conductor::default();
        conductor.set_mood(Mood::Tender, 0.0);

        let log: Log = Arc::default();
        let mut ensemble = Ensemble::new(macro_gen, meso, conductor);
        ensemble.add_performer(Performer::new(
            "lead",
            Box::new(Recorder { log: log.clone() }),
            Box::new(line),
            &config,
        ));
        (ensemble, log)
    }

    fn clock() -> Clock {
        Clock::new(4.0, config()).unwrap()
    }

    #[test]
    fn test_first_bar_plays_on_downbeat() {
        let macro_gen = MacroGenerator::new(4, false, Box::new(StaticForm)).unwrap();
        let (mut ensemble, log) = ensemble(macro_gen, ArpeggioLine);
        let mut clock = clock();

        clock.advance(1, &mut ensemble);
        assert_eq!(ensemble.section(), SectionLabel::Intro);

        // Intro sits on harmonic 1: degree 1 of C major is D.
        assert_eq!(
            log.lock().unwrap().first(),
            Some(&Note::On {
                pitch: 62.0,
                velocity: 0.4
            })
        );
    }

    #[test]
    fn test_end_stops_scheduling() {
        let macro_gen = MacroGenerator::new(1, false, Box::new(StaticForm)).unwrap();
        let (mut ensemble, log) = ensemble(macro_gen, ArpeggioLine);
        let mut clock = clock();

        // One section of two 16-pulse bars, then End.
        clock.advance(32, &mut ensemble);
        let played = log.lock().unwrap().len();
        assert!(played > 0);

        clock.advance(1, &mut ensemble);
        assert_eq!(ensemble.section(), SectionLabel::End);

        // Release tails still land, but nothing new starts.
        clock.advance(64, &mut ensemble);
        let log = log.lock().unwrap();
        assert!(log[played..].iter().all(|n| !n.is_note_on()));
    }

    #[test]
    fn test_notes_pair_up() {
        let macro_gen = MacroGenerator::new(8, true, Box::new(PopForm)).unwrap();
        let (mut ensemble, log) = ensemble(macro_gen, ArpeggioLine);
        let mut clock = clock();

        // Three sections of two bars, five arpeggio notes per bar.
        clock.advance(16 * 2 * 3, &mut ensemble);

        let mut held: Vec<f32> = Vec::new();
        for note in log.lock().unwrap().iter() {
            match *note {
                Note::On { pitch, .. } => held.push(pitch),
                Note::Off { pitch } => {
                    let index = held.iter().position(|&p| p == pitch);
                    assert!(index.is_some(), "note-off {} without a held note", pitch);
                    held.swap_remove(index.unwrap());
                }
            }
        }
        let ons = log.lock().unwrap().iter().filter(|n| n.is_note_on()).count();
        assert_eq!(ons, 5 * 6);

        // Every note still held has its note-off waiting in the score.
        let lead = ensemble.performer("lead").unwrap();
        assert_eq!(lead.score().pending(), held.len());

        ensemble.stop();
        assert!(ensemble.performer("lead").unwrap().score().is_empty());
        assert_eq!(ensemble.section(), SectionLabel::None);
    }

    #[test]
    fn test_restart_regenerates_form() {
        let calls = Arc::new(Mutex::new(0));
        let counter = calls.clone();
        let form = move |sequence: &mut [SectionLabel]| {
            *counter.lock().unwrap() += 1;
            sequence.fill(SectionLabel::Verse);
        };
        let macro_gen = MacroGenerator::new(2, true, Box::new(form)).unwrap();
        let line = |_: SectionLabel, _: usize, _: i32| vec![NoteIntent::new(0.0, 0.0, 0.25, 1.0)];
        let (mut ensemble, _) = ensemble(macro_gen, line);
        let mut clock = clock();

        clock.advance(16 * 2 * 4, &mut ensemble);
        assert_eq!(*calls.lock().unwrap(), 1);

        clock.reset();
        ensemble.restart();
        clock.advance(1, &mut ensemble);
        assert_eq!(*calls.lock().unwrap(), 2);
        assert_eq!(ensemble.section(), SectionLabel::Verse);
    }
}
