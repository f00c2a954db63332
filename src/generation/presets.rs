// src/generation/presets.rs
//
// Built-in generators. Registered by name in `register_standard_generators`.

use crate::event::{NoteIntent, SectionLabel};

use super::automaton::Automaton1D;
use super::macro_gen::SequenceGenerator;
use super::meso::ProgressionGenerator;
use super::micro::LineGenerator;

// ═══════════════════════════════════════════════════════════════════
// Macro presets
// ═══════════════════════════════════════════════════════════════════

/// Every section is an intro.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticForm;

impl SequenceGenerator for StaticForm {
    fn generate_sequence(&mut self, sequence: &mut [SectionLabel]) {
        sequence.fill(SectionLabel::Intro);
    }
}

/// Verse/chorus pop form closing on an outro.
#[derive(Debug, Default, Clone, Copy)]
pub struct PopForm;

impl PopForm {
    const OPENING: [SectionLabel; 9] = [
        SectionLabel::Intro,
        SectionLabel::Verse,
        SectionLabel::PreChorus,
        SectionLabel::Chorus,
        SectionLabel::Verse,
        SectionLabel::PreChorus,
        SectionLabel::Chorus,
        SectionLabel::Bridge,
        SectionLabel::Chorus,
    ];
}

impl SequenceGenerator for PopForm {
    fn generate_sequence(&mut self, sequence: &mut [SectionLabel]) {
        let Some((last, body)) = sequence.split_last_mut() else {
            return;
        };

        if body.is_empty() {
            *last = SectionLabel::Intro;
            return;
        }

        for (i, slot) in body.iter_mut().enumerate() {
            *slot = match Self::OPENING.get(i) {
                Some(&label) => label,
                None if (i - Self::OPENING.len()) % 2 == 0 => SectionLabel::Verse,
                None => SectionLabel::Chorus,
            };
        }
        *last = SectionLabel::Outro;
    }
}

// ═══════════════════════════════════════════════════════════════════
// Meso presets
// ═══════════════════════════════════════════════════════════════════

/// Every bar sits on the tonic.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticProgression;

impl ProgressionGenerator for StaticProgression {
    fn generate_progression(&mut self, _section: SectionLabel, progression: &mut [i32]) {
        progression.fill(0);
    }
}

/// Fixed four-bar progressions per section, repeated across longer sections.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleProgression;

impl SimpleProgression {
    fn table(section: SectionLabel) -> Option<[i32; 4]> {
        match section {
            SectionLabel::Intro => Some([1, 1, 1, 1]),
            SectionLabel::Verse => Some([1, 4, 2, 5]),
            SectionLabel::PreChorus => Some([1, 4, 5, 8]),
            SectionLabel::Chorus => Some([1, 4, 5, 1]),
            SectionLabel::Bridge => Some([1, 4, 5, 4]),
            SectionLabel::Outro => Some([1, 5, 1, 1]),
            SectionLabel::None | SectionLabel::End => None,
        }
    }
}

impl ProgressionGenerator for SimpleProgression {
    fn generate_progression(&mut self, section: SectionLabel, progression: &mut [i32]) {
        match Self::table(section) {
            Some(table) => {
                for (i, slot) in progression.iter_mut().enumerate() {
                    *slot = table[i % table.len()];
                }
            }
            None => progression.fill(0),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// Micro presets
// ═══════════════════════════════════════════════════════════════════

/// Five-note arpeggio on the bar's harmonic root.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArpeggioLine;

impl ArpeggioLine {
    /// (degree, onset, duration, loudness)
    const PATTERN: [(i32, f32, f32, f32); 5] = [
        (0, 0.0, 0.25, 1.0),
        (2, 0.25, 0.25, 0.9),
        (4, 0.5, 0.25, 0.95),
        (7, 0.75, 0.125, 0.9),
        (4, 0.875, 0.125, 0.8),
    ];
}

impl LineGenerator for ArpeggioLine {
    fn generate_line(&mut self, _section: SectionLabel, _bar: usize, harmonic: i32) -> Vec<NoteIntent> {
        Self::PATTERN
            .iter()
            .map(|&(degree, onset, duration, loudness)| {
                NoteIntent::new((harmonic + degree) as f32, onset, duration, loudness)
            })
            .collect()
    }
}

/// Rhythm read off a rule-90 automaton, one generation per line.
///
/// The line reads a `line_length` window centred on the automaton's seed.
/// Growth from a single centre cell reaches index 0 only after about
/// `WIDTH / 2` generations, so a window at the left edge would keep the
/// opening lines silent.
///
/// Each live cell in the window becomes a note on that step of the bar;
/// pitches climb one degree per note from the harmonic root.
#[derive(Debug, Clone)]
pub struct AutomatonLine {
    automaton: Automaton1D,
    line_length: usize,
}

impl AutomatonLine {
    pub const WIDTH: usize = 81;
    pub const RULE: u8 = 90;

    pub fn new(line_length: usize) -> Self {
        Self {
            automaton: Automaton1D::new(Self::WIDTH, Self::RULE),
            line_length: line_length.clamp(1, Self::WIDTH),
        }
    }

    #[inline]
    pub fn line_length(&self) -> usize {
        self.line_length
    }
}

impl LineGenerator for AutomatonLine {
    fn generate_line(&mut self, _section: SectionLabel, _bar: usize, harmonic: i32) -> Vec<NoteIntent> {
        self.automaton.step();

        let step = 1.0 / self.line_length as f32;
        let window = (Self::WIDTH - self.line_length) / 2;
        let mut degree = harmonic;
        let mut line = Vec::new();

        for i in 0..self.line_length {
            if self.automaton.is_alive(window + i) {
                line.push(NoteIntent::new(degree as f32, i as f32 * step, step, 1.0));
                degree += 1;
            }
        }
        line
    }
}
