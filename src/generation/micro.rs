// src/generation/micro.rs
//
// Micro-level generation: the line of note intents for one bar.
//
// Line generators may carry internal state (an automaton, a random walk);
// caching of generated lines is the performer's job.

use crate::event::{NoteIntent, SectionLabel};

/// Produces the note intents of a single bar.
pub trait LineGenerator: Send {
    fn generate_line(&mut self, section: SectionLabel, bar: usize, harmonic: i32) -> Vec<NoteIntent>;
}

impl<F> LineGenerator for F
where
    F: FnMut(SectionLabel, usize, i32) -> Vec<NoteIntent> + Send,
{
    fn generate_line(&mut self, section: SectionLabel, bar: usize, harmonic: i32) -> Vec<NoteIntent> {
        self(section, bar, harmonic)
    }
}
