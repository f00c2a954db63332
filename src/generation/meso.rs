// src/generation/meso.rs
//
// Meso-level generation: one harmonic root per bar of a section.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::event::SectionLabel;

/// Fills the harmonic progression of one section.
///
/// `progression` arrives zeroed with one slot per bar.
pub trait ProgressionGenerator: Send {
    fn generate_progression(&mut self, section: SectionLabel, progression: &mut [i32]);
}

impl<F> ProgressionGenerator for F
where
    F: FnMut(SectionLabel, &mut [i32]) + Send,
{
    fn generate_progression(&mut self, section: SectionLabel, progression: &mut [i32]) {
        self(section, progression)
    }
}

/// Per-section cache of harmonic progressions.
///
/// Unlike the macro generator, generation happens one section at a time:
/// the first request for a label fills that label's progression only.
pub struct MesoGenerator {
    progression_length: usize,
    progressions: HashMap<SectionLabel, Vec<i32>>,
    generator: Box<dyn ProgressionGenerator>,
}

impl MesoGenerator {
    pub fn new(bars_per_section: usize, generator: Box<dyn ProgressionGenerator>) -> Result<Self> {
        if bars_per_section == 0 {
            return Err(Error::InvalidStructure {
                field: "bars_per_section",
                value: bars_per_section,
            });
        }

        Ok(Self {
            progression_length: bars_per_section,
            progressions: HashMap::new(),
            generator,
        })
    }

    /// Harmonic root of `bar` in `section`.
    pub fn get_harmonic(&mut self, section: SectionLabel, bar: usize) -> Result<i32> {
        if bar >= self.progression_length {
            return Err(Error::BarOutOfRange {
                bar,
                length: self.progression_length,
            });
        }

        let length = self.progression_length;
        let generator = &mut self.generator;
        let progression = self.progressions.entry(section).or_insert_with(|| {
            let mut progression = vec![0; length];
            generator.generate_progression(section, &mut progression);
            log::debug!("Generated progression {:?} for {:?}", progression, section);
            progression
        });

        Ok(progression[bar])
    }

    /// Forget every generated progression.
    pub fn restart(&mut self) {
        self.progressions.clear();
    }

    #[inline]
    pub fn progression_length(&self) -> usize {
        self.progression_length
    }

    /// Whether a progression for `section` is cached.
    pub fn contains(&self, section: SectionLabel) -> bool {
        self.progressions.contains_key(&section)
    }
}
