// src/generation/macro_gen.rs
//
// Macro-level generation: the sequence of sections (musical form).

use crate::error::{Error, Result};
use crate::event::SectionLabel;

/// Fills a whole section sequence in place.
///
/// Slots already resolved may be kept or overwritten; slots left as
/// `SectionLabel::None` are reported as unresolved by the caller.
pub trait SequenceGenerator: Send {
    fn generate_sequence(&mut self, sequence: &mut [SectionLabel]);
}

impl<F> SequenceGenerator for F
where
    F: FnMut(&mut [SectionLabel]) + Send,
{
    fn generate_sequence(&mut self, sequence: &mut [SectionLabel]) {
        self(sequence)
    }
}

/// Lazily generated, optionally looping sequence of sections.
///
/// Generation is whole-sequence: the first lookup of any unresolved slot
/// fills every slot at once, and nothing is regenerated until `restart`.
pub struct MacroGenerator {
    sequence: Vec<SectionLabel>,
    looping: bool,
    generator: Box<dyn SequenceGenerator>,
}

impl MacroGenerator {
    pub fn new(length: usize, looping: bool, generator: Box<dyn SequenceGenerator>) -> Result<Self> {
        if length == 0 {
            return Err(Error::EmptySequence);
        }

        Ok(Self {
            sequence: vec![SectionLabel::None; length],
            looping,
            generator,
        })
    }

    /// Section at position `index` of the form.
    ///
    /// Past the end of the sequence this returns `End`, or wraps around
    /// when looping.
    pub fn get_section(&mut self, index: usize) -> Result<SectionLabel> {
        let index = if index >= self.sequence.len() {
            if !self.looping {
                return Ok(SectionLabel::End);
            }
            index % self.sequence.len()
        } else {
            index
        };

        if self.sequence[index] == SectionLabel::None {
            self.generator.generate_sequence(&mut self.sequence);
            log::debug!("Generated section sequence '{}'", self.describe());

            if self.sequence[index] == SectionLabel::None {
                return Err(Error::UnresolvedSection { index });
            }
        }

        Ok(self.sequence[index])
    }

    /// Forget the generated sequence, keeping its length.
    pub fn restart(&mut self) {
        self.sequence.fill(SectionLabel::None);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    #[inline]
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// The sequence as one symbol per section.
    pub fn describe(&self) -> String {
        self.sequence.iter().map(|s| s.symbol()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(calls: Arc<AtomicUsize>) -> Box<dyn SequenceGenerator> {
        Box::new(move |sequence: &mut [SectionLabel]| {
            calls.fetch_add(1, Ordering::SeqCst);
            for (i, slot) in sequence.iter_mut().enumerate() {
                *slot = if i % 2 == 0 {
                    SectionLabel::Verse
                } else {
                    SectionLabel::Chorus
                };
            }
        })
    }

    #[test]
    fn test_whole_sequence_generated_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut macro_gen = MacroGenerator::new(4, false, counting(calls.clone())).unwrap();

        assert_eq!(macro_gen.get_section(0).unwrap(), SectionLabel::Verse);
        assert_eq!(macro_gen.get_section(3).unwrap(), SectionLabel::Chorus);
        assert_eq!(macro_gen.get_section(0).unwrap(), SectionLabel::Verse);
        assert_eq!(macro_gen.get_section(2).unwrap(), SectionLabel::Verse);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_end_is_terminal_without_looping() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut macro_gen = MacroGenerator::new(2, false, counting(calls.clone())).unwrap();

        assert_eq!(macro_gen.get_section(2).unwrap(), SectionLabel::End);
        assert_eq!(macro_gen.get_section(7).unwrap(), SectionLabel::End);
        assert_eq!(macro_gen.get_section(100).unwrap(), SectionLabel::End);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_looping_wraps() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut macro_gen = MacroGenerator::new(3, true, counting(calls.clone())).unwrap();

        assert_eq!(macro_gen.get_section(3).unwrap(), SectionLabel::Verse);
        assert_eq!(macro_gen.get_section(4).unwrap(), SectionLabel::Chorus);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_restart_regenerates() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut macro_gen = MacroGenerator::new(4, false, counting(calls.clone())).unwrap();

        macro_gen.get_section(1).unwrap();
        macro_gen.restart();
        assert_eq!(macro_gen.len(), 4);
        assert_eq!(macro_gen.describe(), "    ");

        macro_gen.get_section(1).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(macro_gen.describe(), "VCVC");
    }

    #[test]
    fn test_unresolved_slot_is_an_error() {
        let lazy = |_: &mut [SectionLabel]| {};
        let mut macro_gen = MacroGenerator::new(2, false, Box::new(lazy)).unwrap();

        assert_eq!(
            macro_gen.get_section(1),
            Err(Error::UnresolvedSection { index: 1 })
        );
    }

    #[test]
    fn test_zero_length_rejected() {
        let fill = |_: &mut [SectionLabel]| {};
        assert_eq!(
            MacroGenerator::new(0, true, Box::new(fill)).err(),
            Some(Error::EmptySequence)
        );
    }
}
