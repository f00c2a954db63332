// src/event.rs

/// ===============================
/// Structural labels
/// ===============================

/// Section of the musical form.
///
/// `None` marks a slot the macro generator has not resolved yet.
/// `End` is terminal: no bars are generated once it is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SectionLabel {
    #[default]
    None,
    Intro,
    Verse,
    PreChorus,
    Chorus,
    Bridge,
    Outro,
    End,
}

impl SectionLabel {
    /// Whether the label names a playable section.
    #[inline]
    pub fn is_playable(self) -> bool {
        !matches!(self, SectionLabel::None | SectionLabel::End)
    }

    /// One-character tag, handy for logging whole sequences.
    pub fn symbol(self) -> char {
        match self {
            SectionLabel::None => ' ',
            SectionLabel::Intro => 'I',
            SectionLabel::Verse => 'V',
            SectionLabel::PreChorus => 'P',
            SectionLabel::Chorus => 'C',
            SectionLabel::Bridge => 'B',
            SectionLabel::Outro => 'O',
            SectionLabel::End => '.',
        }
    }
}

/// ===============================
/// Generator-side note intents
/// ===============================

/// An abstract note produced by a micro generator.
///
/// These intents:
/// - carry scale degrees, not pitches
/// - are positioned relative to their bar
/// - are never mutated once generated
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteIntent {
    /// Scale degree; fractional values interpolate between degrees
    pub index: f32,

    /// Onset as a fraction of the bar, in [0, 1)
    pub onset: f32,

    /// Duration as a fraction of the bar
    pub duration: f32,

    /// Normalized loudness in [0, 1]
    pub loudness: f32,
}

impl NoteIntent {
    pub fn new(index: f32, onset: f32, duration: f32, loudness: f32) -> Self {
        Self {
            index,
            onset,
            duration,
            loudness,
        }
    }

    /// Beat of the bar this intent starts on.
    #[inline]
    pub fn beat(&self, beats_per_bar: usize) -> i64 {
        (self.onset * beats_per_bar as f32).floor() as i64
    }
}

/// ===============================
/// Conductor-side note events
/// ===============================

/// A concrete pitched note, as interpreted by the conductor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteEvent {
    /// Pitch in semitones (MIDI note number domain, fractional allowed)
    pub pitch: f32,

    /// Onset as a fraction of the bar
    pub onset: f32,

    /// Duration as a fraction of the bar
    pub duration: f32,

    /// Velocity in [0, 1]
    pub velocity: f32,
}

impl NoteEvent {
    /// The note-on half of this event.
    #[inline]
    pub fn note_on(&self) -> Note {
        Note::On {
            pitch: self.pitch,
            velocity: self.velocity,
        }
    }

    /// The note-off half of this event.
    #[inline]
    pub fn note_off(&self) -> Note {
        Note::Off { pitch: self.pitch }
    }
}

/// ===============================
/// Performer-side scheduled notes
/// ===============================

/// A message dispatched to an instrument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Note {
    On { pitch: f32, velocity: f32 },

    Off { pitch: f32 },
}

impl Note {
    #[inline]
    pub fn pitch(&self) -> f32 {
        match *self {
            Note::On { pitch, .. } | Note::Off { pitch } => pitch,
        }
    }

    #[inline]
    pub fn is_note_on(&self) -> bool {
        matches!(self, Note::On { .. })
    }
}

/// Absolute timeline coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PulsePosition {
    /// Bar counted from the start of playback
    pub bar: i64,

    /// Pulse within the bar
    pub pulse: usize,
}

impl PulsePosition {
    /// Resolve a position measured in bars into a (bar, pulse) pair.
    ///
    /// The position is quantized to the nearest pulse first, so a note
    /// that rounds up to the next downbeat lands in the next bar.
    pub fn from_bars(position: f64, bar_length: usize) -> Self {
        let length = bar_length as i64;
        let pulses = (position * bar_length as f64).round() as i64;
        Self {
            bar: pulses.div_euclid(length),
            pulse: pulses.rem_euclid(length) as usize,
        }
    }
}

/// A note bound to its timeline coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledNote {
    pub position: PulsePosition,
    pub note: Note,
}
