// src/lib.rs
//
// Adaptive procedural music engine.
//
// An audio callback feeds sample counts into a hierarchical clock; the
// ensemble listening to it generates form, harmony and lines, the
// conductor shapes them by mood, and performers play them into
// polyphonic instruments.

mod bridge;
mod clock;
mod conductor;
mod config;
mod ensemble;
mod error;
mod event;
mod musician;
mod performer;
mod scale;
mod score;

pub mod generation;
pub mod instrument;

// Re-export key types for Rust consumers
pub use bridge::{Control, ControlHandle, Readback};
pub use clock::{Clock, ClockConfig, ClockListener, ClockState, ListenerChain};
pub use conductor::{Conductor, DEFAULT_KEY, Mood, PerformanceParameters};
pub use config::MusicianConfig;
pub use ensemble::Ensemble;
pub use error::{Error, Result};
pub use event::{Note, NoteEvent, NoteIntent, PulsePosition, ScheduledNote, SectionLabel};
pub use generation::{
    GeneratorRegistry, LineGenerator, MacroGenerator, MesoGenerator, ProgressionGenerator,
    SequenceGenerator, generator_names, register_standard_generators,
};
pub use instrument::{
    AudioEffect, Instrument, PolyphonicInstrument, Voice, VoiceAllocator, pitch_to_frequency,
};
pub use musician::Musician;
pub use performer::Performer;
pub use scale::{ModeType, ScaleModel, ScaleType};
pub use score::Score;
