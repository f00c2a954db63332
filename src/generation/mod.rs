// src/generation/mod.rs
//
// Three-tier procedural generation.
//
// - macro: the form, a sequence of section labels (whole-sequence cache)
// - meso: one harmonic root per bar of a section (per-section cache)
// - micro: the note intents of one bar (cached per bar by each performer)

mod automaton;
mod macro_gen;
mod meso;
mod micro;
mod presets;
mod registry;

pub use automaton::Automaton1D;
pub use macro_gen::{MacroGenerator, SequenceGenerator};
pub use meso::{MesoGenerator, ProgressionGenerator};
pub use micro::LineGenerator;
pub use presets::{ArpeggioLine, AutomatonLine, PopForm, SimpleProgression, StaticForm, StaticProgression};
pub use registry::{GeneratorRegistry, generator_names, register_standard_generators};
