// src/generation/registry.rs
//
// Name -> factory registry for generators.
//
// Hosts pick generators by name (from config or UI); the registry turns
// the name into a fresh instance sized for the current clock structure.

use std::collections::BTreeMap;

use crate::clock::ClockConfig;
use crate::error::{Error, Result};

use super::macro_gen::SequenceGenerator;
use super::meso::ProgressionGenerator;
use super::micro::LineGenerator;
use super::presets::{ArpeggioLine, AutomatonLine, PopForm, SimpleProgression, StaticForm, StaticProgression};

// ═══════════════════════════════════════════════════════════════════
// Generator names
// ═══════════════════════════════════════════════════════════════════

pub mod generator_names {
    pub const STATIC: &str = "static";
    pub const POP: &str = "pop";
    pub const SIMPLE: &str = "simple";
    pub const ARPEGGIO: &str = "arpeggio";
    pub const AUTOMATON: &str = "automaton";
}

type MacroFactory = Box<dyn Fn(&ClockConfig) -> Box<dyn SequenceGenerator> + Send + Sync>;
type MesoFactory = Box<dyn Fn(&ClockConfig) -> Box<dyn ProgressionGenerator> + Send + Sync>;
type MicroFactory = Box<dyn Fn(&ClockConfig) -> Box<dyn LineGenerator> + Send + Sync>;

/// Factories for the three generator tiers, keyed by name.
#[derive(Default)]
pub struct GeneratorRegistry {
    macro_factories: BTreeMap<String, MacroFactory>,
    meso_factories: BTreeMap<String, MesoFactory>,
    micro_factories: BTreeMap<String, MicroFactory>,
}

impl GeneratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------
    // MARK: Registration
    // -------------------------------

    pub fn register_macro<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&ClockConfig) -> Box<dyn SequenceGenerator> + Send + Sync + 'static,
    {
        self.macro_factories.insert(name.into(), Box::new(factory));
    }

    pub fn register_meso<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&ClockConfig) -> Box<dyn ProgressionGenerator> + Send + Sync + 'static,
    {
        self.meso_factories.insert(name.into(), Box::new(factory));
    }

    pub fn register_micro<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&ClockConfig) -> Box<dyn LineGenerator> + Send + Sync + 'static,
    {
        self.micro_factories.insert(name.into(), Box::new(factory));
    }

    // -------------------------------
    // MARK: Instantiation
    // -------------------------------

    pub fn create_macro(&self, name: &str, clock: &ClockConfig) -> Result<Box<dyn SequenceGenerator>> {
        self.macro_factories
            .get(name)
            .map(|factory| factory(clock))
            .ok_or_else(|| Error::UnknownGenerator {
                kind: "macro",
                name: name.to_string(),
            })
    }

    pub fn create_meso(&self, name: &str, clock: &ClockConfig) -> Result<Box<dyn ProgressionGenerator>> {
        self.meso_factories
            .get(name)
            .map(|factory| factory(clock))
            .ok_or_else(|| Error::UnknownGenerator {
                kind: "meso",
                name: name.to_string(),
            })
    }

    pub fn create_micro(&self, name: &str, clock: &ClockConfig) -> Result<Box<dyn LineGenerator>> {
        self.micro_factories
            .get(name)
            .map(|factory| factory(clock))
            .ok_or_else(|| Error::UnknownGenerator {
                kind: "micro",
                name: name.to_string(),
            })
    }

    // -------------------------------
    // MARK: Introspection
    // -------------------------------

    pub fn macro_names(&self) -> impl Iterator<Item = &str> {
        self.macro_factories.keys().map(String::as_str)
    }

    pub fn meso_names(&self) -> impl Iterator<Item = &str> {
        self.meso_factories.keys().map(String::as_str)
    }

    pub fn micro_names(&self) -> impl Iterator<Item = &str> {
        self.micro_factories.keys().map(String::as_str)
    }
}

/// Populate the registry with the built-in generators.
pub fn register_standard_generators(registry: &mut GeneratorRegistry) {
    use generator_names::*;

    registry.register_macro(STATIC, |_| Box::new(StaticForm));
    registry.register_macro(POP, |_| Box::new(PopForm));

    registry.register_meso(STATIC, |_| Box::new(StaticProgression));
    registry.register_meso(SIMPLE, |_| Box::new(SimpleProgression));

    registry.register_micro(ARPEGGIO, |_| Box::new(ArpeggioLine));
    // Sixteenth-note grid
    registry.register_micro(AUTOMATON, |clock| {
        Box::new(AutomatonLine::new(clock.beats_per_bar * 4))
    });
}
