// src/conductor.rs
//
// Mood-driven performance parameters.
//
// The conductor holds two smoothed control axes, energy and stress, and
// derives from them the multipliers that turn abstract note intents into
// concrete, humanized note events.

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::event::{NoteEvent, NoteIntent};
use crate::scale::{ModeType, ScaleModel, ScaleType};

/// Pitch of scale degree 0 unless configured otherwise (middle C).
pub const DEFAULT_KEY: f32 = 60.0;

// ═══════════════════════════════════════════════════════════════════
// Mood presets
// ═══════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mood {
    #[default]
    Neutral,
    Happy,
    Tender,
    Exciting,
    Sad,
    Depressed,
    Angry,
}

impl Mood {
    /// (energy, stress) pair of the preset.
    pub fn values(self) -> (f32, f32) {
        match self {
            Mood::Neutral => (0.5, 0.5),
            Mood::Happy => (0.5, 0.0),
            Mood::Tender => (0.0, 0.0),
            Mood::Exciting => (1.0, 0.0),
            Mood::Sad => (0.25, 0.75),
            Mood::Depressed => (0.0, 1.0),
            Mood::Angry => (1.0, 1.0),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// Smoothed control value
// ═══════════════════════════════════════════════════════════════════

/// Current/target/speed triple gliding exponentially toward its target.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Glide {
    current: f32,
    target: f32,
    speed: f32,
}

impl Glide {
    fn new(value: f32) -> Self {
        Self {
            current: value,
            target: value,
            speed: 1.0,
        }
    }

    /// Returns true when the current value changed immediately.
    fn set_target(&mut self, target: f32, smoothness: f32) -> bool {
        let smoothness = smoothness.max(0.0);
        self.target = target.clamp(-1.0, 1.0);

        if smoothness == 0.0 {
            self.speed = 1.0;
            let changed = self.current != self.target;
            self.current = self.target;
            changed
        } else {
            self.speed = 1.0 / (smoothness * smoothness);
            false
        }
    }

    /// Move toward the target by one frame of `delta_seconds`.
    fn step(&mut self, delta_seconds: f32) -> bool {
        if self.current == self.target {
            return false;
        }

        let movement = self.speed * delta_seconds;
        if movement <= 0.0 {
            return false;
        }

        if (self.current - self.target).abs() < 0.01 * movement {
            self.current = self.target;
        } else {
            let t = movement.clamp(0.0, 1.0);
            let next = self.current + (self.target - self.current) * t;

            // A step below half an ulp of `current` would stall forever.
            self.current = if next == self.current { self.target } else { next };
        }
        true
    }
}

// ═══════════════════════════════════════════════════════════════════
// Derived parameters
// ═══════════════════════════════════════════════════════════════════

/// Performance multipliers derived from (energy, stress).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceParameters {
    pub tempo_multiplier: f32,
    pub articulation_multiplier: f32,
    pub loudness_multiplier: f32,
    pub articulation_variance: f32,
    pub loudness_variance: f32,

    /// Octave bias; rounded and halved into whole octaves
    pub pitch_height: f32,

    /// Sign and scale applied to scale degrees; in [-1, 1]
    pub harmonic_curve: f32,
}

impl PerformanceParameters {
    pub fn from_mood(energy: f32, stress: f32) -> Self {
        let curve = if stress > 0.5 {
            0.75 * (1.0 - stress) + 0.25 * (1.0 - energy)
        } else {
            1.0
        };

        Self {
            tempo_multiplier: 0.85 + 0.3 * energy,
            articulation_multiplier: 0.25 + 1.75 * (1.0 - energy),
            loudness_multiplier: 0.4 + 0.6 * energy,
            articulation_variance: 0.15 * energy,
            loudness_variance: 0.25 * (energy + stress) / 2.0,
            pitch_height: 3.0 * (energy * 0.25 + (1.0 - stress) * 0.75) - 2.0,
            harmonic_curve: 2.0 * curve - 1.0,
        }
    }

    /// Scale chosen for a stress level.
    pub fn scale_for(stress: f32) -> ScaleType {
        if stress < 0.25 {
            ScaleType::Major
        } else if stress < 0.5 {
            ScaleType::NaturalMinor
        } else {
            ScaleType::HarmonicMinor
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// Conductor
// ═══════════════════════════════════════════════════════════════════

/// Interprets note intents according to the current mood.
///
/// Humanization draws from an injected random source, so a seeded
/// conductor always performs the same way.
pub struct Conductor {
    fundamental_key: f32,

    energy: Glide,
    stress: Glide,
    mood: Option<Mood>,

    params: PerformanceParameters,
    scale: ScaleModel,

    rng: Box<dyn RngCore + Send>,
}

impl Conductor {
    pub fn new(fundamental_key: f32, seed: u64) -> Self {
        Self::with_rng(fundamental_key, Box::new(ChaCha8Rng::seed_from_u64(seed)))
    }

    pub fn with_rng(fundamental_key: f32, rng: Box<dyn RngCore + Send>) -> Self {
        let (energy, stress) = Mood::Neutral.values();

        let mut conductor = Self {
            fundamental_key,
            energy: Glide::new(energy),
            stress: Glide::new(stress),
            mood: Some(Mood::Neutral),
            params: PerformanceParameters::from_mood(energy, stress),
            scale: ScaleModel::default(),
            rng,
        };
        conductor.update_parameters();
        conductor
    }

    // -------------------------------
    // MARK: Mood control
    // -------------------------------

    /// Glide to a preset over `smoothness` seconds (0 = immediately).
    pub fn set_mood(&mut self, mood: Mood, smoothness: f32) {
        let (energy, stress) = mood.values();
        self.set_mood_values(energy, stress, smoothness);
        self.mood = Some(mood);
        log::info!("Mood set to {:?} (smoothness {}s)", mood, smoothness);
    }

    /// Glide to an explicit (energy, stress) pair.
    pub fn set_mood_values(&mut self, energy: f32, stress: f32, smoothness: f32) {
        self.set_energy(energy, smoothness);
        self.set_stress(stress, smoothness);
    }

    pub fn set_energy(&mut self, energy: f32, smoothness: f32) {
        self.mood = None;
        if self.energy.set_target(energy, smoothness) {
            self.update_parameters();
        }
    }

    pub fn set_stress(&mut self, stress: f32, smoothness: f32) {
        self.mood = None;
        if self.stress.set_target(stress, smoothness) {
            self.update_parameters();
        }
    }

    /// Advance both glides by one frame.
    ///
    /// Returns true when the derived parameters changed.
    pub fn update(&mut self, delta_seconds: f32) -> bool {
        let energy_moved = self.energy.step(delta_seconds);
        let stress_moved = self.stress.step(delta_seconds);

        if energy_moved || stress_moved {
            self.update_parameters();
            true
        } else {
            false
        }
    }

    fn update_parameters(&mut self) {
        let energy = self.energy.current;
        let stress = self.stress.current;

        self.params = PerformanceParameters::from_mood(energy, stress);

        let scale_type = PerformanceParameters::scale_for(stress);
        if scale_type != self.scale.scale_type() {
            self.scale.set_scale(scale_type, ModeType::Ionian);
        }
    }

    // -------------------------------
    // MARK: Note transformation
    // -------------------------------

    /// Turn an abstract intent into a concrete, humanized note.
    pub fn transform_note(&mut self, intent: &NoteIntent) -> NoteEvent {
        let curve = self.params.harmonic_curve.round_ties_even() as i32;
        let index = if curve != 0 {
            curve as f32 * intent.index
        } else {
            intent.index
        };

        let octaves = self.params.pitch_height.round_ties_even() as i32 / 2;
        let shift = (octaves * self.scale.len() as i32) as f32;
        let pitch = self.fundamental_key + self.scale.degree_to_offset(index + shift);

        let duration_mean = intent.duration * self.params.articulation_multiplier;
        let duration = self
            .next_normal(duration_mean, duration_mean * self.params.articulation_variance)
            .max(0.0);

        let loudness_mean = intent.loudness * self.params.loudness_multiplier;
        let velocity = self
            .next_normal(loudness_mean, loudness_mean * self.params.loudness_variance)
            .clamp(0.0, 1.0);

        NoteEvent {
            pitch,
            onset: intent.onset,
            duration,
            velocity,
        }
    }

    /// Box-Muller sample; a zero deviation returns the mean untouched.
    fn next_normal(&mut self, mean: f32, deviation: f32) -> f32 {
        if deviation == 0.0 {
            return mean;
        }

        let u1 = 1.0 - self.rng.random::<f32>();
        let u2 = self.rng.random::<f32>();
        let z = (-2.0 * u1.ln()).sqrt() * (std::f32::consts::TAU * u2).cos();
        mean + deviation.abs() * z
    }

    // -------------------------------
    // MARK: Accessors
    // -------------------------------

    #[inline]
    pub fn key(&self) -> f32 {
        self.fundamental_key
    }

    pub fn set_key(&mut self, key: f32) {
        self.fundamental_key = key;
    }

    #[inline]
    pub fn energy(&self) -> f32 {
        self.energy.current
    }

    #[inline]
    pub fn stress(&self) -> f32 {
        self.stress.current
    }

    /// Preset last applied, if the mood was not set by raw values since.
    #[inline]
    pub fn mood(&self) -> Option<Mood> {
        self.mood
    }

    #[inline]
    pub fn parameters(&self) -> &PerformanceParameters {
        &self.params
    }

    #[inline]
    pub fn tempo_multiplier(&self) -> f32 {
        self.params.tempo_multiplier
    }

    #[inline]
    pub fn scale(&self) -> &ScaleModel {
        &self.scale
    }

    /// Whether either axis is still gliding.
    pub fn is_gliding(&self) -> bool {
        self.energy.current != self.energy.target || self.stress.current != self.stress.target
    }
}

impl Default for Conductor {
    fn default() -> Self {
        Self::new(DEFAULT_KEY, 0)
    }
}
