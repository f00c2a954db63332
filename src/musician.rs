// src/musician.rs
//
// Top-level owner of the clock and the ensemble.
//
// The host calls `process_block` from its audio callback and `update`
// once per frame; everything else happens inside those two calls.

use std::sync::{Arc, mpsc::Receiver};

use crate::bridge::{Control, ControlHandle, Readback, SharedReadback, create_bridge};
use crate::clock::{Clock, ClockState};
use crate::conductor::{Conductor, Mood};
use crate::config::MusicianConfig;
use crate::ensemble::Ensemble;
use crate::error::Result;
use crate::event::SectionLabel;
use crate::generation::{
    GeneratorRegistry, LineGenerator, MacroGenerator, MesoGenerator, ProgressionGenerator,
    SequenceGenerator,
};
use crate::instrument::Instrument;
use crate::performer::Performer;

/// Generates and performs music in real time.
///
/// This struct:
/// - advances the clock by each audio block and renders the performers
/// - retunes the clock whenever the conductor's tempo multiplier moves
/// - applies control commands queued through its [`ControlHandle`]s
pub struct Musician {
    config: MusicianConfig,

    clock: Clock,
    ensemble: Ensemble,
    playing: bool,

    handle: ControlHandle,
    controls: Receiver<Control>,
    readback: Arc<SharedReadback>,
}

impl Musician {
    /// Build a musician whose form and progressions come from `registry`.
    pub fn new(
        config: MusicianConfig,
        registry: &GeneratorRegistry,
        form: &str,
        progression: &str,
    ) -> Result<Self> {
        let clock_config = config.clock_config();
        let macro_gen = registry.create_macro(form, &clock_config)?;
        let meso = registry.create_meso(progression, &clock_config)?;
        Self::with_generators(config, macro_gen, meso)
    }

    /// Build a musician around caller-supplied macro and meso generators.
    pub fn with_generators(
        config: MusicianConfig,
        form: Box<dyn SequenceGenerator>,
        progression: Box<dyn ProgressionGenerator>,
    ) -> Result<Self> {
        config.validate()?;

        let clock = Clock::new(config.sample_rate, config.clock_config())?;
        let macro_gen = MacroGenerator::new(config.sequence_length, config.loop_sequence, form)?;
        let meso = MesoGenerator::new(config.bars_per_section, progression)?;
        let conductor = Conductor::new(config.fundamental_key, config.seed);

        let (handle, controls, readback) = create_bridge();

        let mut musician = Self {
            config,
            clock,
            ensemble: Ensemble::new(macro_gen, meso, conductor),
            playing: false,
            handle,
            controls,
            readback,
        };
        musician.retune();
        musician.publish_readback();

        log::info!(
            "Musician ready: {} Hz, {} BPM, {}/{}/{} (pulses/beats/bars)",
            musician.config.sample_rate,
            musician.config.tempo,
            musician.config.pulses_per_beat,
            musician.config.beats_per_bar,
            musician.config.bars_per_section
        );
        Ok(musician)
    }

    /// Add a performer playing `instrument` with lines from `generator`.
    pub fn add_performer(
        &mut self,
        name: impl Into<String>,
        instrument: Box<dyn Instrument>,
        generator: Box<dyn LineGenerator>,
    ) {
        let performer = Performer::new(name, instrument, generator, &self.config.clock_config());
        self.ensemble.add_performer(performer);
    }

    /// Add a performer whose line generator is looked up by name.
    pub fn add_registered_performer(
        &mut self,
        name: impl Into<String>,
        instrument: Box<dyn Instrument>,
        registry: &GeneratorRegistry,
        line: &str,
    ) -> Result<()> {
        let generator = registry.create_micro(line, &self.config.clock_config())?;
        self.add_performer(name, instrument, generator);
        Ok(())
    }

    /// A handle for steering this musician from another thread.
    pub fn control_handle(&self) -> ControlHandle {
        self.handle.clone()
    }

    // -------------------------------
    // MARK: Transport
    // -------------------------------

    pub fn play(&mut self) {
        if !self.playing {
            self.playing = true;
            log::info!("Playing");
        }
    }

    /// Halt the clock, keeping position and held notes.
    pub fn pause(&mut self) {
        if self.playing {
            self.playing = false;
            log::info!("Paused");
        }
    }

    /// Halt, rewind the clock and silence every performer.
    pub fn stop(&mut self) {
        self.playing = false;
        self.clock.reset();
        self.ensemble.stop();
        log::info!("Stopped");
    }

    /// Stop, then drop every generated form, progression and line.
    pub fn reset(&mut self) {
        self.stop();
        self.ensemble.restart();
        log::info!("Reset");
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    // -------------------------------
    // MARK: Processing
    // -------------------------------

    /// Render one interleaved block.
    ///
    /// Pending controls apply first; the clock then advances by the
    /// block's frame count before the instruments render it.
    pub fn process_block(&mut self, output: &mut [f32], channels: usize) {
        self.process_controls();

        let channels = channels.max(1);
        output.fill(0.0);

        if self.playing {
            self.clock.advance(output.len() / channels, &mut self.ensemble);
        }

        self.ensemble.render(output, channels);

        let volume = self.config.master_volume;
        if volume != 1.0 {
            for sample in output.iter_mut() {
                *sample *= volume;
            }
        }

        self.publish_readback();
    }

    /// Advance mood glides by one frame of `delta_seconds`.
    pub fn update(&mut self, delta_seconds: f32) {
        if self.ensemble.conductor_mut().update(delta_seconds) {
            self.retune();
        }
    }

    fn process_controls(&mut self) {
        while let Ok(control) = self.controls.try_recv() {
            self.apply_control(control);
        }
    }

    fn apply_control(&mut self, control: Control) {
        match control {
            Control::SetMood { mood, smoothness } => self.set_mood(mood, smoothness),
            Control::SetMoodValues {
                energy,
                stress,
                smoothness,
            } => self.set_mood_values(energy, stress, smoothness),
            Control::SetEnergy { energy, smoothness } => self.set_energy(energy, smoothness),
            Control::SetStress { stress, smoothness } => self.set_stress(stress, smoothness),
            Control::SetTempo { bpm } => {
                if let Err(e) = self.set_tempo(bpm) {
                    log::warn!("Dropped {:?}: {}", control, e);
                }
            }
            Control::SetKey { key } => self.set_key(key),
            Control::Play => self.play(),
            Control::Pause => self.pause(),
            Control::Stop => self.stop(),
        }
    }

    /// Clock tempo = base tempo scaled by the conductor, never below 1.
    fn retune(&mut self) {
        let multiplier = self.ensemble.conductor().tempo_multiplier() as f64;
        // Absorb f32 error so exact products do not floor one below.
        let tempo = (self.config.tempo as f64 * multiplier + 1e-3).floor().max(1.0) as u32;

        if tempo != self.clock.tempo() && self.clock.set_tempo(tempo).is_ok() {
            log::debug!("Tempo retuned to {} BPM", tempo);
        }
    }

    fn publish_readback(&self) {
        let state = self.clock.state();
        let conductor = self.ensemble.conductor();

        self.readback.publish(&Readback {
            section: state.section,
            bar: state.bar,
            beat: state.beat,
            tempo: state.tempo,
            energy: conductor.energy(),
            stress: conductor.stress(),
            active_voices: self.ensemble.active_voices(),
            playing: self.playing,
        });
    }

    // -------------------------------
    // MARK: Mood and tuning
    // -------------------------------

    pub fn set_mood(&mut self, mood: Mood, smoothness: f32) {
        self.ensemble.conductor_mut().set_mood(mood, smoothness);
        self.retune();
    }

    pub fn set_mood_values(&mut self, energy: f32, stress: f32, smoothness: f32) {
        self.ensemble
            .conductor_mut()
            .set_mood_values(energy, stress, smoothness);
        self.retune();
    }

    pub fn set_energy(&mut self, energy: f32, smoothness: f32) {
        self.ensemble.conductor_mut().set_energy(energy, smoothness);
        self.retune();
    }

    pub fn set_stress(&mut self, stress: f32, smoothness: f32) {
        self.ensemble.conductor_mut().set_stress(stress, smoothness);
        self.retune();
    }

    /// Change the base tempo; the conductor's multiplier still applies.
    pub fn set_tempo(&mut self, bpm: u32) -> Result<()> {
        let mut clock_config = self.config.clock_config();
        clock_config.tempo = bpm;
        clock_config.validate()?;

        self.config.tempo = bpm;
        self.retune();
        Ok(())
    }

    pub fn set_key(&mut self, key: f32) {
        self.config.fundamental_key = key;
        self.ensemble.conductor_mut().set_key(key);
    }

    // -------------------------------
    // MARK: Accessors
    // -------------------------------

    #[inline]
    pub fn config(&self) -> &MusicianConfig {
        &self.config
    }

    #[inline]
    pub fn clock_state(&self) -> &ClockState {
        self.clock.state()
    }

    /// Effective tempo, multiplier applied.
    #[inline]
    pub fn tempo(&self) -> u32 {
        self.clock.tempo()
    }

    #[inline]
    pub fn section(&self) -> SectionLabel {
        self.ensemble.section()
    }

    #[inline]
    pub fn conductor(&self) -> &Conductor {
        self.ensemble.conductor()
    }

    #[inline]
    pub fn ensemble(&self) -> &Ensemble {
        &self.ensemble
    }

    /// Sections that fit in `minutes` at the current tempo.
    #[inline]
    pub fn minutes_to_sections(&self, minutes: f64) -> usize {
        self.clock.minutes_to_sections(minutes)
    }
}
