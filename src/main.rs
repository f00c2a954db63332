// src/main.rs
//
// Offline demo: renders a few minutes of music into memory while a
// second thread changes the mood.

use std::f32::consts::TAU;
use std::thread;
use std::time::Duration;

use moodsynth::{
    GeneratorRegistry, Mood, Musician, MusicianConfig, PolyphonicInstrument, Voice, generator_names,
    pitch_to_frequency, register_standard_generators,
};

/// ===============================
/// Demo voice
/// ===============================

/// Sine with a linear attack and release.
struct PluckVoice {
    phase: f32,
    freq: f32,
    level: f32,
    target: f32,
    step: f32,
    sample_rate: f32,
}

impl PluckVoice {
    const ATTACK: f32 = 0.005;
    const RELEASE: f32 = 0.2;

    fn new() -> Self {
        Self {
            phase: 0.0,
            freq: 440.0,
            level: 0.0,
            target: 0.0,
            step: 0.0,
            sample_rate: 48_000.0,
        }
    }

    fn ramp_to(&mut self, target: f32, seconds: f32) {
        self.target = target;
        self.step = (target - self.level).abs() / (seconds * self.sample_rate).max(1.0);
    }
}

impl Voice for PluckVoice {
    fn prepare(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate as f32;
    }

    fn set_pitch(&mut self, pitch: f32) {
        self.freq = pitch_to_frequency(pitch);
    }

    fn start(&mut self, velocity: f32) {
        self.ramp_to(velocity * 0.2, Self::ATTACK);
    }

    fn release(&mut self) {
        self.ramp_to(0.0, Self::RELEASE);
    }

    fn stop(&mut self) {
        self.level = 0.0;
        self.target = 0.0;
    }

    fn is_free(&self) -> bool {
        self.level == 0.0 && self.target == 0.0
    }

    fn next_sample(&mut self) -> f32 {
        if self.level < self.target {
            self.level = (self.level + self.step).min(self.target);
        } else if self.level > self.target {
            self.level = (self.level - self.step).max(self.target);
        }

        let sample = (self.phase * TAU).sin() * self.level;
        self.phase = (self.phase + self.freq / self.sample_rate).fract();
        sample
    }
}

/// ===============================
/// Main
/// ===============================

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let config = MusicianConfig::new().with_seed(7);
    let sample_rate = config.sample_rate;
    let block_frames = 512;
    let channels = 2;

    // --------------------------------
    // Generators + musician
    // --------------------------------

    let mut registry = GeneratorRegistry::new();
    register_standard_generators(&mut registry);

    let mut musician = Musician::new(config, &registry, generator_names::POP, generator_names::SIMPLE)?;

    for (name, line, voices) in [
        ("lead", generator_names::AUTOMATON, 8),
        ("arp", generator_names::ARPEGGIO, 6),
    ] {
        let mut instrument = PolyphonicInstrument::with_voices(voices, |_| PluckVoice::new())?;
        instrument.prepare(sample_rate);
        instrument.set_volume(0.5);
        musician.add_registered_performer(name, Box::new(instrument), &registry, line)?;
    }

    let sections = musician.minutes_to_sections(2.0);
    log::info!("Rendering about {} sections", sections);

    // --------------------------------
    // Control thread
    // --------------------------------

    let handle = musician.control_handle();
    let controller = thread::spawn(move || {
        for mood in [Mood::Happy, Mood::Exciting, Mood::Sad, Mood::Tender] {
            thread::sleep(Duration::from_millis(50));
            handle.set_mood(mood, 2.0);
            let position = handle.readback();
            log::info!(
                "-> {:?} at section {} bar {} ({} BPM, {} voices)",
                mood,
                position.section,
                position.bar,
                position.tempo,
                position.active_voices
            );
        }
    });

    // --------------------------------
    // Render
    // --------------------------------

    let mut block = vec![0.0_f32; block_frames * channels];
    let block_seconds = block_frames as f32 / sample_rate as f32;
    let total_blocks = (120.0 / block_seconds) as usize;

    let mut peak = 0.0_f32;
    musician.play();

    for index in 0..total_blocks {
        musician.update(block_seconds);
        musician.process_block(&mut block, channels);
        peak = block.iter().fold(peak, |p, s| p.max(s.abs()));

        // Give the control thread a chance to interleave.
        if index % 256 == 0 {
            thread::sleep(Duration::from_millis(10));
        }
    }

    musician.stop();
    if controller.join().is_err() {
        log::error!("Control thread panicked");
    }

    log::info!(
        "Rendered {} blocks, peak {:.3}, final mood ({:.2}, {:.2})",
        total_blocks,
        peak,
        musician.conductor().energy(),
        musician.conductor().stress()
    );
    Ok(())
}
