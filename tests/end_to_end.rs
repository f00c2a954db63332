// tests/end_to_end.rs
//
// Drives a full musician through several sections with recording
// instruments in place of audio.

use std::sync::{Arc, Mutex};
use std::thread;

use moodsynth::{
    GeneratorRegistry, Instrument, Mood, Musician, MusicianConfig, Note, SectionLabel,
    generator_names, register_standard_generators,
};

type Log = Arc<Mutex<Vec<Note>>>;

struct Recorder {
    log: Log,
}

impl Instrument for Recorder {
    fn note_on(&mut self, pitch: f32, velocity: f32) {
        self.log.lock().unwrap().push(Note::On { pitch, velocity });
    }

    fn note_off(&mut self, pitch: f32) {
        self.log.lock().unwrap().push(Note::Off { pitch });
    }

    fn stop_all(&mut self) {}

    fn process_block(&mut self, _output: &mut [f32], _channels: usize) {}
}

// 10 samples per pulse, 32 pulses per bar, 4 bars per section:
// one section is 1280 samples, or 20 blocks of 64.
const BLOCK: usize = 64;
const BLOCKS_PER_SECTION: usize = 20;

fn registry() -> GeneratorRegistry {
    let mut registry = GeneratorRegistry::new();
    register_standard_generators(&mut registry);
    registry
}

fn musician(config: MusicianConfig) -> (Musician, Log, Log) {
    let registry = registry();
    let mut musician = Musician::new(
        config.with_sample_rate(160.0),
        &registry,
        generator_names::POP,
        generator_names::SIMPLE,
    )
    .unwrap();

    let lead: Log = Arc::default();
    let arp: Log = Arc::default();
    musician
        .add_registered_performer(
            "lead",
            Box::new(Recorder { log: lead.clone() }),
            &registry,
            generator_names::AUTOMATON,
        )
        .unwrap();
    musician
        .add_registered_performer(
            "arp",
            Box::new(Recorder { log: arp.clone() }),
            &registry,
            generator_names::ARPEGGIO,
        )
        .unwrap();

    (musician, lead, arp)
}

fn run(musician: &mut Musician, blocks: usize) {
    let mut block = vec![0.0; BLOCK];
    for _ in 0..blocks {
        musician.process_block(&mut block, 1);
    }
}

fn note_ons(log: &Log) -> usize {
    log.lock().unwrap().iter().filter(|n| n.is_note_on()).count()
}

#[test]
fn test_form_unfolds_section_by_section() {
    let (mut musician, _, _) = musician(MusicianConfig::new());
    let mut block = vec![0.0; BLOCK];
    let mut sections: Vec<SectionLabel> = Vec::new();

    musician.play();
    for _ in 0..BLOCKS_PER_SECTION * 6 {
        musician.process_block(&mut block, 1);
        if sections.last() != Some(&musician.section()) {
            sections.push(musician.section());
        }
    }

    assert_eq!(
        sections,
        vec![
            SectionLabel::Intro,
            SectionLabel::Verse,
            SectionLabel::PreChorus,
            SectionLabel::Chorus,
            SectionLabel::Verse,
            SectionLabel::PreChorus,
        ]
    );
    assert_eq!(musician.control_handle().readback().section, 5);
}

#[test]
fn test_every_note_is_released_before_silence() {
    let (mut musician, lead, arp) = musician(MusicianConfig::new().with_sequence(2, false));
    musician.set_mood(Mood::Tender, 0.0);
    musician.play();

    run(&mut musician, BLOCKS_PER_SECTION * 2);
    let lead_ons = note_ons(&lead);
    let arp_ons = note_ons(&arp);
    // Five arpeggio notes per bar, eight bars.
    assert_eq!(arp_ons, 40);
    assert!(lead_ons > 0);

    run(&mut musician, BLOCKS_PER_SECTION * 2);
    assert_eq!(musician.section(), SectionLabel::End);
    assert_eq!(note_ons(&lead), lead_ons);
    assert_eq!(note_ons(&arp), arp_ons);

    for log in [&lead, &arp] {
        let log = log.lock().unwrap();
        let mut held: Vec<f32> = Vec::new();
        for note in log.iter() {
            match *note {
                Note::On { pitch, .. } => held.push(pitch),
                Note::Off { pitch } => {
                    let index = held.iter().position(|&p| p == pitch).unwrap();
                    held.swap_remove(index);
                }
            }
        }
        assert!(held.is_empty());
    }
}

#[test]
fn test_same_seed_same_performance() {
    let config = MusicianConfig::new().with_seed(11);
    let (mut a, lead_a, arp_a) = musician(config.clone());
    let (mut b, lead_b, arp_b) = musician(config);

    for musician in [&mut a, &mut b] {
        musician.set_mood(Mood::Angry, 0.0);
        musician.play();
        run(musician, BLOCKS_PER_SECTION * 3);
    }

    assert!(!arp_a.lock().unwrap().is_empty());
    assert_eq!(*lead_a.lock().unwrap(), *lead_b.lock().unwrap());
    assert_eq!(*arp_a.lock().unwrap(), *arp_b.lock().unwrap());
}

#[test]
fn test_mood_changes_from_another_thread() {
    let (mut musician, _, arp) = musician(MusicianConfig::new());
    let handle = musician.control_handle();

    thread::spawn(move || {
        handle.set_mood(Mood::Exciting, 0.0);
        handle.set_key(48.0);
        handle.play();
    })
    .join()
    .unwrap();

    run(&mut musician, 1);
    assert!(musician.is_playing());
    assert_eq!(musician.tempo(), 138);
    assert_eq!(musician.conductor().key(), 48.0);

    // Intro on harmonic 1 in C major from the new key: D below middle C.
    let first = arp.lock().unwrap()[0];
    assert_eq!(first.pitch(), 50.0);

    let readback = musician.control_handle().readback();
    assert!(readback.playing);
    assert_eq!(readback.energy, 1.0);
}
