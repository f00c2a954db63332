//! Thread-safe bridge between control code and the musician.
//!
//! A host usually renders audio on one thread and changes the mood or
//! tempo from another (UI, game logic). This module carries those
//! changes across without locks.
//!
//! # Architecture
//!
//! - **Control side** owns any number of [`ControlHandle`] clones
//! - **Audio side** owns the [`Musician`](crate::Musician), which drains
//!   pending [`Control`] commands at the start of every block
//! - Commands travel over an MPSC channel; position and voice counts come
//!   back through atomics
//!
//! # Usage
//!
//! ```ignore
//! let handle = musician.control_handle();
//!
//! // Control thread
//! handle.set_mood(Mood::Sad, 4.0);
//!
//! // Audio thread
//! musician.process_block(&mut buffer, 2);
//!
//! // Control thread again
//! let position = handle.readback();
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicI64, AtomicU32, AtomicU64, Ordering},
    mpsc::{self, Receiver, Sender},
};

use crate::conductor::Mood;

/// A change requested from outside the audio thread.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Control {
    SetMood { mood: Mood, smoothness: f32 },
    SetMoodValues { energy: f32, stress: f32, smoothness: f32 },
    SetEnergy { energy: f32, smoothness: f32 },
    SetStress { stress: f32, smoothness: f32 },

    /// Base tempo, before the conductor's multiplier
    SetTempo { bpm: u32 },
    SetKey { key: f32 },

    Play,
    Pause,
    Stop,
}

/// Snapshot of the musician's state as last published by the audio thread.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Readback {
    pub section: i64,
    pub bar: i64,
    pub beat: i64,

    /// Effective tempo, multiplier applied
    pub tempo: u32,

    pub energy: f32,
    pub stress: f32,

    pub active_voices: usize,
    pub playing: bool,
}

/// Lock-free shared state for musician -> control readback.
///
/// Floats are stored as their bit patterns (no atomic floats in std).
#[derive(Debug)]
pub(crate) struct SharedReadback {
    section: AtomicI64,
    bar: AtomicI64,
    beat: AtomicI64,
    tempo: AtomicU32,
    energy_bits: AtomicU32,
    stress_bits: AtomicU32,
    active_voices: AtomicU64,
    playing: AtomicBool,
}

impl SharedReadback {
    fn new() -> Self {
        Self {
            section: AtomicI64::new(-1),
            bar: AtomicI64::new(-1),
            beat: AtomicI64::new(-1),
            tempo: AtomicU32::new(0),
            energy_bits: AtomicU32::new(0.0_f32.to_bits()),
            stress_bits: AtomicU32::new(0.0_f32.to_bits()),
            active_voices: AtomicU64::new(0),
            playing: AtomicBool::new(false),
        }
    }

    /// Called once per block by the audio thread.
    pub(crate) fn publish(&self, readback: &Readback) {
        self.section.store(readback.section, Ordering::Relaxed);
        self.bar.store(readback.bar, Ordering::Relaxed);
        self.beat.store(readback.beat, Ordering::Relaxed);
        self.tempo.store(readback.tempo, Ordering::Relaxed);
        self.energy_bits
            .store(readback.energy.to_bits(), Ordering::Relaxed);
        self.stress_bits
            .store(readback.stress.to_bits(), Ordering::Relaxed);
        self.active_voices
            .store(readback.active_voices as u64, Ordering::Relaxed);
        self.playing.store(readback.playing, Ordering::Relaxed);
    }

    fn load(&self) -> Readback {
        Readback {
            section: self.section.load(Ordering::Relaxed),
            bar: self.bar.load(Ordering::Relaxed),
            beat: self.beat.load(Ordering::Relaxed),
            tempo: self.tempo.load(Ordering::Relaxed),
            energy: f32::from_bits(self.energy_bits.load(Ordering::Relaxed)),
            stress: f32::from_bits(self.stress_bits.load(Ordering::Relaxed)),
            active_voices: self.active_voices.load(Ordering::Relaxed) as usize,
            playing: self.playing.load(Ordering::Relaxed),
        }
    }
}

/// Create a linked handle / receiver pair.
///
/// The receiver and readback go to the musician; the handle is cloned
/// out to whoever needs to steer it.
pub(crate) fn create_bridge() -> (ControlHandle, Receiver<Control>, Arc<SharedReadback>) {
    let (control_tx, control_rx) = mpsc::channel();
    let readback = Arc::new(SharedReadback::new());

    let handle = ControlHandle {
        control_tx,
        readback: Arc::clone(&readback),
    };

    (handle, control_rx, readback)
}

// ═══════════════════════════════════════════════════════════════════
// ControlHandle - control thread API
// ═══════════════════════════════════════════════════════════════════

/// Cloneable, `Send` handle for steering a musician from another thread.
#[derive(Debug, Clone)]
pub struct ControlHandle {
    control_tx: Sender<Control>,
    readback: Arc<SharedReadback>,
}

impl ControlHandle {
    /// Queue a command for the next audio block.
    ///
    /// Returns false if the musician no longer exists.
    pub fn send(&self, control: Control) -> bool {
        match self.control_tx.send(control) {
            Ok(()) => true,
            Err(mpsc::SendError(control)) => {
                log::warn!("Dropped {:?}: musician is gone", control);
                false
            }
        }
    }

    /// Latest state published by the audio thread.
    pub fn readback(&self) -> Readback {
        self.readback.load()
    }

    // ───────────────────────────────────────────────────────────────
    // Convenience methods
    // ───────────────────────────────────────────────────────────────

    pub fn set_mood(&self, mood: Mood, smoothness: f32) -> bool {
        self.send(Control::SetMood { mood, smoothness })
    }

    pub fn set_mood_values(&self, energy: f32, stress: f32, smoothness: f32) -> bool {
        self.send(Control::SetMoodValues {
            energy,
            stress,
            smoothness,
        })
    }

    pub fn set_energy(&self, energy: f32, smoothness: f32) -> bool {
        self.send(Control::SetEnergy { energy, smoothness })
    }

    pub fn set_stress(&self, stress: f32, smoothness: f32) -> bool {
        self.send(Control::SetStress { stress, smoothness })
    }

    pub fn set_tempo(&self, bpm: u32) -> bool {
        self.send(Control::SetTempo { bpm })
    }

    pub fn set_key(&self, key: f32) -> bool {
        self.send(Control::SetKey { key })
    }

    pub fn play(&self) -> bool {
        self.send(Control::Play)
    }

    pub fn pause(&self) -> bool {
        self.send(Control::Pause)
    }

    pub fn stop(&self) -> bool {
        self.send(Control::Stop)
    }
}
