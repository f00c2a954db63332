// src/error.rs
//
// Crate-wide error type.
//
// Errors only come out of configuration and construction calls.
// Per-tick paths (clock advance, note dispatch) log and degrade instead.

/// Result alias carrying the crate [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Tempo must be a positive number of beats per minute.
    #[error("tempo must be positive, got {tempo}")]
    InvalidTempo { tempo: u32 },

    /// One of the structural ratios (pulses, beats, bars) is zero.
    #[error("{field} must be positive, got {value}")]
    InvalidStructure { field: &'static str, value: usize },

    #[error("sample rate must be positive and finite, got {sample_rate}")]
    InvalidSampleRate { sample_rate: f64 },

    /// Macro sequences need at least one slot.
    #[error("section sequence length must be positive")]
    EmptySequence,

    #[error("instrument needs at least one voice")]
    InvalidVoiceCount,

    #[error("bar {bar} is outside the progression (length {length})")]
    BarOutOfRange { bar: usize, length: usize },

    /// The sequence generator left the requested slot unresolved.
    #[error("section {index} is still unresolved after generation")]
    UnresolvedSection { index: usize },

    #[error("no {kind} generator registered under '{name}'")]
    UnknownGenerator { kind: &'static str, name: String },
}
