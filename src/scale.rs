// src/scale.rs
//
// Scale-degree to semitone mapping.
//
// A scale is a named interval pattern rotated by a modal offset. Degree
// indices are floats: integral indices land on scale tones, fractional
// ones interpolate linearly between the two neighbouring tones so the
// conductor can morph pitch contours continuously.

/// Semitones per octave.
pub const OCTAVE: f32 = 12.0;

/// Number of degrees in every supported (diatonic) scale.
pub const SCALE_LENGTH: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScaleType {
    Major,
    HarmonicMinor,
    NaturalMinor,
}

impl ScaleType {
    /// Semitone offsets of the unrotated scale from its root.
    pub fn intervals(self) -> [f32; SCALE_LENGTH] {
        match self {
            ScaleType::Major => [0.0, 2.0, 4.0, 5.0, 7.0, 9.0, 11.0],
            ScaleType::HarmonicMinor => [0.0, 2.0, 3.0, 5.0, 7.0, 8.0, 11.0],
            ScaleType::NaturalMinor => [0.0, 2.0, 3.0, 5.0, 7.0, 8.0, 10.0],
        }
    }
}

/// Modal rotation applied to a scale pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModeType {
    #[default]
    Ionian,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Aeolian,
    Locrian,
}

impl ModeType {
    /// Number of positions the scale table is rotated by.
    #[inline]
    pub fn rotation(self) -> usize {
        match self {
            ModeType::Ionian => 0,
            ModeType::Dorian => 1,
            ModeType::Phrygian => 2,
            ModeType::Lydian => 3,
            ModeType::Mixolydian => 4,
            ModeType::Aeolian => 5,
            ModeType::Locrian => 6,
        }
    }
}

/// Rotated semitone table for the active scale.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleModel {
    scale_type: ScaleType,
    mode: ModeType,
    table: [f32; SCALE_LENGTH],
}

impl Default for ScaleModel {
    fn default() -> Self {
        Self::new(ScaleType::Major, ModeType::Ionian)
    }
}

impl ScaleModel {
    pub fn new(scale_type: ScaleType, mode: ModeType) -> Self {
        let mut model = Self {
            scale_type,
            mode,
            table: [0.0; SCALE_LENGTH],
        };
        model.set_scale(scale_type, mode);
        model
    }

    /// Rebuild the table for `scale_type` rotated by `mode`.
    ///
    /// Entries that wrap past the end of the pattern are lifted an octave,
    /// so the table stays ascending.
    pub fn set_scale(&mut self, scale_type: ScaleType, mode: ModeType) {
        let pattern = scale_type.intervals();
        let rotation = mode.rotation();

        for (i, entry) in self.table.iter_mut().enumerate() {
            let source = i + rotation;
            *entry = pattern[source % SCALE_LENGTH] + (source / SCALE_LENGTH) as f32 * OCTAVE;
        }

        self.scale_type = scale_type;
        self.mode = mode;
    }

    /// Semitone offset of a (possibly fractional) scale degree.
    pub fn degree_to_offset(&self, index: f32) -> f32 {
        let length = SCALE_LENGTH as f32;

        let octaves = (index / length).floor();
        let position = index - octaves * length;
        let degree = (position.floor() as usize).min(SCALE_LENGTH - 1);
        let fraction = position - degree as f32;

        let mut offset = self.table[degree] + octaves * OCTAVE;
        if fraction > 0.0 {
            let next_degree = degree + 1;
            let next = self.table[next_degree % SCALE_LENGTH]
                + (next_degree / SCALE_LENGTH) as f32 * OCTAVE;
            offset += fraction * (next - self.table[degree]);
        }
        offset
    }

    #[inline]
    pub fn len(&self) -> usize {
        SCALE_LENGTH
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    #[inline]
    pub fn scale_type(&self) -> ScaleType {
        self.scale_type
    }

    #[inline]
    pub fn mode(&self) -> ModeType {
        self.mode
    }

    #[inline]
    pub fn table(&self) -> &[f32; SCALE_LENGTH] {
        &self.table
    }
}
