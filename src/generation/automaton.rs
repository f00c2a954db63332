// src/generation/automaton.rs
//
// One-dimensional elementary cellular automaton.

/// Wrap-around row of binary cells updated by a Wolfram rule number.
///
/// The row starts with a single live cell in the middle.
#[derive(Debug, Clone)]
pub struct Automaton1D {
    cells: Vec<bool>,
    scratch: Vec<bool>,
    rule: u8,
}

impl Automaton1D {
    pub fn new(width: usize, rule: u8) -> Self {
        let mut cells = vec![false; width];
        if width > 0 {
            cells[width / 2] = true;
        }

        Self {
            scratch: vec![false; width],
            cells,
            rule,
        }
    }

    /// Advance one generation.
    pub fn step(&mut self) {
        let width = self.cells.len();
        if width == 0 {
            return;
        }

        for i in 0..width {
            let left = self.cells[(i + width - 1) % width] as u8;
            let centre = self.cells[i] as u8;
            let right = self.cells[(i + 1) % width] as u8;
            let pattern = (left << 2) | (centre << 1) | right;
            self.scratch[i] = (self.rule >> pattern) & 1 == 1;
        }

        std::mem::swap(&mut self.cells, &mut self.scratch);
    }

    /// State of cell `index`; out-of-range cells are dead.
    #[inline]
    pub fn is_alive(&self, index: usize) -> bool {
        self.cells.get(index).copied().unwrap_or(false)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.cells.len()
    }

    pub fn live_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_90_sierpinski_rows() {
        let mut ca = Automaton1D::new(9, 90);
        assert!(ca.is_alive(4));
        assert_eq!(ca.live_count(), 1);

        ca.step();
        assert!(ca.is_alive(3) && ca.is_alive(5));
        assert!(!ca.is_alive(4));

        ca.step();
        assert!(ca.is_alive(2) && ca.is_alive(6));
        assert_eq!(ca.live_count(), 2);

        ca.step();
        let row: Vec<bool> = (0..9).map(|i| ca.is_alive(i)).collect();
        assert_eq!(
            row,
            vec![false, true, false, true, false, true, false, true, false]
        );
    }

    #[test]
    fn test_out_of_range_is_dead() {
        let ca = Automaton1D::new(3, 90);
        assert!(!ca.is_alive(10));
        assert_eq!(ca.width(), 3);
    }
}
