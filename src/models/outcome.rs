/// Symbol written for a region where nothing is marked
pub const UNMARKED_SYMBOL: char = 'X';
/// Symbol written for a region with more than one mark
pub const AMBIGUOUS_SYMBOL: char = '*';

/// Classification of one region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetectionOutcome {
    /// No slot is filled
    Unmarked,
    /// Exactly one slot is filled; carries that slot's label
    Single(char),
    /// Two or more slots are filled
    Ambiguous,
}

impl DetectionOutcome {
    /// Build an outcome from the labels of all filled slots
    pub fn from_filled(filled: &[char]) -> Self {
        match filled {
            [] => DetectionOutcome::Unmarked,
            [label] => DetectionOutcome::Single(*label),
            _ => DetectionOutcome::Ambiguous,
        }
    }

    /// Character used in the output table
    pub fn symbol(&self) -> char {
        match self {
            DetectionOutcome::Unmarked => UNMARKED_SYMBOL,
            DetectionOutcome::Single(label) => *label,
            DetectionOutcome::Ambiguous => AMBIGUOUS_SYMBOL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_filled() {
        assert_eq!(DetectionOutcome::from_filled(&[]), DetectionOutcome::Unmarked);
        assert_eq!(DetectionOutcome::from_filled(&['C']), DetectionOutcome::Single('C'));
        assert_eq!(DetectionOutcome::from_filled(&['1', '7']), DetectionOutcome::Ambiguous);
    }

    #[test]
    fn test_symbols() {
        assert_eq!(DetectionOutcome::Unmarked.symbol(), 'X');
        assert_eq!(DetectionOutcome::Ambiguous.symbol(), '*');
        assert_eq!(DetectionOutcome::Single('4').symbol(), '4');
    }
}
