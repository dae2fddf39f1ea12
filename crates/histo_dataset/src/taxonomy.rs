//! Diagnostic label taxonomy.
//!
//! Five histological diagnosis codes with a fixed order; the order defines
//! the numeric encoding handed to a classifier. Merge mode collapses the
//! five-code taxonomy to three by folding `A` and `O` into `G`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Diagnosis {
    L,
    M,
    G,
    A,
    O,
}

impl Diagnosis {
    /// Declaration order; defines the encode/decode bijection.
    pub const ALL: [Diagnosis; 5] = [
        Diagnosis::L,
        Diagnosis::M,
        Diagnosis::G,
        Diagnosis::A,
        Diagnosis::O,
    ];

    /// Numeric encoding, `0..5` in declaration order.
    pub fn index(self) -> usize {
        match self {
            Diagnosis::L => 0,
            Diagnosis::M => 1,
            Diagnosis::G => 2,
            Diagnosis::A => 3,
            Diagnosis::O => 4,
        }
    }

    pub fn from_index(index: usize) -> Option<Diagnosis> {
        Diagnosis::ALL.get(index).copied()
    }

    pub fn code(self) -> &'static str {
        match self {
            Diagnosis::L => "L",
            Diagnosis::M => "M",
            Diagnosis::G => "G",
            Diagnosis::A => "A",
            Diagnosis::O => "O",
        }
    }

    pub fn from_code(code: &str) -> Option<Diagnosis> {
        Diagnosis::ALL.iter().copied().find(|d| d.code() == code)
    }

    /// Merge-mode collapse: `A` and `O` fold into `G`; idempotent, with
    /// image exactly `{L, M, G}`.
    pub fn collapse(self) -> Diagnosis {
        match self {
            Diagnosis::A | Diagnosis::O => Diagnosis::G,
            other => other,
        }
    }
}

/// Class count exposed to model construction: 3 under merge mode, else 5.
pub fn num_classes(merge: bool) -> usize {
    if merge {
        3
    } else {
        Diagnosis::ALL.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trip() {
        for (i, diag) in Diagnosis::ALL.iter().enumerate() {
            assert_eq!(diag.index(), i);
            assert_eq!(Diagnosis::from_index(i), Some(*diag));
            assert_eq!(Diagnosis::from_code(diag.code()), Some(*diag));
        }
        assert_eq!(Diagnosis::from_index(5), None);
        assert_eq!(Diagnosis::from_code("X"), None);
    }

    #[test]
    fn collapse_is_idempotent_with_three_code_image() {
        let mut image = std::collections::BTreeSet::new();
        for diag in Diagnosis::ALL {
            let collapsed = diag.collapse();
            assert_eq!(collapsed.collapse(), collapsed);
            image.insert(collapsed);
        }
        let expected: std::collections::BTreeSet<_> =
            [Diagnosis::L, Diagnosis::M, Diagnosis::G].into_iter().collect();
        assert_eq!(image, expected);
    }

    #[test]
    fn class_counts() {
        assert_eq!(num_classes(false), 5);
        assert_eq!(num_classes(true), 3);
    }
}
