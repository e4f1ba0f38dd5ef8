use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// How a class index is turned into the target vector of the output layer.
///
/// - `OneHot`: one output per class, the class's own slot set to 1.
/// - `Binary`: `ceil(log2(class_count))` outputs holding the index in
///   binary, most significant bit first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    #[default]
    OneHot,
    Binary,
}

impl Encoding {
    pub const ALL: [Encoding; 2] = [Encoding::OneHot, Encoding::Binary];

    pub fn name(&self) -> &'static str {
        match self {
            Encoding::OneHot => "one_hot",
            Encoding::Binary => "binary",
        }
    }

    /// Length of the encoded vector, i.e. the required output-layer width.
    pub fn width(&self, class_count: usize) -> usize {
        match self {
            Encoding::OneHot => class_count,
            Encoding::Binary => bits_needed(class_count),
        }
    }

    /// Target vector of class `index` among `class_count` classes.
    pub fn encode(&self, index: usize, class_count: usize) -> Vec<f64> {
        let width = self.width(class_count);
        let mut vector = vec![0.0; width];
        match self {
            Encoding::OneHot => {
                if index < width {
                    vector[index] = 1.0;
                }
            }
            Encoding::Binary => {
                for bit in 0..width {
                    if (index >> bit) & 1 == 1 {
                        vector[width - 1 - bit] = 1.0;
                    }
                }
            }
        }
        vector
    }
}

/// `ceil(log2(n))`, with 0 for `n <= 1`.
fn bits_needed(n: usize) -> usize {
    if n <= 1 {
        0
    } else {
        (usize::BITS - (n - 1).leading_zeros()) as usize
    }
}

impl FromStr for Encoding {
    type Err = OcrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Encoding::ALL
            .into_iter()
            .find(|encoding| encoding.name() == s)
            .ok_or_else(|| OcrError::UnknownEncoding(s.to_owned()))
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_needed_is_ceil_log2() {
        let expected = [(1, 0), (2, 1), (3, 2), (4, 2), (5, 3), (8, 3), (9, 4), (16, 4), (17, 5)];
        for (n, bits) in expected {
            assert_eq!(bits_needed(n), bits, "n = {n}");
        }
    }

    #[test]
    fn binary_is_msb_first() {
        assert_eq!(Encoding::Binary.encode(1, 4), vec![0.0, 1.0]);
        assert_eq!(Encoding::Binary.encode(2, 4), vec![1.0, 0.0]);
        assert_eq!(Encoding::Binary.encode(6, 8), vec![1.0, 1.0, 0.0]);
    }

    #[test]
    fn names_round_trip() {
        for encoding in Encoding::ALL {
            assert_eq!(encoding.name().parse::<Encoding>().unwrap(), encoding);
        }
        assert!(matches!("gray".parse::<Encoding>(), Err(OcrError::UnknownEncoding(_))));
    }
}
