use serde::{Deserialize, Serialize};

use super::{TrieError, MAX_NGRAM};

/// Raw occurrence count of a phrase together with its n-gram order (word count).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseCount {
    pub count: u64,
    pub ngram: usize,
}

impl PhraseCount {
    pub fn new(count: u64, ngram: usize) -> Self {
        Self { count, ngram }
    }

    /// Counter one occurrence later. The n-gram order is carried over untouched.
    pub fn incremented(self) -> Self {
        Self {
            count: self.count.saturating_add(1),
            ngram: self.ngram,
        }
    }

    /// Validate the n-gram order against the trie's max order and return it.
    pub fn order(&self, max: usize) -> Result<usize, TrieError> {
        if self.ngram == 0 || self.ngram > max {
            return Err(TrieError::MalformedCounter {
                ngram: self.ngram,
                max,
            });
        }
        Ok(self.ngram)
    }

    /// Legacy single-number encoding: whole part is the count, the tenths digit
    /// is the n-gram order. `7.2` is count 7 of a bigram. The trie never stores
    /// this form; it exists to exchange counters with tools that keep them as
    /// one number.
    pub fn pack(&self) -> f64 {
        self.count as f64 + self.ngram as f64 / 10.0
    }

    /// Decode a legacy packed counter. Inverse of [`PhraseCount::pack`].
    pub fn unpack(value: f64) -> Result<Self, TrieError> {
        if !value.is_finite() || value < 0.0 {
            return Err(TrieError::MalformedCounter { ngram: 0, max: MAX_NGRAM });
        }

        let whole = value.floor();
        let ngram = ((value - whole) * 10.0).round() as usize;
        if ngram == 0 || ngram > MAX_NGRAM {
            return Err(TrieError::MalformedCounter {
                ngram,
                max: MAX_NGRAM,
            });
        }

        Ok(Self {
            count: whole as u64,
            ngram,
        })
    }
}

/// A phrase stored on the node of its first term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phrase {
    pub counter: PhraseCount,

    /// Count divided by the per-order log average frequency. Set by phrase
    /// normalization.
    pub normalized: Option<f64>,
}

impl Phrase {
    pub fn new(counter: PhraseCount) -> Self {
        Self {
            counter,
            normalized: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increment_keeps_order() {
        let mut c = PhraseCount::new(0, 3);
        for _ in 0..1000 {
            c = c.incremented();
        }
        assert_eq!(c, PhraseCount::new(1000, 3));
    }

    #[test]
    fn pack_unpack() {
        for ngram in 1..=MAX_NGRAM {
            let mut c = PhraseCount::new(0, ngram);
            for _ in 0..25 {
                c = c.incremented();
                assert_eq!(PhraseCount::unpack(c.pack()).unwrap(), c);
            }
        }

        assert_eq!(PhraseCount::unpack(7.2).unwrap(), PhraseCount::new(7, 2));
    }

    #[test]
    fn unpack_rejects_missing_order() {
        assert!(matches!(
            PhraseCount::unpack(7.0),
            Err(TrieError::MalformedCounter { ngram: 0, .. })
        ));
        assert!(PhraseCount::unpack(f64::NAN).is_err());
        assert!(PhraseCount::unpack(-1.1).is_err());
    }

    #[test]
    fn order_is_bounded() {
        assert_eq!(PhraseCount::new(4, 2).order(3).unwrap(), 2);
        assert!(PhraseCount::new(4, 4).order(3).is_err());
        assert!(PhraseCount::new(4, 0).order(3).is_err());
    }
}
