use std::fmt;

use crate::shared::error::SendError;
use crate::shared::frame::Frame;

/// 64-bit perceptual hash of an image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Fingerprint(pub u64);

impl Fingerprint {
    /// Hamming distance: the number of differing bits.
    pub fn distance(&self, other: &Fingerprint) -> u32 {
        (self.0 ^ other.0).count_ones()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Domain interface for perceptual fingerprinting.
///
/// Called from rayon workers, hence `Sync` and a thread-safe error type.
pub trait Fingerprinter: Send + Sync {
    fn fingerprint(&self, frame: &Frame) -> Result<Fingerprint, SendError>;
}
