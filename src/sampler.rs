//! Extraction of `k` pairwise distinct indices from a message by rejection sampling.
//!
//! The message digest `H0` is cut into `k` fields of `log2(t)` bits. When two fields
//! collide, the digest is XORed with three fixed pads in turn, and if collisions remain a
//! counter is appended to `H0` and the result hashed again until the fields are
//! distinct. Only that counter travels with the signature: the verifier replays the
//! four fixed attempts and a single counter attempt.
use crate::bits::read_field;
use crate::common::{Blake2b256, DIGEST_SIZE};
use crate::errors::Error;
use crate::params::HorsParams;
use crate::traits::HashOracle;
use std::marker::PhantomData;
use tracing::debug;

/// Domain separation pads XORed, cumulatively, into the message digest. These values are
/// part of the protocol.
pub const PADS: [[u8; DIGEST_SIZE]; 3] = [
    [
        0x6b, 0x8f, 0x34, 0x1a, 0xdf, 0x21, 0x5e, 0xa3, 0x79, 0x2d, 0xe7, 0xc1, 0x5b, 0x6a, 0x1b,
        0x3f, 0x5c, 0xe0, 0x1d, 0x8b, 0x3d, 0xf2, 0x7e, 0x4a, 0xe8, 0xb1, 0x5d, 0x9c, 0x6f, 0x43,
        0x84, 0x2e,
    ],
    [
        0xab, 0xf9, 0x27, 0xcd, 0x12, 0xe3, 0x89, 0x45, 0xd8, 0x66, 0x97, 0xa4, 0xbc, 0x8d, 0x5e,
        0xf1, 0x4c, 0x32, 0x7a, 0x90, 0x8f, 0xb3, 0xd9, 0xe6, 0x1e, 0xac, 0x74, 0x91, 0x5b, 0xdf,
        0x2c, 0xe5,
    ],
    [
        0x59, 0x9f, 0x4b, 0x8a, 0x36, 0xf4, 0xa7, 0x28, 0x91, 0x6e, 0x2b, 0x5d, 0xc9, 0x72, 0xf2,
        0x13, 0x46, 0x8e, 0x93, 0xb4, 0xd7, 0x6a, 0xe1, 0x5f, 0x0b, 0xc4, 0x89, 0x71, 0x3d, 0x2a,
        0x94, 0xfc,
    ],
];

/// Indices extracted from a message together with the counter that made them distinct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    indices: Vec<u32>,
    ctr: u32,
}

impl Sample {
    /// Indices in extraction order, which is the order of the keys in a signature.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Counter to transmit. It is 0 whenever no counter attempt was needed.
    pub fn ctr(&self) -> u32 {
        self.ctr
    }

    /// Indices in ascending order.
    pub fn sorted(&self) -> Vec<u32> {
        let mut sorted = self.indices.clone();
        sorted.sort_unstable();
        sorted
    }
}

/// Turns messages into `k` distinct indices in `[0, t)`.
#[derive(Debug, Clone, Copy)]
pub struct IndexSampler<H: HashOracle = Blake2b256> {
    k: usize,
    log_t: u32,
    _hash: PhantomData<H>,
}

impl<H: HashOracle> IndexSampler<H> {
    /// Sampler for the given parameters.
    pub fn new(params: &HorsParams) -> Self {
        IndexSampler {
            k: params.k() as usize,
            log_t: params.log_t(),
            _hash: PhantomData,
        }
    }

    /// Discovery mode, used by the signer: search the first attempt giving distinct
    /// indices.
    ///
    /// # Errors
    /// `Error::SamplingFailure` if every `u32` counter fails, which does not happen in
    /// practice.
    pub fn discover(&self, message: &[u8]) -> Result<Sample, Error> {
        self.discover_within(message, u32::MAX)
    }

    /// Discovery bounded to the counters `0..=last_ctr`.
    pub(crate) fn discover_within(&self, message: &[u8], last_ctr: u32) -> Result<Sample, Error> {
        let h0 = H::digest(&[message]);
        if let Some(indices) = self.fixed_attempts(&h0) {
            return Ok(Sample { indices, ctr: 0 });
        }

        for ctr in 0..=last_ctr {
            if let Some(indices) = self.counter_attempt(&h0, ctr) {
                debug!(ctr, "indices distinct after counter search");
                return Ok(Sample { indices, ctr });
            }
        }
        Err(Error::SamplingFailure)
    }

    /// Replay mode, used by the verifier: the fixed attempts always run, then only the
    /// given counter is tried.
    ///
    /// # Errors
    /// `Error::MalformedSignature` if `ctr` does not give distinct indices.
    pub fn replay(&self, message: &[u8], ctr: u32) -> Result<Sample, Error> {
        let h0 = H::digest(&[message]);
        if let Some(indices) = self.fixed_attempts(&h0) {
            return Ok(Sample { indices, ctr });
        }

        self.counter_attempt(&h0, ctr)
            .map(|indices| Sample { indices, ctr })
            .ok_or(Error::MalformedSignature)
    }

    /// `H0`, then `H0 ^ P1`, `H0 ^ P1 ^ P2` and `H0 ^ P1 ^ P2 ^ P3`.
    fn fixed_attempts(&self, h0: &[u8; DIGEST_SIZE]) -> Option<Vec<u32>> {
        if let Some(indices) = self.extract(h0) {
            return Some(indices);
        }

        let mut buffer = *h0;
        for pad in PADS.iter() {
            for (b, p) in buffer.iter_mut().zip(pad.iter()) {
                *b ^= p;
            }
            if let Some(indices) = self.extract(&buffer) {
                return Some(indices);
            }
        }
        None
    }

    /// `H(H0 || ctr)`, the counter as 4 little-endian bytes.
    fn counter_attempt(&self, h0: &[u8; DIGEST_SIZE], ctr: u32) -> Option<Vec<u32>> {
        self.extract(&H::digest(&[h0, &ctr.to_le_bytes()]))
    }

    /// The `k` fields of `buffer`, if they are pairwise distinct.
    fn extract(&self, buffer: &[u8]) -> Option<Vec<u32>> {
        let indices: Vec<u32> = (0..self.k)
            .map(|i| read_field(buffer, i, self.log_t))
            .collect();

        let mut sorted = indices.clone();
        sorted.sort_unstable();
        if sorted.windows(2).any(|w| w[0] == w[1]) {
            return None;
        }
        Some(indices)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn sampler(t: u32, k: u32) -> IndexSampler {
        IndexSampler::new(&HorsParams::new(t, k, 256, 8, 4).unwrap())
    }

    #[test]
    fn digest_of_zero_seed() {
        let message = Blake2b256::digest(&[&[0u8; 32]]);
        let sample = sampler(16, 4).discover(&message).unwrap();
        assert_eq!(sample.indices(), &[4, 14, 8, 12]);
        assert_eq!(sample.ctr(), 0);
        assert_eq!(sample.sorted(), vec![4, 8, 12, 14]);
    }

    #[test]
    fn first_pad_resolves_collision() {
        // The plain digest of "message 0" collides for t = 16, k = 4.
        let sample = sampler(16, 4).discover(b"message 0").unwrap();
        assert_eq!(sample.indices(), &[1, 12, 15, 11]);
        assert_eq!(sample.ctr(), 0);
    }

    #[test]
    fn counter_search() {
        // Every fixed attempt and counter 0 collide for this message.
        let s = sampler(16, 4);
        let sample = s.discover(b"message 786").unwrap();
        assert_eq!(sample.indices(), &[9, 4, 8, 10]);
        assert_eq!(sample.ctr(), 1);

        assert_eq!(s.replay(b"message 786", 1).unwrap(), sample);
        assert_eq!(
            s.replay(b"message 786", 0),
            Err(Error::MalformedSignature)
        );
    }

    #[test]
    fn replay_ignores_counter_when_fixed_attempts_succeed() {
        // "message 0" is resolved by a pad. H(H0 || 3) alone would give [6, 5, 13, 3],
        // but the pads come first whatever the counter.
        let s = sampler(16, 4);
        assert_eq!(s.replay(b"message 0", 3).unwrap().indices(), &[1, 12, 15, 11]);
    }

    #[test]
    fn replay_with_wrong_counter() {
        // "message 4" needs the counter loop and stops at 0. Counter 1 also gives
        // distinct, but different, indices.
        let s = sampler(16, 4);
        let sample = s.discover(b"message 4").unwrap();
        assert_eq!(sample.indices(), &[2, 7, 14, 10]);
        assert_eq!(sample.ctr(), 0);
        assert_eq!(s.replay(b"message 4", 1).unwrap().indices(), &[1, 15, 13, 6]);
    }

    #[test]
    fn full_permutation_needs_long_search() {
        let s = sampler(8, 8);
        assert_eq!(
            s.discover_within(b"tilin", 3),
            Err(Error::SamplingFailure)
        );
        let sample = s.discover(b"tilin").unwrap();
        assert_eq!(sample.ctr(), 1231);
        assert_eq!(sample.indices(), &[3, 1, 6, 0, 2, 7, 4, 5]);
    }

    #[quickcheck]
    fn discovered_indices_are_distinct_and_in_range(message: Vec<u8>) -> bool {
        let s = sampler(1024, 16);
        let sample = s.discover(&message).unwrap();
        let sorted = sample.sorted();
        sample.indices().len() == 16
            && sorted.windows(2).all(|w| w[0] < w[1])
            && sorted.iter().all(|&i| i < 1024)
    }

    #[quickcheck]
    fn replay_agrees_with_discovery(message: Vec<u8>) -> bool {
        let s = sampler(16, 4);
        let sample = s.discover(&message).unwrap();
        s.replay(&message, sample.ctr()) == Ok(sample)
    }
}
