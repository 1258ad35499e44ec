//! Signing side of MUM-HORS.
//!
//! The signer keeps nothing secret but the seed. For each message it extracts `k`
//! distinct indices, reads them as ranks among the slots its bitmap still marks as
//! available, derives the private keys of those slots and reveals them.
use crate::bitmap::SlotBitmap;
use crate::common::{Blake2b256, PrivateKey, Seed, PRIVATE_KEY_SIZE};
use crate::errors::Error;
use crate::mirror::PublicKeyMatrix;
use crate::params::HorsParams;
use crate::sampler::IndexSampler;
use crate::traits::{HashOracle, WindowReport};
use tracing::{debug, warn};

#[cfg(feature = "serde_enabled")]
use serde::{Deserialize, Serialize};

/// A MUM-HORS signature: the rejection sampling counter and the `k` revealed private
/// keys, in extraction order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub struct Signature {
    pub(crate) ctr: u32,
    pub(crate) keys: Vec<PrivateKey>,
}

impl Signature {
    /// Size of the counter prefix of the wire form.
    pub const CTR_SIZE: usize = 4;

    /// Byte size of a signature carrying `k` keys.
    pub fn size(k: usize) -> usize {
        Self::CTR_SIZE + k * PRIVATE_KEY_SIZE
    }

    /// Rejection sampling counter.
    pub fn ctr(&self) -> u32 {
        self.ctr
    }

    /// Revealed private keys.
    pub fn keys(&self) -> &[PrivateKey] {
        &self.keys
    }

    /// Convert a slice of bytes into a signature of `k` keys.
    ///
    /// # Errors
    /// `Error::InvalidSignatureSize` if `bytes.len()` is not `4 + 32 * k`.
    pub fn from_bytes(bytes: &[u8], k: usize) -> Result<Self, Error> {
        if bytes.len() != Self::size(k) {
            return Err(Error::InvalidSignatureSize(bytes.len()));
        }

        let mut ctr = [0u8; Self::CTR_SIZE];
        ctr.copy_from_slice(&bytes[..Self::CTR_SIZE]);
        let keys = bytes[Self::CTR_SIZE..]
            .chunks(PRIVATE_KEY_SIZE)
            .map(PrivateKey::from_bytes)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Signature {
            ctr: u32::from_be_bytes(ctr),
            keys,
        })
    }

    /// Convert `Self` into its byte representation:
    /// ( ctr as 4 big-endian bytes || key_0 || ... || key_{k-1} )
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(Self::size(self.keys.len()));
        data.extend_from_slice(&self.ctr.to_be_bytes());
        for key in self.keys.iter() {
            data.extend_from_slice(key.as_bytes());
        }
        data
    }
}

/// Stateful MUM-HORS signer.
///
/// `sign` takes `&mut self`: a signer must never be driven by two callers at once, or
/// the same slot could be revealed twice.
#[derive(Debug)]
pub struct Signer<H: HashOracle = Blake2b256> {
    seed: Seed,
    params: HorsParams,
    sampler: IndexSampler<H>,
    bitmap: SlotBitmap,
    exhausted: bool,
}

impl Signer<Blake2b256> {
    /// Build a signer and the public key matrix the matching verifier needs.
    pub fn keygen(seed: Seed, params: HorsParams) -> (Self, PublicKeyMatrix) {
        let matrix = PublicKeyMatrix::from_seed(&seed, &params);
        (Self::new(seed, params), matrix)
    }
}

impl<H: HashOracle> Signer<H> {
    /// Signer over the key space of `seed`, with rows `0..rt` in the window.
    pub fn new(seed: Seed, params: HorsParams) -> Self {
        Signer {
            sampler: IndexSampler::new(&params),
            bitmap: SlotBitmap::new(&params),
            seed,
            params,
            exhausted: false,
        }
    }

    /// Sign `message`, consuming `k` slots.
    ///
    /// When no row is left to refill the window after this message, the call fails and
    /// the slots it drew stay consumed. Every later call fails too.
    ///
    /// # Errors
    /// * `Error::RowExhaustion` when the window cannot be refilled, or once the key space
    ///   is spent
    /// * `Error::SamplingFailure` if no counter gives distinct indices
    pub fn sign(&mut self, message: &[u8]) -> Result<Signature, Error> {
        if self.exhausted {
            return Err(Error::RowExhaustion);
        }

        let sample = self.sampler.discover(message)?;
        let coordinates = self.bitmap.consume(sample.indices());
        debug!(ctr = sample.ctr(), ?coordinates, "slots consumed");

        if let Err(e) = self.bitmap.advance_window() {
            warn!(error = %e, "signer exhausted");
            self.exhausted = true;
            return Err(e);
        }

        let keys = coordinates
            .iter()
            .map(|at| PrivateKey::derive::<H>(&self.seed, at.row, at.col))
            .collect();
        Ok(Signature {
            ctr: sample.ctr(),
            keys,
        })
    }

    /// Whether the key space is spent.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Parameters of the instance.
    pub fn params(&self) -> &HorsParams {
        &self.params
    }

    /// The slot tracker.
    pub fn bitmap(&self) -> &SlotBitmap {
        &self.bitmap
    }

    /// Window counters of the slot tracker.
    pub fn report(&self) -> WindowReport {
        self.bitmap.report()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::common::Coordinate;
    use crate::traits::RowWindow;

    fn params() -> HorsParams {
        HorsParams::new(16, 4, 256, 8, 4).unwrap()
    }

    #[test]
    fn signature_reveals_derived_keys() {
        let mut signer: Signer = Signer::new(Seed::zero(), params());
        let message = Blake2b256::digest(&[&[0u8; 32]]);
        let sigma = signer.sign(&message).unwrap();

        assert_eq!(sigma.ctr(), 0);
        let expected: Vec<PrivateKey> = [4, 14, 8, 12]
            .iter()
            .map(|&col| PrivateKey::derive::<Blake2b256>(&Seed::zero(), 0, col))
            .collect();
        assert_eq!(sigma.keys(), &expected[..]);
        assert_eq!(signer.bitmap().available(), 60);
        assert!(!signer
            .bitmap()
            .is_available(Coordinate { row: 0, col: 14 }));
    }

    #[test]
    fn same_message_uses_fresh_slots() {
        let mut signer: Signer = Signer::new(Seed::zero(), params());
        let message = Blake2b256::digest(&[&[0u8; 32]]);
        let first = signer.sign(&message).unwrap();
        let second = signer.sign(&message).unwrap();
        assert_eq!(first.ctr(), second.ctr());

        // ranks 4, 14, 8, 12 now skip the four used slots of row 0
        let expected: Vec<PrivateKey> = [(0, 5), (1, 2), (0, 10), (1, 0)]
            .iter()
            .map(|&(row, col)| PrivateKey::derive::<Blake2b256>(&Seed::zero(), row, col))
            .collect();
        assert_eq!(second.keys(), &expected[..]);
    }

    #[test]
    fn refuses_to_sign_once_exhausted() {
        // two rows of eight slots, four consumed per message, eight needed before each
        let params = HorsParams::new(8, 4, 256, 2, 2).unwrap();
        let mut signer: Signer = Signer::new(Seed::zero(), params);
        assert!(signer.sign(b"tilin").is_ok());
        assert!(!signer.is_exhausted());
        assert!(signer.sign(b"tolon").is_ok());
        // 8 slots left, still enough
        assert!(!signer.is_exhausted());
        // 4 slots left after this one and no row to admit
        assert_eq!(signer.sign(b"tilin tolon"), Err(Error::RowExhaustion));
        assert!(signer.is_exhausted());
        assert_eq!(signer.bitmap().available(), 4);
        assert_eq!(signer.sign(b"tilin"), Err(Error::RowExhaustion));
        assert_eq!(signer.bitmap().available(), 4);
        assert_eq!(signer.bitmap().next_row(), 2);
    }

    #[test]
    fn wire_format() {
        let mut signer: Signer = Signer::new(Seed::zero(), params());
        let sigma = signer.sign(b"message 786").unwrap();
        assert_eq!(sigma.ctr(), 1);

        let bytes = sigma.to_bytes();
        assert_eq!(bytes.len(), params().signature_size());
        assert_eq!(&bytes[..4], &[0, 0, 0, 1]);
        assert_eq!(&bytes[4..36], sigma.keys()[0].as_bytes());
        assert_eq!(Signature::from_bytes(&bytes, 4).unwrap(), sigma);

        assert_eq!(
            Signature::from_bytes(&bytes[1..], 4),
            Err(Error::InvalidSignatureSize(bytes.len() - 1))
        );
        assert_eq!(
            Signature::from_bytes(&bytes, 5),
            Err(Error::InvalidSignatureSize(bytes.len()))
        );
    }
}

#[cfg(feature = "serde_enabled")]
#[cfg(test)]
mod test_serde {
    use super::*;

    #[test]
    fn test_serde_signature() {
        let params = HorsParams::new(16, 4, 256, 8, 4).unwrap();
        let mut signer: Signer = Signer::new(Seed::zero(), params);
        let sigma = signer.sign(b"tolon").unwrap();

        let sigma_str = serde_json::to_string(&sigma).unwrap();
        let deser_sigma: Signature = serde_json::from_str(&sigma_str).unwrap();
        assert_eq!(sigma, deser_sigma);

        let params_str = serde_json::to_string(&params).unwrap();
        let deser_params: HorsParams = serde_json::from_str(&params_str).unwrap();
        assert_eq!(params, deser_params);
    }
}
