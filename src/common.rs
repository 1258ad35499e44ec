//! Structures common to the signer and the verifier
use crate::errors::Error;
use crate::traits::HashOracle;
use blake2::digest::{Update, VariableOutput};
use blake2::VarBlake2b;
use rand_core::{CryptoRng, RngCore};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

#[cfg(feature = "serde_enabled")]
use {
    serde::{Deserialize, Serialize},
    serde_with::{serde_as, Bytes},
};

/// Output size of the hash oracle.
pub const DIGEST_SIZE: usize = 32;
/// Size of a one-time private key, i.e. HORS `l / 8` bytes.
pub const PRIVATE_KEY_SIZE: usize = DIGEST_SIZE;
/// Size of a one-time public key.
pub const PUBLIC_KEY_SIZE: usize = DIGEST_SIZE;

/// BLAKE2b with a 256-bit output. This is the hash used by every deployment so far.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake2b256;

impl HashOracle for Blake2b256 {
    fn digest(parts: &[&[u8]]) -> [u8; DIGEST_SIZE] {
        let mut out = [0u8; DIGEST_SIZE];
        // DIGEST_SIZE is a constant in 1..=64, so this cannot fail.
        let mut h = VarBlake2b::new(DIGEST_SIZE).expect("valid size");
        for part in parts {
            h.update(part);
        }
        h.finalize_variable(|res| out.copy_from_slice(res));
        out
    }
}

/// Seed from which every private key is derived on demand. It is never stored anywhere
/// else and it is overwritten with zeroes when dropped.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Seed(Vec<u8>);

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Seed({} bytes)", self.0.len())
    }
}

impl AsRef<[u8]> for Seed {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Seed {
    /// Size of the seeds produced by `Seed::generate`.
    pub const SIZE: usize = 32;

    /// Create a zero seed of `Self::SIZE` bytes
    pub fn zero() -> Seed {
        Seed(vec![0u8; Self::SIZE])
    }

    /// Creates a `Seed` from a slice of any length. The seed of a deployment is usually
    /// read whole from a file.
    pub fn from_slice(b: &[u8]) -> Seed {
        Seed(b.to_vec())
    }

    /// Draw a fresh seed of `Self::SIZE` bytes from a cryptographic rng.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Seed {
        let mut out = vec![0u8; Self::SIZE];
        rng.fill_bytes(&mut out);
        Seed(out)
    }

    /// Length of the seed in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` for an empty seed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One-time private key, revealed inside a signature.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
#[cfg_attr(feature = "serde_enabled", serde_as)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub struct PrivateKey(
    #[cfg_attr(feature = "serde_enabled", serde_as(as = "Bytes"))] pub(crate) [u8; PRIVATE_KEY_SIZE],
);

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}

impl PrivateKey {
    /// Derive the private key of slot (`row`, `col`): `H(seed || row || col)`, both
    /// coordinates as 4 little-endian bytes.
    pub fn derive<H: HashOracle>(seed: &Seed, row: u32, col: u32) -> Self {
        PrivateKey(H::digest(&[
            seed.as_ref(),
            &row.to_le_bytes(),
            &col.to_le_bytes(),
        ]))
    }

    /// The public key matching this private key, `H(self)`.
    pub fn public_key<H: HashOracle>(&self) -> PublicKey {
        PublicKey(H::digest(&[&self.0]))
    }

    /// Return `Self` as its byte representation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Tries to convert a slice of `bytes` as `Self`.
    ///
    /// # Errors
    /// This function returns an error if the length of `bytes` is not equal to
    /// `PRIVATE_KEY_SIZE`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != PRIVATE_KEY_SIZE {
            return Err(Error::InvalidSignatureSize(bytes.len()));
        }
        let mut v = [0u8; PRIVATE_KEY_SIZE];
        v.copy_from_slice(bytes);
        Ok(PrivateKey(v))
    }
}

/// One-time public key, i.e. the hash of the private key of the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_enabled", serde_as)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub struct PublicKey(
    #[cfg_attr(feature = "serde_enabled", serde_as(as = "Bytes"))] pub(crate) [u8; PUBLIC_KEY_SIZE],
);

impl PublicKey {
    /// Return `Self` as its byte representation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Tries to convert a slice of `bytes` as `Self`.
    ///
    /// # Errors
    /// This function returns an error if the length of `bytes` is not equal to
    /// `PUBLIC_KEY_SIZE`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() == PUBLIC_KEY_SIZE {
            let mut v = [0u8; PUBLIC_KEY_SIZE];
            v.copy_from_slice(bytes);
            Ok(PublicKey(v))
        } else {
            Err(Error::InvalidPublicKeySize(bytes.len()))
        }
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Position of a slot in the full key space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub struct Coordinate {
    /// Global row number
    pub row: u32,
    /// Column within the row
    pub col: u32,
}
