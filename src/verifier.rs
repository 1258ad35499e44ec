//! Verifying side of MUM-HORS.
//!
//! The verifier replays, on its public key mirror, exactly the slot consumption of the
//! signer. Before each signature it refills the window the way the signer did after the
//! previous one, then resolves the replayed indices as ranks in that window.
use crate::common::{Blake2b256, PublicKey};
use crate::errors::Error;
use crate::mirror::{PublicKeyMatrix, PublicKeyMirror};
use crate::params::HorsParams;
use crate::sampler::IndexSampler;
use crate::signer::Signature;
use crate::traits::{HashOracle, RowWindow, WindowReport};
use tracing::{debug, warn};

/// Stateful MUM-HORS verifier.
///
/// Signatures must be verified in the order they were produced: every verification
/// that gets past the replay step moves the window, valid or not.
#[derive(Debug)]
pub struct Verifier<H: HashOracle = Blake2b256> {
    params: HorsParams,
    sampler: IndexSampler<H>,
    mirror: PublicKeyMirror,
}

impl<H: HashOracle> Verifier<H> {
    /// Verifier holding the public key matrix of a signer with the same parameters.
    ///
    /// # Errors
    /// `Error::InvalidMatrixShape` unless `matrix` is `r x t`.
    pub fn new(matrix: PublicKeyMatrix, params: HorsParams) -> Result<Self, Error> {
        Ok(Verifier {
            sampler: IndexSampler::new(&params),
            mirror: PublicKeyMirror::new(matrix, &params)?,
            params,
        })
    }

    /// Verify `signature` on `message`.
    ///
    /// Once the indices are replayed and the window is refilled, the `k` slots are
    /// consumed whatever the outcome of the key comparisons.
    ///
    /// # Errors
    /// * `Error::InvalidKeyCount` if the signature does not carry `k` keys
    /// * `Error::MalformedSignature` if the counter does not give distinct indices
    /// * `Error::RowExhaustion` if the window cannot be refilled
    /// * `Error::SignatureMismatch` if a revealed key does not hash to its public key
    pub fn verify(&mut self, message: &[u8], signature: &Signature) -> Result<(), Error> {
        let k = self.params.k() as usize;
        if signature.keys.len() != k {
            return Err(Error::InvalidKeyCount {
                expected: k,
                found: signature.keys.len(),
            });
        }

        let sample = self.sampler.replay(message, signature.ctr)?;
        self.mirror.replenish()?;

        let expected: Vec<PublicKey> = self.mirror.consume(sample.indices());
        let mismatches = signature
            .keys
            .iter()
            .zip(expected.iter())
            .filter(|(sk, pk)| sk.public_key::<H>() != **pk)
            .count();

        if mismatches > 0 {
            warn!(mismatches, ctr = signature.ctr, "signature rejected");
            return Err(Error::SignatureMismatch);
        }
        debug!(ctr = signature.ctr, "signature accepted");
        Ok(())
    }

    /// Decode the wire form of a signature and verify it.
    ///
    /// # Errors
    /// `Error::InvalidSignatureSize` on a bad length, else as `verify`.
    pub fn verify_bytes(&mut self, message: &[u8], signature: &[u8]) -> Result<(), Error> {
        let signature = Signature::from_bytes(signature, self.params.k() as usize)?;
        self.verify(message, &signature)
    }

    /// Parameters of the instance.
    pub fn params(&self) -> &HorsParams {
        &self.params
    }

    /// The public key window.
    pub fn mirror(&self) -> &PublicKeyMirror {
        &self.mirror
    }

    /// Window counters of the public key mirror.
    pub fn report(&self) -> WindowReport {
        self.mirror.report()
    }
}
