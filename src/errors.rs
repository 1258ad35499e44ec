//! Errors specific to MUM-HORS signatures
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Enum of error associated with MUM-HORS signing and verification
pub enum Error {
    /// The HORS parameters are inconsistent. The string names the violated constraint.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    /// Rejection sampling went through every counter value without finding `k` distinct
    /// indices.
    #[error("rejection sampling exhausted the counter space")]
    SamplingFailure,
    /// No row is left to admit into the window: the key budget of the seed is spent.
    #[error("no more rows to admit, the key space is exhausted")]
    RowExhaustion,
    /// The hash of a revealed private key differs from the stored public key.
    #[error("private key does not hash to the expected public key")]
    SignatureMismatch,
    /// Replaying index extraction with the transmitted counter does not give distinct
    /// indices.
    #[error("counter does not yield distinct indices")]
    MalformedSignature,
    /// Error occurs when the size of the signature is not the expected.
    #[error("invalid signature size: {0} bytes")]
    InvalidSignatureSize(usize),
    /// Error occurs when a signature does not carry exactly `k` keys.
    #[error("signature carries {found} keys, expected {expected}")]
    InvalidKeyCount {
        /// HORS `k`
        expected: usize,
        /// keys present in the signature
        found: usize,
    },
    /// Error occurs when the size of a public key is not the expected.
    #[error("invalid public key size: {0} bytes")]
    InvalidPublicKeySize(usize),
    /// The public key matrix does not have the `r x t` shape the parameters ask for.
    #[error("public key matrix is {rows}x{cols}, expected {expected_rows}x{expected_cols}")]
    InvalidMatrixShape {
        /// rows found
        rows: usize,
        /// columns found (of the first offending row)
        cols: usize,
        /// HORS `r`
        expected_rows: usize,
        /// HORS `t`
        expected_cols: usize,
    },
}
