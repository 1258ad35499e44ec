//! A many-time HORS signature implementation.
//!
//! "MUM-HORS: Memory-Efficient Many-Time Hash-Based Signatures"
//!
//! HORS reveals `k` of `t` one-time private keys per message. Here the keys form an
//! `r x t` matrix derived on demand from a seed, every slot is used at most once, and
//! the message indices are read as ranks among the slots still available. The signer
//! tracks availability with a bitmap over a window of `rt` rows. The verifier never
//! sees that bitmap: it replays the same window policy over its public keys.
//!
//! ```
//! use mumhors::{HorsParams, Seed, Signer, Verifier};
//!
//! let params = HorsParams::new(16, 4, 256, 8, 4).unwrap();
//! let (mut signer, matrix) = Signer::keygen(Seed::zero(), params);
//! let mut verifier: Verifier = Verifier::new(matrix, params).unwrap();
//!
//! let sigma = signer.sign(b"tilin").unwrap();
//! assert!(verifier.verify(b"tilin", &sigma).is_ok());
//! ```
#![warn(missing_docs, rust_2018_idioms)]

mod bits;
pub mod bitmap;
pub mod common;
pub mod errors;
pub mod mirror;
pub mod params;
pub mod sampler;
pub mod signer;
pub mod traits;
pub mod verifier;

pub use crate::common::{Blake2b256, Coordinate, PrivateKey, PublicKey, Seed};
pub use crate::errors::Error;
pub use crate::mirror::PublicKeyMatrix;
pub use crate::params::HorsParams;
pub use crate::signer::{Signature, Signer};
pub use crate::verifier::Verifier;
