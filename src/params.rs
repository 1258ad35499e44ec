//! HORS parameters shared by the signer and the verifier
use crate::common::{DIGEST_SIZE, PRIVATE_KEY_SIZE};
use crate::errors::Error;

#[cfg(feature = "serde_enabled")]
use {
    serde::{Deserialize, Serialize},
    std::convert::TryFrom,
};

/// Parameters of a MUM-HORS instance. Both parties must use the same values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde_enabled", serde(try_from = "RawHorsParams"))]
pub struct HorsParams {
    t: u32,
    k: u32,
    l: u32,
    r: u32,
    rt: u32,
    window_size: u32,
}

/// Unchecked form of `HorsParams`, only used to validate deserialized values.
#[cfg(feature = "serde_enabled")]
#[derive(Deserialize)]
struct RawHorsParams {
    t: u32,
    k: u32,
    l: u32,
    r: u32,
    rt: u32,
    window_size: u32,
}

#[cfg(feature = "serde_enabled")]
impl TryFrom<RawHorsParams> for HorsParams {
    type Error = Error;

    fn try_from(raw: RawHorsParams) -> Result<Self, Error> {
        HorsParams::new(raw.t, raw.k, raw.l, raw.r, raw.rt)?.with_window_size(raw.window_size)
    }
}

impl HorsParams {
    /// Validate and build a parameter set, with `window_size = t`.
    ///
    /// * `t`: columns of the key matrix and range of message indices
    /// * `k`: indices, hence revealed keys, per signature
    /// * `l`: bit length of a key field
    /// * `r`: rows of the key matrix
    /// * `rt`: maximum rows held in memory at once
    ///
    /// # Errors
    /// `Error::InvalidParameter` when `t` is not a byte-aligned power of two, when `k`
    /// indices do not fit in one digest, when `l` is not the digest size or when
    /// `rt` is not in `1..=r`.
    pub fn new(t: u32, k: u32, l: u32, r: u32, rt: u32) -> Result<Self, Error> {
        if !t.is_power_of_two() || t % 8 != 0 {
            return Err(Error::InvalidParameter(format!(
                "t = {} must be a power of two multiple of 8",
                t
            )));
        }
        if k == 0 || k > t {
            return Err(Error::InvalidParameter(format!("k = {} must be in 1..={}", k, t)));
        }
        let log_t = t.trailing_zeros();
        let field_bits = u64::from(k) * u64::from(log_t);
        if field_bits > (DIGEST_SIZE * 8) as u64 {
            return Err(Error::InvalidParameter(format!(
                "k * log2(t) = {} exceeds the {} digest bits",
                field_bits,
                DIGEST_SIZE * 8
            )));
        }
        if l as usize != PRIVATE_KEY_SIZE * 8 {
            return Err(Error::InvalidParameter(format!(
                "l = {} must be {}",
                l,
                PRIVATE_KEY_SIZE * 8
            )));
        }
        if r == 0 || rt == 0 || rt > r {
            return Err(Error::InvalidParameter(format!(
                "rt = {} must be in 1..={}",
                rt, r
            )));
        }

        Ok(HorsParams {
            t,
            k,
            l,
            r,
            rt,
            window_size: t,
        })
    }

    /// Override the number of available slots the window must hold before each message.
    ///
    /// # Errors
    /// The window must cover the index range, `t <= window_size`, and fit in `rt` rows.
    pub fn with_window_size(mut self, window_size: u32) -> Result<Self, Error> {
        if window_size < self.t || u64::from(window_size) > u64::from(self.rt) * u64::from(self.t)
        {
            return Err(Error::InvalidParameter(format!(
                "window_size = {} must be in {}..={}",
                window_size,
                self.t,
                u64::from(self.rt) * u64::from(self.t)
            )));
        }
        self.window_size = window_size;
        Ok(self)
    }

    /// HORS `t`, the number of columns.
    pub fn t(&self) -> u32 {
        self.t
    }

    /// HORS `k`, the number of keys revealed per signature.
    pub fn k(&self) -> u32 {
        self.k
    }

    /// HORS `l`, the bit length of a key field.
    pub fn l(&self) -> u32 {
        self.l
    }

    /// Number of rows of the full key matrix.
    pub fn r(&self) -> u32 {
        self.r
    }

    /// Maximum number of rows in the window.
    pub fn rt(&self) -> u32 {
        self.rt
    }

    /// Available slots required before each message.
    pub fn window_size(&self) -> u32 {
        self.window_size
    }

    /// Width in bits of one message index.
    pub fn log_t(&self) -> u32 {
        self.t.trailing_zeros()
    }

    /// Byte size of a key field, `l / 8`.
    pub fn key_size(&self) -> usize {
        (self.l / 8) as usize
    }

    /// Byte size of an encoded signature, `4 + k * l / 8`.
    pub fn signature_size(&self) -> usize {
        4 + self.k as usize * self.key_size()
    }

    /// Total number of one-time keys of the instance.
    pub fn capacity(&self) -> u64 {
        u64::from(self.r) * u64::from(self.t)
    }
}
