//! Traits shared by the signer and the verifier
use crate::common::DIGEST_SIZE;
use crate::errors::Error;
use tracing::{debug, trace, warn};

#[cfg(feature = "serde_enabled")]
use serde::{Deserialize, Serialize};

/// One-way function used to derive keys and to extract message indices. It must be
/// deterministic and collision resistant.
///
/// # Example
/// ```
/// use mumhors::common::Blake2b256;
/// use mumhors::traits::HashOracle;
///
/// let d = Blake2b256::digest(&[b"tilin", b"tolon"]);
/// assert_eq!(d, Blake2b256::digest(&[b"tilintolon"]));
/// ```
pub trait HashOracle {
    /// Digest of the concatenation of `parts`.
    fn digest(parts: &[&[u8]]) -> [u8; DIGEST_SIZE];
}

/// Counters collected by a window while it evicts and admits rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub struct WindowReport {
    /// Calls to `replenish` that had to admit rows
    pub replenish_calls: u64,
    /// Cleanup passes over the window
    pub cleanup_passes: u64,
    /// Exhausted rows dropped by cleanup
    pub rows_cleaned: u64,
    /// Rows evicted while they still had available slots
    pub direct_evictions: u64,
    /// Available slots thrown away by direct evictions
    pub discarded_slots: u64,
    /// Rows brought into the window after initialisation
    pub rows_admitted: u64,
    /// Rank to coordinate resolutions
    pub rank_lookups: u64,
    /// Batches of consumed ranks
    pub consume_batches: u64,
}

/// A sliding window of rows over the `[0, r)` row space. The signer's bitmap and the
/// verifier's public key mirror both implement it, and both run the eviction and
/// admission policy provided here, which is what keeps their rank spaces identical.
///
/// Rows are addressed by their position in window order. Positions are only valid
/// until the next removal.
pub trait RowWindow {
    /// Number of available slots over the whole window.
    fn available(&self) -> usize;
    /// Number of rows currently in the window.
    fn active_rows(&self) -> usize;
    /// Available slots of the row at `position`.
    fn row_available(&self, position: usize) -> usize;
    /// Number of the next row to admit.
    fn next_row(&self) -> u32;
    /// Total number of rows of the key space, HORS `r`.
    fn total_rows(&self) -> u32;
    /// Maximum number of rows in the window, `rt`.
    fn row_threshold(&self) -> usize;
    /// Minimum number of available slots a message needs.
    fn window_size(&self) -> usize;
    /// Drop the row at `position`, releasing everything it holds.
    fn remove_row(&mut self, position: usize);
    /// Append row `next_row()` at the tail with every slot available.
    fn admit_row(&mut self);
    /// Counters of this window.
    fn report_mut(&mut self) -> &mut WindowReport;

    /// Drop every row with no available slot left, wherever it is in the window.
    /// Returns the number of removed rows.
    fn cleanup_rows(&mut self) -> usize {
        let mut removed = 0;
        let mut position = 0;
        while position < self.active_rows() {
            if self.row_available(position) == 0 {
                self.remove_row(position);
                removed += 1;
            } else {
                position += 1;
            }
        }

        let report = self.report_mut();
        report.cleanup_passes += 1;
        report.rows_cleaned += removed as u64;
        trace!(removed, "cleanup pass");
        removed
    }

    /// Evict the row with the fewest available slots. Ties go to the first such row in
    /// window order.
    fn evict_fewest(&mut self) {
        let mut target = 0;
        for position in 1..self.active_rows() {
            if self.row_available(position) < self.row_available(target) {
                target = position;
            }
        }

        let discarded = self.row_available(target);
        self.remove_row(target);

        let report = self.report_mut();
        report.direct_evictions += 1;
        report.discarded_slots += discarded as u64;
        debug!(position = target, discarded, "evicted row");
    }

    /// Make sure the window holds at least `window_size()` available slots. When it does
    /// not, rows are freed (exhausted rows first, else the least available one) and new
    /// rows are admitted in their place. Returns the number of admitted rows.
    ///
    /// # Errors
    /// `Error::RowExhaustion` if slots are missing and every row of the key space has
    /// already been admitted.
    fn replenish(&mut self) -> Result<usize, Error> {
        if self.window_size() <= self.available() {
            return Ok(0);
        }

        if self.next_row() >= self.total_rows() {
            warn!(
                available = self.available(),
                window_size = self.window_size(),
                "no more rows to admit"
            );
            return Err(Error::RowExhaustion);
        }
        self.report_mut().replenish_calls += 1;

        if self.active_rows() + 1 > self.row_threshold() && self.cleanup_rows() == 0 {
            self.evict_fewest();
        }

        let room = self.row_threshold() - self.active_rows();
        let left = (self.total_rows() - self.next_row()) as usize;
        let admitted = room.min(left);
        for _ in 0..admitted {
            self.admit_row();
        }

        self.report_mut().rows_admitted += admitted as u64;
        debug!(
            admitted,
            next_row = self.next_row(),
            available = self.available(),
            "admitted rows"
        );
        Ok(admitted)
    }
}
