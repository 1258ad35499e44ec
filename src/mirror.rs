//! Verifier side public keys.
//!
//! `PublicKeyMatrix` is the `r x t` matrix of public keys handed to the verifier at key
//! generation. `PublicKeyMirror` walks it with the same window as the signer's
//! `SlotBitmap`, without ever seeing that bitmap: it consumes the same ranks and runs the
//! same eviction and admission policy, so rank `i` names the same slot on both sides.
//! Rows are kept in an arena indexed by row number, and the window is an ordered queue
//! of those row numbers. Admission is virtual, the keys are already in memory.
use crate::common::{Blake2b256, Coordinate, PrivateKey, PublicKey, Seed};
use crate::errors::Error;
use crate::params::HorsParams;
use crate::traits::{HashOracle, RowWindow, WindowReport};
use std::collections::VecDeque;
use tracing::trace;

#[cfg(feature = "serde_enabled")]
use {
    serde::{Deserialize, Serialize},
    std::convert::TryFrom,
};

/// Full matrix of one-time public keys.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde_enabled", serde(try_from = "RawPublicKeyMatrix"))]
pub struct PublicKeyMatrix {
    rows: Vec<Vec<PublicKey>>,
}

/// Deserialized rows, before the shape check of `PublicKeyMatrix::from_rows`.
#[cfg(feature = "serde_enabled")]
#[derive(Deserialize)]
struct RawPublicKeyMatrix {
    rows: Vec<Vec<PublicKey>>,
}

#[cfg(feature = "serde_enabled")]
impl TryFrom<RawPublicKeyMatrix> for PublicKeyMatrix {
    type Error = Error;

    fn try_from(raw: RawPublicKeyMatrix) -> Result<Self, Error> {
        PublicKeyMatrix::from_rows(raw.rows)
    }
}

impl PublicKeyMatrix {
    /// Derive the public key of every slot of a `rows x cols` matrix from `seed`. The
    /// key of (row, col) is `H(H(seed || row || col))`.
    pub fn generate<H: HashOracle>(seed: &Seed, rows: u32, cols: u32) -> Self {
        let rows = (0..rows)
            .map(|row| {
                (0..cols)
                    .map(|col| PrivateKey::derive::<H>(seed, row, col).public_key::<H>())
                    .collect()
            })
            .collect();
        PublicKeyMatrix { rows }
    }

    /// `generate` with the default hash.
    pub fn from_seed(seed: &Seed, params: &HorsParams) -> Self {
        Self::generate::<Blake2b256>(seed, params.r(), params.t())
    }

    /// Wrap keys produced elsewhere.
    ///
    /// # Errors
    /// `Error::InvalidMatrixShape` if the rows do not all have the same length.
    pub fn from_rows(rows: Vec<Vec<PublicKey>>) -> Result<Self, Error> {
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        if let Some(bad) = rows.iter().find(|row| row.len() != cols) {
            return Err(Error::InvalidMatrixShape {
                rows: rows.len(),
                cols: bad.len(),
                expected_rows: rows.len(),
                expected_cols: cols,
            });
        }
        Ok(PublicKeyMatrix { rows })
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }

    /// Public key of slot (`row`, `col`).
    pub fn public_key(&self, row: u32, col: u32) -> Option<&PublicKey> {
        self.rows.get(row as usize)?.get(col as usize)
    }
}

#[derive(Debug, Clone)]
struct KeyRow {
    available: u32,
    keys: Vec<Option<PublicKey>>,
}

/// The verifier's view of the window of public keys.
#[derive(Debug)]
pub struct PublicKeyMirror {
    rows: Vec<KeyRow>,
    window: VecDeque<u32>,
    cols: u32,
    total_rows: u32,
    row_threshold: usize,
    window_size: usize,
    next_row: u32,
    active_pks: usize,
    report: WindowReport,
}

impl PublicKeyMirror {
    /// Take ownership of `matrix`, with rows `0..rt` in the window.
    ///
    /// # Errors
    /// `Error::InvalidMatrixShape` unless the matrix has `r` rows of `t` keys.
    pub fn new(matrix: PublicKeyMatrix, params: &HorsParams) -> Result<Self, Error> {
        let expected_cols = params.t() as usize;
        let bad_cols = matrix
            .rows
            .iter()
            .map(Vec::len)
            .find(|&len| len != expected_cols);
        if matrix.rows() != params.r() as usize || bad_cols.is_some() {
            return Err(Error::InvalidMatrixShape {
                rows: matrix.rows(),
                cols: bad_cols.unwrap_or(expected_cols),
                expected_rows: params.r() as usize,
                expected_cols: params.t() as usize,
            });
        }

        let rows = matrix
            .rows
            .into_iter()
            .map(|keys| KeyRow {
                available: params.t(),
                keys: keys.into_iter().map(Some).collect(),
            })
            .collect();

        Ok(PublicKeyMirror {
            rows,
            window: (0..params.rt()).collect(),
            cols: params.t(),
            total_rows: params.r(),
            row_threshold: params.rt() as usize,
            window_size: params.window_size() as usize,
            next_row: params.rt(),
            active_pks: params.rt() as usize * params.t() as usize,
            report: WindowReport::default(),
        })
    }

    /// Coordinate of the key of rank `rank` among the keys still held by the window.
    ///
    /// # Panics
    /// If `rank` is not below `available()`.
    pub fn rank_to_coordinate(&self, rank: u32) -> Coordinate {
        self.locate(rank)
    }

    /// Public key of rank `rank`, left in place.
    ///
    /// # Panics
    /// If `rank` is not below `available()`.
    pub fn public_key(&self, rank: u32) -> &PublicKey {
        let at = self.locate(rank);
        self.rows[at.row as usize].keys[at.col as usize]
            .as_ref()
            .expect("located keys are present")
    }

    /// Take the public keys of the given ranks out of the window, in the order of
    /// `ranks`. Ranks refer to the window as it is before the call.
    ///
    /// # Panics
    /// If a rank is repeated or not below `available()`.
    pub fn consume(&mut self, ranks: &[u32]) -> Vec<PublicKey> {
        let coordinates: Vec<Coordinate> = ranks.iter().map(|&rank| self.locate(rank)).collect();

        let keys = coordinates
            .iter()
            .map(|at| {
                let row = &mut self.rows[at.row as usize];
                let key = row.keys[at.col as usize]
                    .take()
                    .expect("ranks of a batch must be distinct");
                row.available -= 1;
                self.active_pks -= 1;
                key
            })
            .collect();

        self.report.rank_lookups += ranks.len() as u64;
        self.report.consume_batches += 1;
        keys
    }

    /// Whether the key of `coordinate` is in the window and not used yet.
    pub fn is_available(&self, coordinate: Coordinate) -> bool {
        self.window.contains(&coordinate.row)
            && self.rows[coordinate.row as usize]
                .keys
                .get(coordinate.col as usize)
                .map_or(false, Option::is_some)
    }

    /// Numbers of the rows in the window, in window order.
    pub fn row_numbers(&self) -> Vec<u32> {
        self.window.iter().copied().collect()
    }

    /// Keys left per row, in window order.
    pub fn row_availability(&self) -> Vec<u32> {
        self.window
            .iter()
            .map(|&row| self.rows[row as usize].available)
            .collect()
    }

    /// Counters collected so far.
    pub fn report(&self) -> WindowReport {
        self.report
    }

    fn locate(&self, rank: u32) -> Coordinate {
        assert!(
            (rank as usize) < self.active_pks,
            "rank {} out of the {} available keys",
            rank,
            self.active_pks
        );

        let mut target = rank;
        for &number in self.window.iter() {
            let row = &self.rows[number as usize];
            if target >= row.available {
                target -= row.available;
                continue;
            }

            let col = row
                .keys
                .iter()
                .enumerate()
                .filter(|(_, key)| key.is_some())
                .nth(target as usize)
                .map(|(col, _)| col as u32)
                .expect("row availability matches its keys");
            trace!(rank, row = number, col, "rank resolved");
            return Coordinate { row: number, col };
        }
        unreachable!("available keys are spread over the window rows")
    }
}

impl RowWindow for PublicKeyMirror {
    fn available(&self) -> usize {
        self.active_pks
    }

    fn active_rows(&self) -> usize {
        self.window.len()
    }

    fn row_available(&self, position: usize) -> usize {
        self.rows[self.window[position] as usize].available as usize
    }

    fn next_row(&self) -> u32 {
        self.next_row
    }

    fn total_rows(&self) -> u32 {
        self.total_rows
    }

    fn row_threshold(&self) -> usize {
        self.row_threshold
    }

    fn window_size(&self) -> usize {
        self.window_size
    }

    fn remove_row(&mut self, position: usize) {
        let number = self
            .window
            .remove(position)
            .expect("removed position is inside the window");
        let row = &mut self.rows[number as usize];
        self.active_pks -= row.available as usize;
        row.available = 0;
        row.keys = Vec::new();
    }

    fn admit_row(&mut self) {
        let number = self.next_row;
        self.window.push_back(number);
        self.next_row += 1;
        self.active_pks += self.rows[number as usize].available as usize;
        debug_assert_eq!(self.rows[number as usize].available, self.cols);
    }

    fn report_mut(&mut self) -> &mut WindowReport {
        &mut self.report
    }
}


#[cfg(feature = "serde_enabled")]
#[cfg(test)]
mod test_serde {
    use super::*;

    #[test]
    fn deserialization_checks_shape() {
        let params = HorsParams::new(16, 4, 256, 8, 4).unwrap();
        let matrix = PublicKeyMatrix::from_seed(&Seed::zero(), &params);
        let mut value = serde_json::to_value(&matrix).unwrap();
        value["rows"][1].as_array_mut().unwrap().truncate(3);

        assert!(serde_json::from_value::<PublicKeyMatrix>(value).is_err());

        let matrix_str = serde_json::to_string(&matrix).unwrap();
        let deser_matrix: PublicKeyMatrix = serde_json::from_str(&matrix_str).unwrap();
        assert_eq!(matrix, deser_matrix);
        assert!(PublicKeyMirror::new(deser_matrix, &params).is_ok());
    }
}
