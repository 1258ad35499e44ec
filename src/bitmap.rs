//! Signer side tracker of one-time key slots.
//!
//! Only `rt` rows of the `r x t` key matrix are materialised at a time, one bit per slot
//! (set while the private key is unused). Row bits live in a single arena of `rt` row
//! slots allocated once; the window is a ring buffer of row descriptors pointing into
//! it, in rank order. Rows are appended at the tail and removed from any position, never
//! reordered.
use crate::bits::{bit_mask, nth_set_bit};
use crate::common::Coordinate;
use crate::errors::Error;
use crate::params::HorsParams;
use crate::traits::{RowWindow, WindowReport};
use std::collections::VecDeque;
use tracing::trace;

#[derive(Debug, Clone, Copy)]
struct Row {
    number: u32,
    available: u32,
    slot: usize,
}

/// Windowed bitmap of available private key slots.
#[derive(Debug, Clone)]
pub struct SlotBitmap {
    rows: VecDeque<Row>,
    storage: Vec<u8>,
    free_slots: Vec<usize>,
    row_bytes: usize,
    cols: u32,
    total_rows: u32,
    row_threshold: usize,
    window_size: usize,
    next_row: u32,
    set_bits: usize,
    report: WindowReport,
}

/// Location of a set bit: position of the row in the window, byte and bit within it.
#[derive(Debug, Clone, Copy)]
struct BitLocation {
    position: usize,
    byte: usize,
    bit: u32,
}

impl SlotBitmap {
    /// Bitmap holding rows `0..rt`, every slot available.
    pub fn new(params: &HorsParams) -> Self {
        let row_bytes = (params.t() / 8) as usize;
        let row_threshold = params.rt() as usize;
        let rows = (0..params.rt())
            .map(|number| Row {
                number,
                available: params.t(),
                slot: number as usize,
            })
            .collect();

        SlotBitmap {
            rows,
            storage: vec![0xff; row_threshold * row_bytes],
            free_slots: Vec::with_capacity(row_threshold),
            row_bytes,
            cols: params.t(),
            total_rows: params.r(),
            row_threshold,
            window_size: params.window_size() as usize,
            next_row: params.rt(),
            set_bits: row_threshold * params.t() as usize,
            report: WindowReport::default(),
        }
    }

    /// Coordinate of the slot of rank `rank` among the available slots, rows taken in
    /// window order and columns from low to high.
    ///
    /// # Panics
    /// If `rank` is not below `available()`.
    pub fn rank_to_coordinate(&self, rank: u32) -> Coordinate {
        let location = self.locate(rank);
        self.coordinate(location)
    }

    /// Mark the slots of the given ranks as used and return their coordinates, in the
    /// order of `ranks`.
    ///
    /// Ranks are understood over the availability *before* the call: every coordinate
    /// is resolved before the first bit is cleared. Clearing rank 2 first would turn
    /// rank 7 into the slot that had rank 8.
    ///
    /// # Panics
    /// If a rank is repeated or not below `available()`.
    pub fn consume(&mut self, ranks: &[u32]) -> Vec<Coordinate> {
        let mut order: Vec<usize> = (0..ranks.len()).collect();
        order.sort_unstable_by_key(|&i| ranks[i]);
        assert!(
            order.windows(2).all(|w| ranks[w[0]] != ranks[w[1]]),
            "ranks of a batch must be distinct"
        );

        let locations: Vec<BitLocation> = ranks.iter().map(|&rank| self.locate(rank)).collect();
        let coordinates: Vec<Coordinate> = locations.iter().map(|&l| self.coordinate(l)).collect();

        for location in locations {
            let row = &mut self.rows[location.position];
            let index = row.slot * self.row_bytes + location.byte;
            self.storage[index] &= !bit_mask(location.bit);
            row.available -= 1;
            self.set_bits -= 1;
        }

        self.report.rank_lookups += ranks.len() as u64;
        self.report.consume_batches += 1;
        coordinates
    }

    /// Admit rows if fewer than `window_size` slots are left. To be called once per
    /// signed message.
    ///
    /// # Errors
    /// `Error::RowExhaustion` when rows are needed and all `r` rows were already used.
    pub fn advance_window(&mut self) -> Result<usize, Error> {
        self.replenish()
    }

    /// Whether the slot at `coordinate` is in the window and still unused.
    pub fn is_available(&self, coordinate: Coordinate) -> bool {
        if coordinate.col >= self.cols {
            return false;
        }
        self.rows
            .iter()
            .find(|row| row.number == coordinate.row)
            .map(|row| {
                let byte = self.storage[row.slot * self.row_bytes + coordinate.col as usize / 8];
                byte & bit_mask(coordinate.col % 8) != 0
            })
            .unwrap_or(false)
    }

    /// Numbers of the rows in the window, in window order.
    pub fn row_numbers(&self) -> Vec<u32> {
        self.rows.iter().map(|row| row.number).collect()
    }

    /// Available slots per row, in window order.
    pub fn row_availability(&self) -> Vec<u32> {
        self.rows.iter().map(|row| row.available).collect()
    }

    /// Counters collected so far.
    pub fn report(&self) -> WindowReport {
        self.report
    }

    fn locate(&self, rank: u32) -> BitLocation {
        assert!(
            (rank as usize) < self.set_bits,
            "rank {} out of the {} available slots",
            rank,
            self.set_bits
        );

        let mut target = rank;
        let (position, row) = self
            .rows
            .iter()
            .enumerate()
            .find(|(_, row)| {
                if target < row.available {
                    true
                } else {
                    target -= row.available;
                    false
                }
            })
            .expect("available slots are spread over the window rows");

        let bytes = &self.storage[row.slot * self.row_bytes..(row.slot + 1) * self.row_bytes];
        for (byte, &value) in bytes.iter().enumerate() {
            let ones = value.count_ones();
            if target < ones {
                let bit = nth_set_bit(value, target);
                trace!(rank, row = row.number, col = byte as u32 * 8 + bit, "rank resolved");
                return BitLocation {
                    position,
                    byte,
                    bit,
                };
            }
            target -= ones;
        }
        unreachable!("row availability matches its bits")
    }

    fn coordinate(&self, location: BitLocation) -> Coordinate {
        Coordinate {
            row: self.rows[location.position].number,
            col: location.byte as u32 * 8 + location.bit,
        }
    }
}

impl RowWindow for SlotBitmap {
    fn available(&self) -> usize {
        self.set_bits
    }

    fn active_rows(&self) -> usize {
        self.rows.len()
    }

    fn row_available(&self, position: usize) -> usize {
        self.rows[position].available as usize
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
        let row = self
            .rows
            .remove(position)
            .expect("removed position is inside the window");
        self.set_bits -= row.available as usize;
        self.free_slots.push(row.slot);
    }

    fn admit_row(&mut self) {
        let slot = self
            .free_slots
            .pop()
            .expect("a window below its threshold has a free row slot");
        self.storage[slot * self.row_bytes..(slot + 1) * self.row_bytes]
            .iter_mut()
            .for_each(|b| *b = 0xff);

        self.rows.push_back(Row {
            number: self.next_row,
            available: self.cols,
            slot,
        });
        self.next_row += 1;
        self.set_bits += self.cols as usize;
    }

    fn report_mut(&mut self) -> &mut WindowReport {
        &mut self.report
    }
}
