//! Bit helpers shared by the sampler and the bitmap. Bits are numbered from the most
//! significant bit of byte 0.

/// Read the `index`-th field of `width` bits from `buf`, big-endian.
///
/// # Panics
/// When the field runs past the end of `buf` or `width > 32`.
pub(crate) fn read_field(buf: &[u8], index: usize, width: u32) -> u32 {
    assert!(width <= 32);
    let start = index * width as usize;
    assert!(start + width as usize <= buf.len() * 8, "field out of range");

    let mut value = 0u32;
    for bit in start..start + width as usize {
        value = (value << 1) | u32::from((buf[bit / 8] >> (7 - bit % 8)) & 1);
    }
    value
}

/// Position (0 = most significant) of the `nth` (0-based) set bit of `byte`.
///
/// # Panics
/// When `byte` has no more than `nth` set bits.
pub(crate) fn nth_set_bit(byte: u8, nth: u32) -> u32 {
    let mut remaining = nth;
    for position in 0..8 {
        if byte & (0x80 >> position) != 0 {
            if remaining == 0 {
                return position;
            }
            remaining -= 1;
        }
    }
    panic!("byte {:#010b} has no set bit number {}", byte, nth);
}

/// Mask selecting bit `position` of a byte.
pub(crate) fn bit_mask(position: u32) -> u8 {
    0x80 >> position
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fields_are_msb_first() {
        let buf = [0b1010_0101, 0b1111_0000];
        assert_eq!(read_field(&buf, 0, 4), 0b1010);
        assert_eq!(read_field(&buf, 1, 4), 0b0101);
        assert_eq!(read_field(&buf, 2, 4), 0b1111);
        assert_eq!(read_field(&buf, 0, 3), 0b101);
        // field crossing a byte boundary
        assert_eq!(read_field(&buf, 2, 3), 0b011);
        assert_eq!(read_field(&buf, 0, 16), 0xa5f0);
    }

    #[test]
    fn ten_bit_fields() {
        let buf = [0xff, 0x00, 0xff, 0x00, 0xff];
        assert_eq!(read_field(&buf, 0, 10), 0b11_1111_1100);
        assert_eq!(read_field(&buf, 1, 10), 0b00_0000_1111);
        assert_eq!(read_field(&buf, 3, 10), 0b00_1111_1111);
    }

    #[test]
    #[should_panic]
    fn field_past_the_end() {
        read_field(&[0u8; 2], 4, 4);
    }

    #[test]
    fn nth_set_bit_positions() {
        assert_eq!(nth_set_bit(0xff, 0), 0);
        assert_eq!(nth_set_bit(0xff, 7), 7);
        assert_eq!(nth_set_bit(0b0010_1001, 0), 2);
        assert_eq!(nth_set_bit(0b0010_1001, 1), 4);
        assert_eq!(nth_set_bit(0b0010_1001, 2), 7);
        assert_eq!(bit_mask(nth_set_bit(0b0000_0001, 0)), 1);
    }

    #[test]
    #[should_panic]
    fn nth_set_bit_missing() {
        nth_set_bit(0b0100_0000, 1);
    }
}
