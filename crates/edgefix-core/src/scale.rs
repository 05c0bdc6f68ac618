//! Bit-depth scaling of 8-bit reference values.

/// Scale `value` from `bits_in` to `bits` using integer floor division.
///
/// `scale_from(16, 10, 8) == 64`, `scale_from(128, 16, 8) == 32896`.
#[inline]
pub fn scale_from(value: i64, bits: u8, bits_in: u8) -> i64 {
    let num = (1i64 << bits) - 1;
    let den = (1i64 << bits_in) - 1;
    (value * num).div_euclid(den)
}

/// Scale an 8-bit reference value to `bits`.
#[inline]
pub fn scale(value: i64, bits: u8) -> i64 {
    scale_from(value, bits, 8)
}

/// Largest representable sample at `bits`.
#[inline]
pub const fn peak(bits: u8) -> u16 {
    ((1u32 << bits) - 1) as u16
}

/// Neutral chroma level (128 at 8 bits).
#[inline]
pub fn neutral(bits: u8) -> u16 {
    scale(128, bits) as u16
}

/// Limited-range black level (16 at 8 bits).
#[inline]
pub fn black(bits: u8) -> u16 {
    scale(16, bits) as u16
}

/// Limited-range luma white level (235 at 8 bits).
#[inline]
pub fn white(bits: u8) -> u16 {
    scale(235, bits) as u16
}
