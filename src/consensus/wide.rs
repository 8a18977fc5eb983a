//! Portable wide multiplication
//!
//! 64x64 -> 128-bit product assembled from 32-bit partial products, so the
//! result is identical on every target regardless of native wide-multiply
//! support. Used by the proof-of-work check.

const LOW_MASK: u64 = 0xFFFF_FFFF;

/// Multiply two 64-bit values, returning `(low, high)` words of the product.
pub fn mul128(a: u64, b: u64) -> (u64, u64) {
    let a_low = a & LOW_MASK;
    let a_high = a >> 32;
    let b_low = b & LOW_MASK;
    let b_high = b >> 32;

    let res = a_low * b_low;
    let low_res1 = res & LOW_MASK;
    let carry = res >> 32;

    let res = a_high * b_low + carry;
    let high_res_high1 = res >> 32;
    let high_res_low1 = res & LOW_MASK;

    let res = a_low * b_high;
    let low_res2 = res & LOW_MASK;
    let carry = res >> 32;

    let res = a_high * b_high + carry;
    let high_res_high2 = res >> 32;
    let high_res_low2 = res & LOW_MASK;

    // Column sums; none of these can exceed 2^34.
    let r = high_res_low1 + low_res2;
    let carry = r >> 32;
    let low = (r << 32) | low_res1;
    let r = high_res_high1 + high_res_low2 + carry;
    let d3 = r & LOW_MASK;
    let carry = r >> 32;
    let r = high_res_high2 + carry;
    let high = d3 | (r << 32);

    (low, high)
}

/// True if `a + b` carries out of 64 bits.
#[inline]
pub fn carry_add(a: u64, b: u64) -> bool {
    a.wrapping_add(b) < a
}

/// True if `a + b + carry_in` carries out of 64 bits.
#[inline]
pub fn carry_add_with(a: u64, b: u64, carry_in: bool) -> bool {
    let sum = a.wrapping_add(b);
    sum < a || (carry_in && sum == u64::MAX)
}
