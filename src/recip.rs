/*
 * // Copyright (c) Radzivon Bartoshyk 10/2025. All rights reserved.
 * //
 * // Redistribution and use in source and binary forms, with or without modification,
 * // are permitted provided that the following conditions are met:
 * //
 * // 1.  Redistributions of source code must retain the above copyright notice, this
 * // list of conditions and the following disclaimer.
 * //
 * // 2.  Redistributions in binary form must reproduce the above copyright notice,
 * // this list of conditions and the following disclaimer in the documentation
 * // and/or other materials provided with the distribution.
 * //
 * // 3.  Neither the name of the copyright holder nor the names of its
 * // contributors may be used to endorse or promote products derived from
 * // this software without specific prior written permission.
 * //
 * // THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS"
 * // AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO, THE
 * // IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
 * // DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE
 * // FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL, EXEMPLARY, OR CONSEQUENTIAL
 * // DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
 * // SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER
 * // CAUSED AND ON ANY THEORY OF LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY,
 * // OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE
 * // OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.
 */

//! Newton-Raphson reciprocal and reciprocal-square-root on normalized Q31
//! mantissas. Exponents ride alongside the mantissa; nothing here divides.

use crate::q31::Q31_MAX;

/// Linear seed 48/17 - 32/17 * v for 1/v over [0.5, 1), both in Q30/Q30-vs-Q31.
const RECIP_C1: i64 = 3_031_741_621;
const RECIP_C2: i64 = 2_021_161_081;

/// Linear seed 7/3 - 4/3 * v for 1/sqrt(v) over [0.25, 1).
const RSQRT_C1: i64 = 2_505_397_589;
const RSQRT_C2: i64 = 1_431_655_765;

/// 1/v for a Q31 mantissa in [2^30, 2^31), i.e. v in [0.5, 1).
///
/// Returns Q30; the true result lies in (1, 2], so exactly 2.0 (v = 0.5)
/// saturates one LSB short.
pub(crate) fn recip_norm_q30(m: i64) -> i32 {
    debug_assert!((1i64 << 30..1i64 << 31).contains(&m));
    let mut y = RECIP_C1 - ((RECIP_C2 * m) >> 31);
    for _ in 0..3 {
        let t = (m * y + (1 << 30)) >> 31;
        let e = (1i64 << 31) - t;
        y = (y * e + (1 << 29)) >> 30;
    }
    if y > Q31_MAX as i64 { Q31_MAX } else { y as i32 }
}

/// 1/sqrt(v) for a Q31 mantissa in [2^29, 2^31), i.e. v in [0.25, 1).
///
/// Returns Q30; the true result lies in (1, 2].
pub(crate) fn rsqrt_norm_q30(m: i64) -> i32 {
    debug_assert!((1i64 << 29..1i64 << 31).contains(&m));
    let mut y = RSQRT_C1 - ((RSQRT_C2 * m) >> 31);
    for _ in 0..4 {
        let y2 = (y * y + (1 << 29)) >> 30;
        let t = (m * y2 + (1 << 30)) >> 31;
        let e = 3 * (1i64 << 30) - t;
        y = (y * e + (1 << 30)) >> 31;
    }
    if y > Q31_MAX as i64 { Q31_MAX } else { y as i32 }
}

/// Reciprocal of a Q31 value of any magnitude up to 2^31 in absolute value
/// (i64 container so the working matrices can feed pivots straight in).
///
/// Returns (mantissa, exponent): 1/(x/2^31) ~= (mantissa/2^30) * 2^exponent.
/// Exact zero substitutes the saturated mantissa with the maximum exponent;
/// the sign of the numerator is applied by the caller.
pub(crate) fn recip_q31_wide(x: i64) -> (i32, i32) {
    if x == 0 {
        return (Q31_MAX, 31);
    }
    let a = x.unsigned_abs() as i64;
    // shift into [2^30, 2^31); a <= 2^31 so the shift is in -1..=30
    let lead = 63 - a.leading_zeros() as i32;
    let sh = 30 - lead;
    let m = if sh >= 0 { a << sh } else { a >> (-sh) };
    let y = recip_norm_q30(m);
    (if x < 0 { -y } else { y }, sh)
}

/// Reciprocal of a Q31 sample. See [`recip_q31_wide`].
pub(crate) fn recip_q31(x: i32) -> (i32, i32) {
    recip_q31_wide(x as i64)
}

/// Reciprocal of a positive value held in a wide accumulator in Q(2*31),
/// the format of a complex squared magnitude.
///
/// Returns (mantissa Q30, exponent): 1/(t/2^62) ~= (mantissa/2^30) * 2^exponent.
/// Exact zero substitutes the saturated mantissa with the maximum exponent.
pub(crate) fn recip_q62_wide(t: i64) -> (i32, i32) {
    if t <= 0 {
        return (Q31_MAX, 62);
    }
    let lead = 63 - t.leading_zeros() as i32;
    let sh = 30 - lead;
    let m = if sh >= 0 { t << sh } else { t >> (-sh) };
    // t/2^62 = m/2^31 * 2^(-sh-31), so the reciprocal gains 2^(sh+31)
    (recip_norm_q30(m), sh + 31)
}

/// Reciprocal square root of a positive value held in a wide accumulator in
/// Q(2*31), the natural format of a diagonal dot product.
///
/// Returns (mantissa Q30, exponent): 1/sqrt(t/2^62) ~= (mantissa/2^30) * 2^exponent.
/// Non-positive input substitutes the saturated mantissa.
pub(crate) fn rsqrt_q62_wide(t: i64) -> (i32, i32) {
    if t <= 0 {
        return (Q31_MAX, 30);
    }
    // even left shift bringing t into [2^60, 2^62), read as [0.25, 1) in Q62
    let lead = 63 - t.leading_zeros() as i32; // position of the top set bit
    let mut sh = 61 - lead;
    if sh < 0 {
        sh = 0;
    }
    sh &= !1;
    let m62 = t << sh;
    let m31 = m62 >> 31; // same value at Q31
    let y = rsqrt_norm_q30(m31);
    // 1/sqrt(t * 2^-62) = 1/sqrt(m * 2^-62) * 2^(sh/2)
    (y, sh / 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_recip_norm_against_reference() {
        let mut rng = rand::rng();
        for _ in 0..2000 {
            let m: i64 = rng.random_range((1i64 << 30)..(1i64 << 31));
            let v = m as f64 / (1u64 << 31) as f64;
            let y = recip_norm_q30(m) as f64 / (1u64 << 30) as f64;
            let err = (y - 1.0 / v).abs() * v; // relative
            assert!(err < 4e-9, "v={v} got {y} err {err}");
        }
    }

    #[test]
    fn test_recip_norm_saturates_at_half() {
        // 1/0.5 = 2.0 is one LSB out of Q30 range; the iteration approaches
        // it from below and lands within a few LSB of the rail
        assert!(recip_norm_q30(1 << 30) >= Q31_MAX - 4);
    }

    #[test]
    fn test_rsqrt_norm_against_reference() {
        let mut rng = rand::rng();
        for _ in 0..2000 {
            let m: i64 = rng.random_range((1i64 << 29)..(1i64 << 31));
            let v = m as f64 / (1u64 << 31) as f64;
            let y = rsqrt_norm_q30(m) as f64 / (1u64 << 30) as f64;
            let err = (y * v.sqrt() - 1.0).abs();
            assert!(err < 4e-9, "v={v} got {y} err {err}");
        }
    }

    #[test]
    fn test_recip_q31_exponent_contract() {
        let mut rng = rand::rng();
        for _ in 0..2000 {
            let x: i32 = rng.random();
            if x == 0 {
                continue;
            }
            let (m, e) = recip_q31(x);
            let v = x as f64 / (1u64 << 31) as f64;
            let r = m as f64 / (1u64 << 30) as f64 * 2f64.powi(e);
            let rel = ((r - 1.0 / v) * v).abs();
            assert!(rel < 8e-9, "x={x} recip {r} expected {} rel {rel}", 1.0 / v);
        }
    }

    #[test]
    fn test_recip_q31_zero_saturates() {
        let (m, e) = recip_q31(0);
        assert_eq!(m, Q31_MAX);
        assert_eq!(e, 31);
    }

    #[test]
    fn test_recip_q62_exponent_contract() {
        let mut rng = rand::rng();
        for _ in 0..2000 {
            let t: i64 = rng.random_range(1..i64::MAX);
            let v = t as f64 / (1u64 << 62) as f64;
            let (m, e) = recip_q62_wide(t);
            let r = m as f64 / (1u64 << 30) as f64 * 2f64.powi(e);
            let rel = ((r - 1.0 / v) * v).abs();
            assert!(rel < 8e-9, "t={t} recip {r} rel {rel}");
        }
        assert_eq!(recip_q62_wide(0), (Q31_MAX, 62));
    }

    #[test]
    fn test_rsqrt_wide_exponent_contract() {
        let mut rng = rand::rng();
        for _ in 0..2000 {
            let t: i64 = rng.random_range(1..(1i64 << 62));
            let v = t as f64 / (1u64 << 62) as f64;
            let (m, e) = rsqrt_q62_wide(t);
            let r = m as f64 / (1u64 << 30) as f64 * 2f64.powi(e);
            let rel = (r * v.sqrt() - 1.0).abs();
            assert!(rel < 8e-9, "t={t} rsqrt {r} rel {rel}");
        }
    }

    #[test]
    fn test_rsqrt_wide_degenerate() {
        assert_eq!(rsqrt_q62_wide(0).0, Q31_MAX);
        assert_eq!(rsqrt_q62_wide(-5).0, Q31_MAX);
    }
}
