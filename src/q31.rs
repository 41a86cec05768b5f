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
use num_complex::Complex;

/// Q0.31 fixed-point sample: value = mantissa / 2^31, range [-1, 1).
pub type Q31 = i32;

/// Q0.31 of +1.0 minus one LSB, the saturation rail.
pub(crate) const Q31_MAX: i32 = i32::MAX;
pub(crate) const Q31_MIN: i32 = i32::MIN;

/// Rounded narrowing of a wide accumulator: value >> shift, round half up.
///
/// Saturates to the i32 rails instead of wrapping. `shift` must be in 0..=62.
#[inline(always)]
pub(crate) fn rnd_sat_narrow(v: i64, shift: u32) -> i32 {
    let rounded = if shift == 0 {
        v
    } else {
        (v + (1i64 << (shift - 1))) >> shift
    };
    if rounded > Q31_MAX as i64 {
        Q31_MAX
    } else if rounded < Q31_MIN as i64 {
        Q31_MIN
    } else {
        rounded as i32
    }
}

/// Q31 * Q31 -> Q31 with round-half-up.
#[inline(always)]
pub(crate) fn mul_q31(a: i32, b: i32) -> i32 {
    rnd_sat_narrow(a as i64 * b as i64, 31)
}

/// Arithmetic right shift with round-half-up; shift of zero is a pass-through.
#[inline(always)]
pub(crate) fn sra_rnd(x: i32, shift: u32) -> i32 {
    if shift == 0 {
        return x;
    }
    (((x as i64) + (1i64 << (shift - 1))) >> shift) as i32
}

/// Signed shift: positive shifts right with rounding, negative shifts left
/// with saturation. The caller bounds `shift` so that left shifts stay inside
/// the block's headroom.
#[inline(always)]
pub(crate) fn shift_q31(x: i32, shift: i32) -> i32 {
    if shift >= 0 {
        sra_rnd(x, shift as u32)
    } else {
        let widened = (x as i64) << (-shift) as u32;
        if widened > Q31_MAX as i64 {
            Q31_MAX
        } else if widened < Q31_MIN as i64 {
            Q31_MIN
        } else {
            widened as i32
        }
    }
}

#[inline(always)]
pub(crate) fn c_shift_q31(x: Complex<Q31>, shift: i32) -> Complex<Q31> {
    Complex {
        re: shift_q31(x.re, shift),
        im: shift_q31(x.im, shift),
    }
}

/// Complex Q31 multiply, products kept in i64 until one rounded narrowing.
#[inline(always)]
pub(crate) fn c_mul_q31(a: Complex<Q31>, b: Complex<Q31>) -> Complex<Q31> {
    let re = a.re as i64 * b.re as i64 - a.im as i64 * b.im as i64;
    let im = a.re as i64 * b.im as i64 + a.im as i64 * b.re as i64;
    Complex {
        re: rnd_sat_narrow(re, 31),
        im: rnd_sat_narrow(im, 31),
    }
}

#[inline(always)]
pub(crate) fn c_sat_add(a: Complex<Q31>, b: Complex<Q31>) -> Complex<Q31> {
    Complex {
        re: a.re.saturating_add(b.re),
        im: a.im.saturating_add(b.im),
    }
}

#[inline(always)]
pub(crate) fn c_sat_sub(a: Complex<Q31>, b: Complex<Q31>) -> Complex<Q31> {
    Complex {
        re: a.re.saturating_sub(b.re),
        im: a.im.saturating_sub(b.im),
    }
}

/// Quantize a unit-magnitude f64 to Q31, round to nearest.
#[inline]
pub(crate) fn quantize_q31(x: f64) -> i32 {
    let scaled = (x * (1u64 << 31) as f64).round();
    if scaled >= Q31_MAX as f64 {
        Q31_MAX
    } else if scaled <= Q31_MIN as f64 {
        Q31_MIN
    } else {
        scaled as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mul_q31_identity_neighbourhood() {
        // 0.5 * 0.5 = 0.25
        let half = 1 << 30;
        assert_eq!(mul_q31(half, half), 1 << 29);
        // x * ~1.0 stays within one LSB of x
        let x = 0x2345_6789;
        let y = mul_q31(x, Q31_MAX);
        assert!((x - y).abs() <= 1, "{x} vs {y}");
    }

    #[test]
    fn test_sra_rnd_half_up() {
        assert_eq!(sra_rnd(5, 1), 3);
        assert_eq!(sra_rnd(-5, 1), -2);
        assert_eq!(sra_rnd(4, 2), 1);
        assert_eq!(sra_rnd(7, 0), 7);
    }

    #[test]
    fn test_shift_q31_round_trip() {
        let x = 0x0123_4567;
        for s in 0..8 {
            let down = shift_q31(x, s);
            let up = shift_q31(down, -s);
            assert!(
                (x - up).abs() <= (1 << s.max(1)),
                "shift {s}: {x} vs {up}"
            );
        }
    }

    #[test]
    fn test_c_mul_q31_by_j() {
        let j = Complex { re: 0, im: Q31_MAX };
        let x = Complex {
            re: 1 << 28,
            im: -(1 << 27),
        };
        let r = c_mul_q31(x, j);
        assert!((r.re - (1 << 27)).abs() <= 1);
        assert!((r.im - (1 << 28)).abs() <= 1);
    }
}
