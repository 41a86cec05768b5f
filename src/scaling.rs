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
use crate::q31::{c_shift_q31, shift_q31, Q31};
use crate::QernError;
use num_complex::Complex;

/// Running shift total for one transform, advanced once per stage.
#[derive(Debug, Default, Copy, Clone)]
pub(crate) struct ScalingState {
    total: i32,
}

impl ScalingState {
    pub(crate) fn new() -> Self {
        ScalingState { total: 0 }
    }

    #[inline]
    pub(crate) fn advance(&mut self, shift: i32) {
        self.total += shift;
    }

    #[inline]
    pub(crate) fn total(&self) -> i32 {
        self.total
    }
}

/// Redundant sign bits of a single mantissa. Zero reports the full 31 bits.
#[inline(always)]
pub(crate) fn sign_bits(x: i32) -> u32 {
    if x >= 0 {
        x.leading_zeros() - 1
    } else {
        x.leading_ones() - 1
    }
}

/// Minimum redundant-sign-bit count over the block.
///
/// An all-zero block reports zero headroom. Zero has no leading significant
/// bit, so any shift is value-preserving and reporting the maximum would only
/// push a meaningless left shift into the caller's total.
pub(crate) fn block_headroom(block: &[Complex<Q31>]) -> u32 {
    let mut headroom = 31;
    let mut any_nonzero = false;
    for z in block.iter() {
        if z.re != 0 {
            any_nonzero = true;
            headroom = headroom.min(sign_bits(z.re));
        }
        if z.im != 0 {
            any_nonzero = true;
            headroom = headroom.min(sign_bits(z.im));
        }
    }
    if any_nonzero { headroom } else { 0 }
}

pub(crate) fn block_headroom_real(block: &[Q31]) -> u32 {
    let mut headroom = 31;
    let mut any_nonzero = false;
    for &x in block.iter() {
        if x != 0 {
            any_nonzero = true;
            headroom = headroom.min(sign_bits(x));
        }
    }
    if any_nonzero { headroom } else { 0 }
}

/// In-place signed shift over the block: positive is a rounded right shift,
/// negative an exact left shift. The caller bounds left shifts to headroom.
pub(crate) fn apply_shift(block: &mut [Complex<Q31>], shift: i32) {
    if shift == 0 {
        return;
    }
    for z in block.iter_mut() {
        *z = c_shift_q31(*z, shift);
    }
}

pub(crate) fn apply_shift_real(block: &mut [Q31], shift: i32) {
    if shift == 0 {
        return;
    }
    for x in block.iter_mut() {
        *x = shift_q31(*x, shift);
    }
}

/// Boundary validation of a caller-supplied shift amount.
pub(crate) fn validate_shift(shift: i32) -> Result<(), QernError> {
    if !(-31..=31).contains(&shift) {
        return Err(QernError::ShiftOutOfRange(shift));
    }
    Ok(())
}

/// Headroom of a complex block: the minimum count of redundant sign bits
/// across every component, saturated to 31. An all-zero block reports zero.
pub fn complex_block_headroom(block: &[Complex<Q31>]) -> u32 {
    block_headroom(block)
}

/// Headroom of a real block. See [`complex_block_headroom`].
pub fn real_block_headroom(block: &[Q31]) -> u32 {
    block_headroom_real(block)
}

/// Validated in-place shift of a complex block: positive shifts right with
/// round-half-up, negative shifts left. Shifts outside -31..=31 are a
/// contract violation reported as an error; bounding a left shift to the
/// block's headroom stays the caller's responsibility.
pub fn block_shift(block: &mut [Complex<Q31>], shift: i32) -> Result<(), QernError> {
    validate_shift(shift)?;
    apply_shift(block, shift);
    Ok(())
}

/// See [`block_shift`].
pub fn block_shift_real(block: &mut [Q31], shift: i32) -> Result<(), QernError> {
    validate_shift(shift)?;
    apply_shift_real(block, shift);
    Ok(())
}

/// Stage shift for a butterfly that grows values by `needed_bits` binary
/// orders: right-shift whatever the block's headroom does not already cover,
/// left-shift to reclaim precision when headroom exceeds it.
#[inline]
pub(crate) fn stage_shift(headroom: u32, needed_bits: u32) -> i32 {
    needed_bits as i32 - headroom as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_sign_bits() {
        assert_eq!(sign_bits(0), 31);
        assert_eq!(sign_bits(1), 30);
        assert_eq!(sign_bits(-1), 31);
        assert_eq!(sign_bits(i32::MAX), 0);
        assert_eq!(sign_bits(i32::MIN), 0);
        assert_eq!(sign_bits(1 << 29), 1);
    }

    #[test]
    fn test_block_headroom_all_zero() {
        let block = vec![Complex::<Q31>::default(); 16];
        assert_eq!(block_headroom(&block), 0);
    }

    #[test]
    fn test_block_headroom_tracks_largest() {
        let mut block = vec![Complex::<Q31>::default(); 8];
        block[3] = Complex { re: 1 << 20, im: 0 };
        block[5] = Complex {
            re: 0,
            im: -(1 << 27),
        };
        assert_eq!(block_headroom(&block), 3);
    }

    #[test]
    fn test_shift_round_trip_within_one_lsb() {
        let mut rng = rand::rng();
        let mut block: Vec<Complex<Q31>> = (0..64)
            .map(|_| Complex {
                re: rng.random_range(-(1 << 24)..(1 << 24)),
                im: rng.random_range(-(1 << 24)..(1 << 24)),
            })
            .collect();
        let src = block.to_vec();
        let headroom = block_headroom(&block) as i32;
        let s = headroom.min(5);
        apply_shift(&mut block, s);
        apply_shift(&mut block, -s);
        for (a, b) in block.iter().zip(src.iter()) {
            assert!((a.re - b.re).abs() <= 1 << s.max(1));
            assert!((a.im - b.im).abs() <= 1 << s.max(1));
        }
    }

    #[test]
    fn test_stage_shift_modes() {
        // no headroom: shift the full growth out
        assert_eq!(stage_shift(0, 2), 2);
        // exactly enough headroom: no shift
        assert_eq!(stage_shift(2, 2), 0);
        // excess headroom: reclaim precision with a left shift
        assert_eq!(stage_shift(7, 2), -5);
    }

    #[test]
    fn test_validate_shift() {
        assert!(validate_shift(31).is_ok());
        assert!(validate_shift(-31).is_ok());
        assert!(validate_shift(32).is_err());
    }
}
