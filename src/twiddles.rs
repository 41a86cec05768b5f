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
use crate::err::try_vec;
use crate::q31::{quantize_q31, Q31};
use crate::{FftDirection, QernError};
use num_complex::Complex;
use std::f64::consts::PI;

/// Root-of-unity constant exp(-2*pi*i * index / fft_len), quantized to Q31.
pub(crate) fn compute_twiddle_q31(
    index: usize,
    fft_len: usize,
    direction: FftDirection,
) -> Complex<Q31> {
    // conjugation folded into the angle sign: negating a saturated Q31
    // mantissa would overflow where the f64 path simply rounds
    let angle = match direction {
        FftDirection::Forward => -2.0 * PI * index as f64 / fft_len as f64,
        FftDirection::Inverse => 2.0 * PI * index as f64 / fft_len as f64,
    };
    Complex {
        re: quantize_q31(angle.cos()),
        im: quantize_q31(angle.sin()),
    }
}

/// Twiddle table for the radix-4 cross stages above a base butterfly, laid
/// out stage-major the way the stage walk consumes it: three twiddles per
/// column, columns doubling four-fold per stage.
pub(crate) fn radix4_twiddles_from_base(
    base_len: usize,
    size: usize,
    direction: FftDirection,
) -> Result<Vec<Complex<Q31>>, QernError> {
    let mut twiddles = Vec::new();
    twiddles
        .try_reserve_exact(size - 1)
        .map_err(|_| QernError::OutOfMemory(size - 1))?;

    let mut cross_fft_len = base_len;
    while cross_fft_len < size {
        let num_columns = cross_fft_len;
        cross_fft_len *= 4;

        for i in 0..num_columns {
            for k in 1..4 {
                twiddles.push(compute_twiddle_q31(i * k, cross_fft_len, direction));
            }
        }
    }

    Ok(twiddles)
}

/// Half-spectrum fold twiddles for the real transforms, pre-scaled by 0.5 so
/// the fold stage carries no bit growth of its own.
pub(crate) fn real_fold_twiddles(
    length: usize,
    direction: FftDirection,
) -> Result<Vec<Complex<Q31>>, QernError> {
    let twiddles_count = length.div_ceil(4);
    let mut twiddles = try_vec![Complex::<Q31>::default(); twiddles_count - 1];
    for (i, twiddle) in twiddles.iter_mut().enumerate() {
        let angle = -2.0 * PI * (i + 1) as f64 / length as f64;
        let w = match direction {
            FftDirection::Forward => Complex::new(angle.cos(), angle.sin()),
            FftDirection::Inverse => Complex::new(angle.cos(), -angle.sin()),
        };
        *twiddle = Complex {
            re: quantize_q31(0.5 * w.re),
            im: quantize_q31(0.5 * w.im),
        };
    }
    Ok(twiddles)
}
