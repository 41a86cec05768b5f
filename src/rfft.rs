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
use crate::cfft::BlockFft;
use crate::err::try_vec;
use crate::q31::{rnd_sat_narrow, Q31};
use crate::scaling::{apply_shift, block_headroom, stage_shift};
use crate::twiddles::real_fold_twiddles;
use crate::{
    BlockFftExecutor, C2RBlockFftExecutor, FftDirection, QernError, R2CBlockFftExecutor,
    ScalingMode,
};
use num_complex::Complex;
use num_traits::Zero;

/// Forward real FFT: N reals packed as N/2 complex samples, a half-length
/// complex FFT, then the conjugate-symmetric unfold stage. The unfold grows
/// one bit and is scaled like any other stage; its shift joins the total.
pub(crate) struct R2CBlockFft {
    half: BlockFft,
    twiddles: Vec<Complex<Q31>>,
    length: usize,
    complex_length: usize,
}

impl R2CBlockFft {
    pub(crate) fn install(length: usize) -> Result<Self, QernError> {
        if length == 0 {
            return Err(QernError::ZeroSizedFft);
        }
        if length % 2 != 0 {
            return Err(QernError::UnsupportedLength(length));
        }
        let half = BlockFft::new(length / 2, FftDirection::Forward)?;
        let twiddles = real_fold_twiddles(length, FftDirection::Forward)?;
        Ok(Self {
            half,
            twiddles,
            length,
            complex_length: length / 2 + 1,
        })
    }
}

#[inline]
fn fold_shift(block: &[Complex<Q31>], scaling: ScalingMode) -> i32 {
    match scaling {
        ScalingMode::Dynamic => stage_shift(block_headroom(block), 1),
        ScalingMode::Static => 1,
    }
}

impl R2CBlockFftExecutor for R2CBlockFft {
    fn execute(
        &self,
        input: &[Q31],
        output: &mut [Complex<Q31>],
        scaling: ScalingMode,
    ) -> Result<i32, QernError> {
        if input.len() != self.length {
            return Err(QernError::InvalidInPlaceLength(self.length, input.len()));
        }
        if output.len() != self.complex_length {
            return Err(QernError::InvalidOutputLength(
                self.complex_length,
                output.len(),
            ));
        }

        let half_len = self.length / 2;
        for (dst, input_pair) in output.iter_mut().zip(input.chunks_exact(2)) {
            *dst = Complex::new(input_pair[0], input_pair[1]);
        }

        let half_shift = self.half.execute(&mut output[..half_len], scaling)?;

        let unfold_shift = fold_shift(&output[..half_len], scaling);
        apply_shift(&mut output[..half_len], unfold_shift);

        let (mut output_left, mut output_right) = output.split_at_mut((half_len + 1) / 2);

        match (output_left.first_mut(), output_right.last_mut()) {
            (Some(first_element), Some(last_element)) => {
                // The DC and Nyquist bins are the sum and difference of the
                // first packed value's components
                let first_value = *first_element;
                *first_element = Complex {
                    re: first_value.re.saturating_add(first_value.im),
                    im: 0,
                };
                *last_element = Complex {
                    re: first_value.re.saturating_sub(first_value.im),
                    im: 0,
                };

                output_left = &mut output_left[1..];
                let right_len = output_right.len();
                output_right = &mut output_right[..right_len - 1];
            }
            _ => return Ok(half_shift + unfold_shift),
        }

        for ((twiddle, out), out_rev) in self
            .twiddles
            .iter()
            .zip(output_left.iter_mut())
            .zip(output_right.iter_mut().rev())
        {
            let sum_re = out.re as i64 + out_rev.re as i64;
            let sum_im = out.im as i64 + out_rev.im as i64;
            let diff_re = out.re as i64 - out_rev.re as i64;
            let diff_im = out.im as i64 - out_rev.im as i64;

            let twiddled_real = sum_im * twiddle.re as i64 + diff_re * twiddle.im as i64;
            let twiddled_im = sum_im * twiddle.im as i64 - diff_re * twiddle.re as i64;

            *out = Complex {
                re: rnd_sat_narrow((sum_re << 30) + twiddled_real, 31),
                im: rnd_sat_narrow((diff_im << 30) + twiddled_im, 31),
            };
            *out_rev = Complex {
                re: rnd_sat_narrow((sum_re << 30) - twiddled_real, 31),
                im: rnd_sat_narrow(twiddled_im - (diff_im << 30), 31),
            };
        }

        if output.len() % 2 == 1 {
            if let Some(center_element) = output.get_mut(output.len() / 2) {
                center_element.im = center_element.im.saturating_neg();
            }
        }

        Ok(half_shift + unfold_shift)
    }

    fn real_length(&self) -> usize {
        self.length
    }

    fn complex_length(&self) -> usize {
        self.complex_length
    }
}

/// Inverse real FFT: the half spectrum folds back into a packed complex
/// spectrum of half the size, a half-length complex inverse FFT runs over
/// it, and the interleaved components are the reals.
pub(crate) struct C2RBlockFft {
    half: BlockFft,
    twiddles: Vec<Complex<Q31>>,
    length: usize,
    complex_length: usize,
}

impl C2RBlockFft {
    pub(crate) fn install(length: usize) -> Result<Self, QernError> {
        if length == 0 {
            return Err(QernError::ZeroSizedFft);
        }
        if length % 2 != 0 {
            return Err(QernError::UnsupportedLength(length));
        }
        let half = BlockFft::new(length / 2, FftDirection::Inverse)?;
        let twiddles = real_fold_twiddles(length, FftDirection::Inverse)?;
        Ok(Self {
            half,
            twiddles,
            length,
            complex_length: length / 2 + 1,
        })
    }
}

impl C2RBlockFftExecutor for C2RBlockFft {
    fn execute(
        &self,
        input: &[Complex<Q31>],
        output: &mut [Q31],
        scaling: ScalingMode,
    ) -> Result<i32, QernError> {
        if input.len() != self.complex_length {
            return Err(QernError::InvalidInPlaceLength(
                self.complex_length,
                input.len(),
            ));
        }
        if output.len() != self.length {
            return Err(QernError::InvalidOutputLength(self.length, output.len()));
        }

        let half_len = self.length / 2;
        let mut scratch = try_vec![Complex::<Q31>::zero(); self.complex_length];
        scratch.copy_from_slice(input);
        scratch[0].im = 0;
        if let Some(last) = scratch.last_mut() {
            last.im = 0;
        }

        let fold_shift_amount = fold_shift(&scratch, scaling);
        apply_shift(&mut scratch, fold_shift_amount);

        let (mut input_left, mut input_right) = scratch.split_at_mut((half_len + 1) / 2);

        match (input_left.first_mut(), input_right.last_mut()) {
            (Some(first_input), Some(last_input)) => {
                // z[0] = ((X0 + Xn) + j (X0 - Xn)) / 2 with both bins real
                let x0 = first_input.re as i64;
                let xn = last_input.re as i64;
                *first_input = Complex {
                    re: rnd_sat_narrow(x0 + xn, 1),
                    im: rnd_sat_narrow(x0 - xn, 1),
                };

                input_left = &mut input_left[1..];
                let right_len = input_right.len();
                input_right = &mut input_right[..right_len - 1];
            }
            _ => return Ok(fold_shift_amount),
        }

        for ((twiddle, out), out_rev) in self
            .twiddles
            .iter()
            .zip(input_left.iter_mut())
            .zip(input_right.iter_mut().rev())
        {
            let sum_re = out.re as i64 + out_rev.re as i64;
            let sum_im = out.im as i64 + out_rev.im as i64;
            let diff_re = out.re as i64 - out_rev.re as i64;
            let diff_im = out.im as i64 - out_rev.im as i64;

            let twiddled_real = sum_im * twiddle.re as i64 + diff_re * twiddle.im as i64;
            let twiddled_im = sum_im * twiddle.im as i64 - diff_re * twiddle.re as i64;

            *out = Complex {
                re: rnd_sat_narrow((sum_re << 30) - twiddled_real, 31),
                im: rnd_sat_narrow((diff_im << 30) - twiddled_im, 31),
            };
            *out_rev = Complex {
                re: rnd_sat_narrow((sum_re << 30) + twiddled_real, 31),
                im: rnd_sat_narrow(-twiddled_im - (diff_im << 30), 31),
            };
        }

        // with the fold's 1/2 in place the centermost bin is a bare conjugate
        if scratch.len() % 2 == 1 {
            let center = scratch[half_len / 2];
            scratch[half_len / 2] = Complex {
                re: center.re,
                im: center.im.saturating_neg(),
            };
        }

        let half_shift = self.half.execute(&mut scratch[..half_len], scaling)?;

        for (dst, src) in output.chunks_exact_mut(2).zip(scratch.iter()) {
            dst[0] = src.re;
            dst[1] = src.im;
        }

        Ok(fold_shift_amount + half_shift)
    }

    fn real_length(&self) -> usize {
        self.length
    }

    fn complex_length(&self) -> usize {
        self.complex_length
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::butterflies::testing::reference_dft;
    use rand::Rng;

    fn random_reals(n: usize, magnitude: u32) -> Vec<Q31> {
        let mut rng = rand::rng();
        (0..n)
            .map(|_| rng.random_range(-(1i32 << magnitude)..(1i32 << magnitude)))
            .collect()
    }

    fn to_f64_real(input: &[Q31]) -> Vec<f64> {
        let scale = 1.0 / (1u64 << 31) as f64;
        input.iter().map(|&x| x as f64 * scale).collect()
    }

    #[test]
    fn test_forward_matches_reference() {
        for n in [8usize, 16, 32, 40, 64, 160, 256] {
            let input = random_reals(n, 29);
            let as_complex: Vec<Complex<f64>> = to_f64_real(&input)
                .iter()
                .map(|&x| Complex::new(x, 0.0))
                .collect();
            let reference = reference_dft(&as_complex, false);

            let rfft = R2CBlockFft::install(n).unwrap();
            let mut output = vec![Complex::<Q31>::default(); n / 2 + 1];
            let shift = rfft
                .execute(&input, &mut output, ScalingMode::Dynamic)
                .unwrap();

            let restore = 2f64.powi(shift) / (1u64 << 31) as f64;
            let tolerance = 1e-5 * n as f64;
            for (bin, want) in output.iter().zip(reference.iter()) {
                assert!(
                    (bin.re as f64 * restore - want.re).abs() < tolerance,
                    "n={n} re {} != {}",
                    bin.re as f64 * restore,
                    want.re
                );
                assert!(
                    (bin.im as f64 * restore - want.im).abs() < tolerance,
                    "n={n} im {} != {}",
                    bin.im as f64 * restore,
                    want.im
                );
            }
        }
    }

    #[test]
    fn test_real_round_trip() {
        for n in [8usize, 16, 32, 40, 64, 160, 640] {
            let input = random_reals(n, 28);
            let mut spectrum = vec![Complex::<Q31>::default(); n / 2 + 1];

            let rfft = R2CBlockFft::install(n).unwrap();
            let irfft = C2RBlockFft::install(n).unwrap();

            let s_fwd = rfft
                .execute(&input, &mut spectrum, ScalingMode::Dynamic)
                .unwrap();
            let mut restored = vec![0i32; n];
            let s_inv = irfft
                .execute(&spectrum, &mut restored, ScalingMode::Dynamic)
                .unwrap();

            // round trip gain is (n/2) * 2^-(s_fwd + s_inv)
            let restore = 2f64.powi(s_fwd + s_inv) / (n as f64 / 2.0);
            for (got, want) in to_f64_real(&restored)
                .iter()
                .zip(to_f64_real(&input).iter())
            {
                assert!(
                    (got * restore - want).abs() < 1e-5,
                    "n={n}: {} != {}",
                    got * restore,
                    want
                );
            }
        }
    }

    #[test]
    fn test_length_validation() {
        assert!(R2CBlockFft::install(0).is_err());
        assert!(R2CBlockFft::install(7).is_err());
        assert!(C2RBlockFft::install(12).is_err());

        let rfft = R2CBlockFft::install(16).unwrap();
        let input = random_reals(16, 20);
        let mut bad_output = vec![Complex::<Q31>::default(); 8];
        assert!(rfft
            .execute(&input, &mut bad_output, ScalingMode::Dynamic)
            .is_err());
    }
}
