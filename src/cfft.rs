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
use crate::butterflies::{butterfly4_core, Butterfly4, Butterfly5, Butterfly8, ScaledButterfly};
use crate::err::try_vec;
use crate::q31::{c_mul_q31, c_shift_q31, Q31};
use crate::scaling::{block_headroom, stage_shift, ScalingState};
use crate::twiddles::radix4_twiddles_from_base;
use crate::util::{compute_logarithm, digit_reversed_transpose_4};
use crate::{BlockFftExecutor, FftDirection, QernError, ScalingMode};
use num_complex::Complex;
use num_traits::Zero;

/// Complex block-floating-point FFT over a radix-4 stage walk.
///
/// The transform length factors as `base * 4^a` with a radix-4, radix-5 or
/// radix-8 base butterfly, so every power of two from 4 up and the
/// 20/80/320/1280 family are reachable. Each stage applies one shift to the
/// whole buffer (dynamic mode: whatever the current headroom does not cover;
/// static mode: the stage's full worst-case growth) and the accumulated total
/// is handed back to the caller.
pub(crate) struct BlockFft {
    execution_length: usize,
    direction: FftDirection,
    base: Box<dyn ScaledButterfly>,
    base_len: usize,
    twiddles: Vec<Complex<Q31>>,
}

impl BlockFft {
    pub(crate) fn new(size: usize, fft_direction: FftDirection) -> Result<BlockFft, QernError> {
        if size == 0 {
            return Err(QernError::ZeroSizedFft);
        }

        let base: Box<dyn ScaledButterfly> = if size.is_power_of_two() {
            let exponent = size.trailing_zeros();
            if exponent < 2 {
                return Err(QernError::UnsupportedLength(size));
            }
            if exponent % 2 == 0 {
                Box::new(Butterfly4::new(fft_direction))
            } else {
                Box::new(Butterfly8::new(fft_direction))
            }
        } else if size % 5 == 0 && compute_logarithm(4, size / 5).is_some() {
            Box::new(Butterfly5::new(fft_direction))
        } else {
            return Err(QernError::UnsupportedLength(size));
        };

        let base_len = base.length();
        let twiddles = radix4_twiddles_from_base(base_len, size, fft_direction)?;

        Ok(BlockFft {
            execution_length: size,
            direction: fft_direction,
            base,
            base_len,
            twiddles,
        })
    }

    #[inline]
    fn shift_for(&self, data: &[Complex<Q31>], needed_bits: u32, scaling: ScalingMode) -> i32 {
        match scaling {
            ScalingMode::Dynamic => stage_shift(block_headroom(data), needed_bits),
            ScalingMode::Static => needed_bits as i32,
        }
    }
}

impl BlockFftExecutor for BlockFft {
    fn execute(&self, in_place: &mut [Complex<Q31>], scaling: ScalingMode) -> Result<i32, QernError> {
        let mut scratch = try_vec![Complex::<Q31>::zero(); self.execution_length];
        self.execute_with_scratch(in_place, &mut scratch, scaling)
    }

    fn execute_with_scratch(
        &self,
        in_place: &mut [Complex<Q31>],
        scratch: &mut [Complex<Q31>],
        scaling: ScalingMode,
    ) -> Result<i32, QernError> {
        if in_place.len() != self.execution_length {
            return Err(QernError::InvalidInPlaceLength(
                self.execution_length,
                in_place.len(),
            ));
        }
        if scratch.len() < self.scratch_len() {
            return Err(QernError::ScratchBufferIsTooSmall(
                scratch.len(),
                self.scratch_len(),
            ));
        }

        let mut scaling_state = ScalingState::new();
        let scratch = &mut scratch[..self.execution_length];

        // Digit-reversal permutation so the cross stages emit natural order
        scratch.copy_from_slice(in_place);
        digit_reversed_transpose_4(self.base_len, scratch, in_place);

        let base_shift = self.shift_for(in_place, self.base.growth_bits(), scaling);
        self.base.execute_scaled(in_place, base_shift);
        scaling_state.advance(base_shift);

        let mut len = self.base_len;

        unsafe {
            let mut m_twiddles = self.twiddles.as_slice();

            while len < self.execution_length {
                let columns = len;
                len *= 4;
                let quarter = len / 4;

                let shift = self.shift_for(in_place, 2, scaling);

                for data in in_place.chunks_exact_mut(len) {
                    for j in 0..quarter {
                        let a = c_shift_q31(*data.get_unchecked(j), shift);
                        let b = c_mul_q31(
                            c_shift_q31(*data.get_unchecked(j + quarter), shift),
                            *m_twiddles.get_unchecked(3 * j),
                        );
                        let c = c_mul_q31(
                            c_shift_q31(*data.get_unchecked(j + 2 * quarter), shift),
                            *m_twiddles.get_unchecked(3 * j + 1),
                        );
                        let d = c_mul_q31(
                            c_shift_q31(*data.get_unchecked(j + 3 * quarter), shift),
                            *m_twiddles.get_unchecked(3 * j + 2),
                        );

                        let (y0, y1, y2, y3) = butterfly4_core(a, b, c, d, self.direction);

                        *data.get_unchecked_mut(j) = y0;
                        *data.get_unchecked_mut(j + quarter) = y1;
                        *data.get_unchecked_mut(j + 2 * quarter) = y2;
                        *data.get_unchecked_mut(j + 3 * quarter) = y3;
                    }
                }

                m_twiddles = &m_twiddles[columns * 3..];
                scaling_state.advance(shift);
            }
        }

        Ok(scaling_state.total())
    }

    fn direction(&self) -> FftDirection {
        self.direction
    }

    fn length(&self) -> usize {
        self.execution_length
    }

    fn scratch_len(&self) -> usize {
        self.execution_length
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::butterflies::testing::{reference_dft, to_f64};
    use rand::Rng;

    fn random_block(n: usize, magnitude: u32) -> Vec<Complex<Q31>> {
        let mut rng = rand::rng();
        (0..n)
            .map(|_| Complex {
                re: rng.random_range(-(1i32 << magnitude)..(1i32 << magnitude)),
                im: rng.random_range(-(1i32 << magnitude)..(1i32 << magnitude)),
            })
            .collect()
    }

    fn assert_matches_reference(n: usize, scaling: ScalingMode) {
        let mut input = random_block(n, 29);
        let reference = reference_dft(&to_f64(&input), false);

        let fft = BlockFft::new(n, FftDirection::Forward).unwrap();
        let total_shift = fft.execute(&mut input, scaling).unwrap();

        let restore = 2f64.powi(total_shift);
        let tolerance = 1e-5 * n as f64;
        for (got, want) in to_f64(&input).iter().zip(reference.iter()) {
            assert!(
                (got.re * restore - want.re).abs() < tolerance,
                "n={n} re {} != {}",
                got.re * restore,
                want.re
            );
            assert!(
                (got.im * restore - want.im).abs() < tolerance,
                "n={n} im {} != {}",
                got.im * restore,
                want.im
            );
        }
    }

    #[test]
    fn test_forward_matches_reference_dynamic() {
        for n in [4usize, 8, 16, 20, 32, 64, 80, 128, 256, 320] {
            assert_matches_reference(n, ScalingMode::Dynamic);
        }
    }

    #[test]
    fn test_forward_matches_reference_static() {
        for n in [4usize, 8, 16, 20, 64, 320] {
            assert_matches_reference(n, ScalingMode::Static);
        }
    }

    #[test]
    fn test_round_trip_all_sizes() {
        for n in [4usize, 8, 16, 20, 32, 64, 80, 128, 256, 320, 1024, 1280] {
            let mut data = random_block(n, 28);
            let src = data.to_vec();

            let forward = BlockFft::new(n, FftDirection::Forward).unwrap();
            let inverse = BlockFft::new(n, FftDirection::Inverse).unwrap();

            let s_fwd = forward.execute(&mut data, ScalingMode::Dynamic).unwrap();
            let s_inv = inverse.execute(&mut data, ScalingMode::Dynamic).unwrap();

            // round trip gain is n * 2^-(s_fwd + s_inv)
            let restore = 2f64.powi(s_fwd + s_inv) / n as f64;
            for (got, want) in to_f64(&data).iter().zip(to_f64(&src).iter()) {
                assert!(
                    (got.re * restore - want.re).abs() < 1e-5,
                    "n={n}: {} != {}",
                    got.re * restore,
                    want.re
                );
                assert!(
                    (got.im * restore - want.im).abs() < 1e-5,
                    "n={n}: {} != {}",
                    got.im * restore,
                    want.im
                );
            }
        }
    }

    #[test]
    fn test_unsupported_lengths_rejected() {
        for n in [0usize, 1, 2, 3, 6, 10, 25, 48, 100] {
            assert!(BlockFft::new(n, FftDirection::Forward).is_err(), "n={n}");
        }
    }

    #[test]
    fn test_pure_tone_concentrates_in_one_bin() {
        // x[n] = exp(2*pi*i*8n/64) scaled to half range
        let n = 64usize;
        let mut input: Vec<Complex<Q31>> = (0..n)
            .map(|j| {
                let angle = 2.0 * std::f64::consts::PI * 8.0 * j as f64 / n as f64;
                Complex {
                    re: crate::q31::quantize_q31(0.5 * angle.cos()),
                    im: crate::q31::quantize_q31(0.5 * angle.sin()),
                }
            })
            .collect();

        let fft = BlockFft::new(n, FftDirection::Forward).unwrap();
        fft.execute(&mut input, ScalingMode::Dynamic).unwrap();

        let energy: Vec<f64> = to_f64(&input)
            .iter()
            .map(|z| z.re * z.re + z.im * z.im)
            .collect();
        let total: f64 = energy.iter().sum();
        assert!(
            energy[8] / total > 0.99,
            "bin 8 carries {} of {total}",
            energy[8]
        );
        let peak = energy[8];
        for (k, e) in energy.iter().enumerate() {
            if k != 8 {
                assert!(*e < peak * 1e-4, "leakage at bin {k}: {e} vs peak {peak}");
            }
        }
    }

    #[test]
    fn test_scratch_validation() {
        let fft = BlockFft::new(64, FftDirection::Forward).unwrap();
        let mut data = random_block(64, 20);
        let mut scratch = vec![Complex::<Q31>::default(); 63];
        assert!(matches!(
            fft.execute_with_scratch(&mut data, &mut scratch, ScalingMode::Dynamic),
            Err(QernError::ScratchBufferIsTooSmall(63, 64))
        ));

        let mut short = random_block(32, 20);
        assert!(fft.execute(&mut short, ScalingMode::Dynamic).is_err());
    }
}
