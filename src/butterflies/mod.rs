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
use crate::q31::{c_sat_add, c_sat_sub, Q31};
use crate::FftDirection;
use num_complex::Complex;

mod bf4;
mod bf5;
mod bf8;

pub(crate) use bf4::Butterfly4;
pub(crate) use bf5::Butterfly5;
pub(crate) use bf8::Butterfly8;

/// A short DFT kernel used as the base of the radix-4 stage walk. The shift
/// is applied to every sample at load time, before any combination, so the
/// kernel's bit growth lands inside the headroom the caller arranged.
pub(crate) trait ScaledButterfly: Send + Sync {
    fn length(&self) -> usize;
    /// Binary orders of magnitude one application can add.
    fn growth_bits(&self) -> u32;
    fn execute_scaled(&self, in_place: &mut [Complex<Q31>], shift: i32);
}

/// Multiply by -j (forward) or +j (inverse). Saturating negation: the lone
/// unrepresentable case -(-1.0) clips one LSB short instead of wrapping.
#[inline(always)]
pub(crate) fn rotate_90(value: Complex<Q31>, direction: FftDirection) -> Complex<Q31> {
    match direction {
        FftDirection::Forward => Complex {
            re: value.im,
            im: value.re.saturating_neg(),
        },
        FftDirection::Inverse => Complex {
            re: value.im.saturating_neg(),
            im: value.re,
        },
    }
}

/// The radix-4 sum/difference network shared by the radix-4 and radix-8
/// kernels.
#[inline(always)]
pub(crate) fn butterfly4_core(
    u0: Complex<Q31>,
    u1: Complex<Q31>,
    u2: Complex<Q31>,
    u3: Complex<Q31>,
    direction: FftDirection,
) -> (Complex<Q31>, Complex<Q31>, Complex<Q31>, Complex<Q31>) {
    let t0 = c_sat_add(u0, u2);
    let t1 = c_sat_sub(u0, u2);
    let t2 = c_sat_add(u1, u3);
    let t3 = rotate_90(c_sat_sub(u1, u3), direction);

    (
        c_sat_add(t0, t2),
        c_sat_add(t1, t3),
        c_sat_sub(t0, t2),
        c_sat_sub(t1, t3),
    )
}

#[cfg(test)]
pub(crate) mod testing {
    use num_complex::Complex;

    /// Naive reference DFT over f64 images of Q31 samples.
    pub(crate) fn reference_dft(input: &[Complex<f64>], inverse: bool) -> Vec<Complex<f64>> {
        let n = input.len();
        let sign = if inverse { 1.0 } else { -1.0 };
        (0..n)
            .map(|k| {
                let mut acc = Complex::new(0.0, 0.0);
                for (j, x) in input.iter().enumerate() {
                    let angle = sign * 2.0 * std::f64::consts::PI * (k * j) as f64 / n as f64;
                    acc += x * Complex::new(angle.cos(), angle.sin());
                }
                acc
            })
            .collect()
    }

    pub(crate) fn to_f64(input: &[Complex<i32>]) -> Vec<Complex<f64>> {
        let scale = 1.0 / (1u64 << 31) as f64;
        input
            .iter()
            .map(|z| Complex::new(z.re as f64 * scale, z.im as f64 * scale))
            .collect()
    }
}
