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

//! Fixed-point block-floating-point signal kernels: complex and real FFTs
//! over Q0.31 samples with per-stage scaling, a Cholesky least-squares
//! solver, and Gauss-Jordan elimination for general systems.
//!
//! Every transform tracks the shifts it applied and returns the total, so
//! the caller can reconstruct true magnitudes:
//!
//! ```
//! use num_complex::Complex;
//! use qern::{BlockFftExecutor, Qern, ScalingMode};
//!
//! let fft = Qern::plan_forward_fft(64)?;
//! let mut data = vec![Complex::<i32>::new(1 << 28, 0); 64];
//! let total_shift = fft.execute(&mut data, ScalingMode::Dynamic)?;
//! // bin 0 now holds 64 * 2^28 scaled down by 2^total_shift
//! # Ok::<(), qern::QernError>(())
//! ```
//!
//! The matrix side works on caller-owned slices and returns Q31 mantissas
//! with an exponent:
//!
//! ```
//! use qern::gauss_jordan_invert;
//!
//! let a = vec![1 << 29, 0, 0, 1 << 29]; // 0.25 * I
//! let (inv, exponent) = gauss_jordan_invert(&a, 2)?;
//! // inv * 2^exponent is 4 * I
//! # Ok::<(), qern::QernError>(())
//! ```

mod butterflies;
mod cfft;
mod cholesky;
mod err;
mod gauss_jordan;
mod q31;
mod recip;
mod rfft;
mod scaling;
mod twiddles;
mod util;

pub use cholesky::{
    cholesky_backward_substitute, cholesky_decompose, cholesky_forward_substitute,
    cholesky_preprocess, cholesky_solve, DiagonalReciprocal, NormalEquations, TriangularFactor,
};
pub use err::QernError;
pub use gauss_jordan::{
    gauss_jordan_invert, gauss_jordan_invert_complex, gauss_jordan_scratch_len, gauss_jordan_solve,
    gauss_jordan_solve_complex,
};
pub use q31::Q31;
pub use scaling::{block_shift, block_shift_real, complex_block_headroom, real_block_headroom};

use crate::cfft::BlockFft;
use crate::rfft::{C2RBlockFft, R2CBlockFft};
use num_complex::Complex;

/// Transform direction. The inverse applies conjugated twiddles and no 1/N
/// normalization: a forward/inverse round trip carries a gain of N scaled by
/// the two returned shift totals.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub enum FftDirection {
    Forward,
    Inverse,
}

/// Per-stage scaling policy.
///
/// `Dynamic` measures block headroom before each stage and shifts only what
/// the headroom does not cover (shifting left when there is slack to
/// reclaim). `Static` always shifts by the stage's worst-case growth, which
/// keeps the shift total independent of the data.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub enum ScalingMode {
    Static,
    Dynamic,
}

/// In-place complex block-floating-point FFT.
pub trait BlockFftExecutor {
    /// Runs the transform and returns the total right shift applied across
    /// all stages (negative totals mean a net left shift).
    fn execute(&self, in_place: &mut [Complex<Q31>], scaling: ScalingMode)
        -> Result<i32, QernError>;
    /// Same with a caller-owned scratch buffer of at least `scratch_len()`
    /// elements.
    fn execute_with_scratch(
        &self,
        in_place: &mut [Complex<Q31>],
        scratch: &mut [Complex<Q31>],
        scaling: ScalingMode,
    ) -> Result<i32, QernError>;
    fn direction(&self) -> FftDirection;
    fn length(&self) -> usize;
    fn scratch_len(&self) -> usize;
}

/// Real-to-complex forward FFT: N reals in, N/2+1 spectrum bins out.
pub trait R2CBlockFftExecutor {
    fn execute(
        &self,
        input: &[Q31],
        output: &mut [Complex<Q31>],
        scaling: ScalingMode,
    ) -> Result<i32, QernError>;
    fn real_length(&self) -> usize;
    fn complex_length(&self) -> usize;
}

/// Complex-to-real inverse FFT: N/2+1 spectrum bins in, N reals out.
pub trait C2RBlockFftExecutor {
    fn execute(
        &self,
        input: &[Complex<Q31>],
        output: &mut [Q31],
        scaling: ScalingMode,
    ) -> Result<i32, QernError>;
    fn real_length(&self) -> usize;
    fn complex_length(&self) -> usize;
}

/// Scratch element count for a complex transform of length `n`.
pub fn cfft_scratch_len(n: usize) -> usize {
    n
}

/// Staging element count for a real transform of length `n` (the inverse
/// path copies the half spectrum before folding it).
pub fn real_fft_scratch_len(n: usize) -> usize {
    n / 2 + 1
}

pub struct Qern {}

impl Qern {
    /// Plans a forward complex FFT. Supported lengths factor into radix-4
    /// stages over a radix-4, radix-5 or radix-8 base: every power of two
    /// from 4 up, plus 5, 20, 80, 320, 1280 and so on.
    pub fn plan_forward_fft(
        n: usize,
    ) -> Result<Box<dyn BlockFftExecutor + Send + Sync>, QernError> {
        BlockFft::new(n, FftDirection::Forward)
            .map(|x| Box::new(x) as Box<dyn BlockFftExecutor + Send + Sync>)
    }

    pub fn plan_inverse_fft(
        n: usize,
    ) -> Result<Box<dyn BlockFftExecutor + Send + Sync>, QernError> {
        BlockFft::new(n, FftDirection::Inverse)
            .map(|x| Box::new(x) as Box<dyn BlockFftExecutor + Send + Sync>)
    }

    /// Plans a forward real FFT of even length `n` whose half length is a
    /// supported complex size.
    pub fn plan_real_forward_fft(
        n: usize,
    ) -> Result<Box<dyn R2CBlockFftExecutor + Send + Sync>, QernError> {
        R2CBlockFft::install(n).map(|x| Box::new(x) as Box<dyn R2CBlockFftExecutor + Send + Sync>)
    }

    pub fn plan_real_inverse_fft(
        n: usize,
    ) -> Result<Box<dyn C2RBlockFftExecutor + Send + Sync>, QernError> {
        C2RBlockFft::install(n).map(|x| Box::new(x) as Box<dyn C2RBlockFftExecutor + Send + Sync>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn to_f64(input: &[Complex<Q31>]) -> Vec<Complex<f64>> {
        let scale = 1.0 / (1u64 << 31) as f64;
        input
            .iter()
            .map(|z| Complex::new(z.re as f64 * scale, z.im as f64 * scale))
            .collect()
    }

    fn random_block(n: usize, magnitude: u32) -> Vec<Complex<Q31>> {
        let mut rng = rand::rng();
        (0..n)
            .map(|_| Complex {
                re: rng.random_range(-(1i32 << magnitude)..(1i32 << magnitude)),
                im: rng.random_range(-(1i32 << magnitude)..(1i32 << magnitude)),
            })
            .collect()
    }

    #[test]
    fn test_linearity_after_shift_alignment() {
        let n = 256usize;
        let x = random_block(n, 28);
        let y = random_block(n, 28);
        let z: Vec<Complex<Q31>> = x
            .iter()
            .zip(y.iter())
            .map(|(a, b)| Complex {
                re: a.re + b.re,
                im: a.im + b.im,
            })
            .collect();

        let fft = Qern::plan_forward_fft(n).unwrap();
        let mut fx = x.to_vec();
        let mut fy = y.to_vec();
        let mut fz = z.to_vec();
        let sx = fft.execute(&mut fx, ScalingMode::Dynamic).unwrap();
        let sy = fft.execute(&mut fy, ScalingMode::Dynamic).unwrap();
        let sz = fft.execute(&mut fz, ScalingMode::Dynamic).unwrap();

        let (fx, fy, fz) = (to_f64(&fx), to_f64(&fy), to_f64(&fz));
        for i in 0..n {
            let want = fx[i] * 2f64.powi(sx) + fy[i] * 2f64.powi(sy);
            let got = fz[i] * 2f64.powi(sz);
            assert!(
                (got - want).norm() < 1e-4,
                "bin {i}: {got} != {want}"
            );
        }
    }

    #[test]
    fn test_parseval_energy_balance() {
        let n = 128usize;
        let input = random_block(n, 29);
        let time_energy: f64 = to_f64(&input).iter().map(|z| z.norm_sqr()).sum();

        let fft = Qern::plan_forward_fft(n).unwrap();
        let mut spectrum = input.to_vec();
        let shift = fft.execute(&mut spectrum, ScalingMode::Dynamic).unwrap();

        let restore = 2f64.powi(shift);
        let freq_energy: f64 = to_f64(&spectrum)
            .iter()
            .map(|z| (z * restore).norm_sqr())
            .sum();

        let ratio = freq_energy / (n as f64 * time_energy);
        assert!((ratio - 1.0).abs() < 1e-4, "Parseval ratio {ratio}");
    }

    #[test]
    fn test_static_mode_shift_is_data_independent() {
        let n = 64usize;
        let fft = Qern::plan_forward_fft(n).unwrap();

        let mut quiet = vec![Complex::<Q31>::new(1, 0); n];
        let mut loud = random_block(n, 30);
        let s_quiet = fft.execute(&mut quiet, ScalingMode::Static).unwrap();
        let s_loud = fft.execute(&mut loud, ScalingMode::Static).unwrap();
        assert_eq!(s_quiet, s_loud);
        // radix-4 base plus two radix-4 cross stages, 2 bits each
        assert_eq!(s_quiet, 6);
    }

    #[test]
    fn test_planner_surface() {
        assert!(Qern::plan_forward_fft(320).is_ok());
        assert!(Qern::plan_inverse_fft(1024).is_ok());
        assert!(Qern::plan_real_forward_fft(640).is_ok());
        assert!(Qern::plan_real_inverse_fft(40).is_ok());
        assert!(Qern::plan_forward_fft(12).is_err());
        assert!(Qern::plan_real_forward_fft(24).is_err());
        assert_eq!(cfft_scratch_len(256), 256);
        assert_eq!(real_fft_scratch_len(64), 33);
    }
}
