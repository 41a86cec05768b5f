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

//! Cholesky-based linear least squares over Q31 storage: regularized
//! normal-equation preprocessing, the R'R factorization with reciprocal
//! diagonals, and the forward/backward triangular substitutions.
//!
//! Dot products accumulate in i64 (Q62) before one rounded narrowing; each
//! diagonal reciprocal carries its own exponent so no substitution divides.

use crate::err::try_vec;
use crate::q31::{rnd_sat_narrow, Q31, Q31_MAX, Q31_MIN};
use crate::recip::rsqrt_q62_wide;
use crate::QernError;

/// Upper-triangular Cholesky factor R of A = R'R, packed row-major with only
/// the entries at or above the diagonal.
#[derive(Debug, Clone)]
pub struct TriangularFactor {
    data: Vec<Q31>,
    order: usize,
}

impl TriangularFactor {
    #[inline]
    pub(crate) fn index(&self, row: usize, col: usize) -> usize {
        debug_assert!(row <= col && col < self.order);
        row * self.order - row * (row + 1) / 2 + col
    }

    #[inline]
    pub fn at(&self, row: usize, col: usize) -> Q31 {
        self.data[self.index(row, col)]
    }

    pub fn order(&self) -> usize {
        self.order
    }
}

/// Per-row reciprocal of the factor diagonal: 1/R[n,n] as a Q30 mantissa and
/// a separate exponent.
#[derive(Debug, Clone)]
pub struct DiagonalReciprocal {
    mantissas: Vec<Q31>,
    exponents: Vec<i32>,
}

impl DiagonalReciprocal {
    pub fn order(&self) -> usize {
        self.mantissas.len()
    }
}

/// Regularized normal equations: G = A'A + sigma2*I and Z = A'B, each as Q31
/// mantissas under one block exponent.
#[derive(Debug, Clone)]
pub struct NormalEquations {
    pub gram: Vec<Q31>,
    pub gram_exponent: i32,
    pub rhs: Vec<Q31>,
    pub rhs_exponent: i32,
    pub order: usize,
    pub rhs_cols: usize,
}

/// Narrow a block of Q62 accumulators to Q31 mantissas under one exponent.
/// `target_lead` places the largest entry: 30 fills the mantissa, 29 leaves a
/// spare bit of headroom.
fn normalize_wide_q62(block: &[i64], extra_exponent: i32, target_lead: i32) -> (Vec<i32>, i32) {
    let max_mag = block.iter().map(|v| v.unsigned_abs()).max().unwrap_or(0);
    if max_mag == 0 {
        return (vec![0; block.len()], 0);
    }
    let lead = 63 - max_mag.leading_zeros() as i32;
    let s = lead - target_lead;
    let mantissas = block
        .iter()
        .map(|&v| {
            if s > 0 {
                rnd_sat_narrow(v, s as u32)
            } else {
                (v << (-s) as u32) as i32
            }
        })
        .collect();
    (mantissas, s - 31 + extra_exponent)
}

/// Build the regularized normal equations for a least-squares problem: the
/// Gram matrix A'A with sigma2 added along the diagonal, and the projected
/// right-hand side A'B. `a` is rows x cols row-major, `b` rows x rhs_cols.
pub fn cholesky_preprocess(
    a: &[Q31],
    rows: usize,
    cols: usize,
    b: &[Q31],
    rhs_cols: usize,
    sigma2: Q31,
) -> Result<NormalEquations, QernError> {
    if a.len() != rows * cols {
        return Err(QernError::MatrixSizeMismatch(rows * cols, a.len()));
    }
    if b.len() != rows * rhs_cols {
        return Err(QernError::RhsSizeMismatch(rows * rhs_cols, b.len()));
    }

    // products shrink by the accumulation depth so row sums stay inside i64
    let depth_bits = usize::BITS - rows.max(1).leading_zeros();
    let round = 1i64 << (depth_bits - 1);

    let mut gram_wide = try_vec![0i64; cols * cols];
    for i in 0..cols {
        for j in i..cols {
            let mut acc = 0i64;
            for k in 0..rows {
                let p = a[k * cols + i] as i64 * a[k * cols + j] as i64;
                acc += (p + round) >> depth_bits;
            }
            if i == j {
                acc += ((sigma2 as i64) << 31) >> depth_bits;
            }
            gram_wide[i * cols + j] = acc;
            gram_wide[j * cols + i] = acc;
        }
    }

    let mut rhs_wide = try_vec![0i64; cols * rhs_cols];
    for i in 0..cols {
        for c in 0..rhs_cols {
            let mut acc = 0i64;
            for k in 0..rows {
                let p = a[k * cols + i] as i64 * b[k * rhs_cols + c] as i64;
                acc += (p + round) >> depth_bits;
            }
            rhs_wide[i * rhs_cols + c] = acc;
        }
    }

    // the right-hand side keeps a spare bit so the substitutions, which
    // divide by sub-unit diagonals, have room before saturating
    let (gram, gram_exponent) = normalize_wide_q62(&gram_wide, depth_bits as i32, 30);
    let (rhs, rhs_exponent) = normalize_wide_q62(&rhs_wide, depth_bits as i32, 29);

    Ok(NormalEquations {
        gram,
        gram_exponent,
        rhs,
        rhs_exponent,
        order: cols,
        rhs_cols,
    })
}

// acc is Q62; the reciprocal pair scales it by (m/2^30) * 2^e in one rounded
// narrowing back to Q31
#[inline]
fn scale_by_reciprocal(acc: i64, mantissa: i32, exponent: i32) -> i32 {
    let q = (acc + (1 << 30)) >> 31;
    let wide = q * mantissa as i64;
    let shift = 30 - exponent;
    if shift > 0 {
        rnd_sat_narrow(wide, shift as u32)
    } else if wide > Q31_MAX as i64 {
        Q31_MAX
    } else if wide < Q31_MIN as i64 {
        Q31_MIN
    } else {
        wide as i32
    }
}

/// Cholesky factorization G = R'R of a symmetric positive-definite Q31
/// matrix, with the diagonal reciprocals computed on the way through a
/// Newton-Raphson reciprocal square root.
///
/// A non-positive diagonal encountered mid-factorization is numeric
/// degeneracy, not an error: the row gets a zero diagonal and a saturated
/// reciprocal, and the factorization continues deterministically.
pub fn cholesky_decompose(
    gram: &[Q31],
    order: usize,
) -> Result<(TriangularFactor, DiagonalReciprocal), QernError> {
    if gram.len() != order * order {
        return Err(QernError::NonSquareMatrix(gram.len()));
    }

    let mut r = TriangularFactor {
        data: try_vec![0i32; order * (order + 1) / 2],
        order,
    };
    let mut d = DiagonalReciprocal {
        mantissas: try_vec![0i32; order],
        exponents: try_vec![0i32; order],
    };

    for i in 0..order {
        // diagonal first: t = g[i][i] - sum of squares above it
        let mut t = (gram[i * order + i] as i64) << 31;
        for k in 0..i {
            let v = r.data[r.index(k, i)] as i64;
            t -= v * v;
        }

        let (ym, ye) = rsqrt_q62_wide(t);
        if t <= 0 {
            // degenerate pivot: zero diagonal, saturated reciprocal
            d.mantissas[i] = ym;
            d.exponents[i] = ye;
            continue;
        }

        let p = (t + (1 << 30)) >> 31;
        let idx = r.index(i, i);
        r.data[idx] = rnd_sat_narrow(p * ym as i64, (30 - ye) as u32);
        d.mantissas[i] = ym;
        d.exponents[i] = ye;

        for j in (i + 1)..order {
            let mut acc = (gram[i * order + j] as i64) << 31;
            for k in 0..i {
                acc -= r.data[r.index(k, i)] as i64 * r.data[r.index(k, j)] as i64;
            }
            let idx = r.index(i, j);
            r.data[idx] = scale_by_reciprocal(acc, ym, ye);
        }
    }

    Ok((r, d))
}

/// Forward substitution R'y = Z, row by row. R is accessed by column since
/// the system matrix is the transposed factor; row n needs every earlier
/// row's result, so the walk is strictly sequential. Right-hand-side columns
/// are independent.
pub fn cholesky_forward_substitute(
    r: &TriangularFactor,
    d: &DiagonalReciprocal,
    z: &[Q31],
    rhs_cols: usize,
) -> Result<Vec<Q31>, QernError> {
    let order = r.order();
    if d.order() != order {
        return Err(QernError::NonSquareMatrix(d.order()));
    }
    if z.len() != order * rhs_cols {
        return Err(QernError::RhsSizeMismatch(order * rhs_cols, z.len()));
    }

    let mut y = try_vec![0i32; order * rhs_cols];
    for n in 0..order {
        for c in 0..rhs_cols {
            let mut acc = (z[n * rhs_cols + c] as i64) << 31;
            for m in 0..n {
                acc -= r.data[r.index(m, n)] as i64 * y[m * rhs_cols + c] as i64;
            }
            y[n * rhs_cols + c] = scale_by_reciprocal(acc, d.mantissas[n], d.exponents[n]);
        }
    }
    Ok(y)
}

/// Backward substitution Rx = y: the same recurrence run in reverse row
/// order over the factor's rows.
pub fn cholesky_backward_substitute(
    r: &TriangularFactor,
    d: &DiagonalReciprocal,
    y: &[Q31],
    rhs_cols: usize,
) -> Result<Vec<Q31>, QernError> {
    let order = r.order();
    if d.order() != order {
        return Err(QernError::NonSquareMatrix(d.order()));
    }
    if y.len() != order * rhs_cols {
        return Err(QernError::RhsSizeMismatch(order * rhs_cols, y.len()));
    }

    let mut x = try_vec![0i32; order * rhs_cols];
    for n in (0..order).rev() {
        for c in 0..rhs_cols {
            let mut acc = (y[n * rhs_cols + c] as i64) << 31;
            for m in (n + 1)..order {
                acc -= r.data[r.index(n, m)] as i64 * x[m * rhs_cols + c] as i64;
            }
            x[n * rhs_cols + c] = scale_by_reciprocal(acc, d.mantissas[n], d.exponents[n]);
        }
    }
    Ok(x)
}

/// Least-squares entry point: preprocess, factorize, and run both
/// substitutions. Returns the solution mantissas of (A'A + sigma2 I) X = A'B
/// and the exponent reconstructing their true magnitude.
pub fn cholesky_solve(
    a: &[Q31],
    rows: usize,
    cols: usize,
    b: &[Q31],
    rhs_cols: usize,
    sigma2: Q31,
) -> Result<(Vec<Q31>, i32), QernError> {
    let normal = cholesky_preprocess(a, rows, cols, b, rhs_cols, sigma2)?;
    let (r, d) = cholesky_decompose(&normal.gram, normal.order)?;
    let y = cholesky_forward_substitute(&r, &d, &normal.rhs, rhs_cols)?;
    let x = cholesky_backward_substitute(&r, &d, &y, rhs_cols)?;
    Ok((x, normal.rhs_exponent - normal.gram_exponent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::q31::quantize_q31;
    use rand::Rng;

    fn to_f64(m: &[Q31]) -> Vec<f64> {
        m.iter().map(|&v| v as f64 / (1u64 << 31) as f64).collect()
    }

    fn quantize(m: &[f64]) -> Vec<Q31> {
        m.iter().map(|&v| quantize_q31(v)).collect()
    }

    /// Random SPD matrix with unit-ish scale, built as L L' from a random
    /// lower-triangular factor with positive diagonal.
    fn random_spd(order: usize, rng: &mut impl Rng) -> Vec<f64> {
        let mut l = vec![0f64; order * order];
        for i in 0..order {
            for j in 0..=i {
                l[i * order + j] = if i == j {
                    rng.random_range(0.35..0.6)
                } else {
                    rng.random_range(-0.15..0.15)
                };
            }
        }
        let mut g = vec![0f64; order * order];
        for i in 0..order {
            for j in 0..order {
                let mut acc = 0.0;
                for k in 0..order {
                    acc += l[i * order + k] * l[j * order + k];
                }
                g[i * order + j] = acc;
            }
        }
        g
    }

    /// Plain f64 Gaussian elimination for reference solutions.
    fn reference_solve(a: &[f64], b: &[f64], n: usize, p: usize) -> Vec<f64> {
        let mut m = a.to_vec();
        let mut rhs = b.to_vec();
        for k in 0..n {
            let mut pivot_row = k;
            for i in (k + 1)..n {
                if m[i * n + k].abs() > m[pivot_row * n + k].abs() {
                    pivot_row = i;
                }
            }
            for j in 0..n {
                m.swap(k * n + j, pivot_row * n + j);
            }
            for j in 0..p {
                rhs.swap(k * p + j, pivot_row * p + j);
            }
            let pivot = m[k * n + k];
            for i in 0..n {
                if i == k {
                    continue;
                }
                let f = m[i * n + k] / pivot;
                for j in 0..n {
                    m[i * n + j] -= f * m[k * n + j];
                }
                for j in 0..p {
                    rhs[i * p + j] -= f * rhs[k * p + j];
                }
            }
        }
        (0..n * p)
            .map(|idx| rhs[idx] / m[(idx / p) * n + (idx / p)])
            .collect()
    }

    #[test]
    fn test_decompose_reconstructs_gram() {
        let mut rng = rand::rng();
        for order in [2usize, 4, 8] {
            let g = random_spd(order, &mut rng);
            let (r, _) = cholesky_decompose(&quantize(&g), order).unwrap();

            for i in 0..order {
                for j in i..order {
                    let mut acc = 0.0;
                    for k in 0..=i {
                        let rki = r.at(k, i) as f64 / (1u64 << 31) as f64;
                        let rkj = r.at(k, j) as f64 / (1u64 << 31) as f64;
                        acc += rki * rkj;
                    }
                    assert!(
                        (acc - g[i * order + j]).abs() < 1e-6,
                        "order {order}: G[{i}][{j}] {} != {}",
                        acc,
                        g[i * order + j]
                    );
                }
            }
        }
    }

    #[test]
    fn test_degenerate_diagonal_continues() {
        // all-zero gram: every pivot is degenerate, nothing panics
        let gram = vec![0i32; 16];
        let (r, d) = cholesky_decompose(&gram, 4).unwrap();
        assert_eq!(d.order(), 4);
        for i in 0..4 {
            assert_eq!(r.at(i, i), 0);
        }
    }

    #[test]
    fn test_solve_4x4_against_reference() {
        // diagonally dominant SPD system with an identity right-hand side
        let n = 4usize;
        let mut a = vec![0f64; n * n];
        for i in 0..n {
            for j in 0..n {
                a[i * n + j] = if i == j { 0.45 } else { 0.02 };
            }
        }
        let mut b = vec![0f64; n * n];
        for i in 0..n {
            b[i * n + i] = 0.25;
        }

        let (x, exponent) = cholesky_solve(&quantize(&a), n, n, &quantize(&b), n, 0).unwrap();

        // reference: (A'A) X = A'B in f64
        let mut gram = vec![0f64; n * n];
        let mut rhs = vec![0f64; n * n];
        for i in 0..n {
            for j in 0..n {
                for k in 0..n {
                    gram[i * n + j] += a[k * n + i] * a[k * n + j];
                    rhs[i * n + j] += a[k * n + i] * b[k * n + j];
                }
            }
        }
        let want = reference_solve(&gram, &rhs, n, n);

        let scale = 2f64.powi(exponent);
        for (got, want) in to_f64(&x).iter().zip(want.iter()) {
            assert!(
                (got * scale - want).abs() < 1e-5,
                "{} != {want}",
                got * scale
            );
        }
    }

    #[test]
    fn test_left_inverse_property() {
        let mut rng = rand::rng();
        let n = 6usize;
        // strongly diagonally dominant so the scaled left-inverse stays
        // inside the mantissa range
        let mut l = vec![0f64; n * n];
        for i in 0..n {
            for j in 0..=i {
                l[i * n + j] = if i == j {
                    rng.random_range(0.5..0.6)
                } else {
                    rng.random_range(-0.02..0.02)
                };
            }
        }
        let mut a = vec![0f64; n * n];
        for i in 0..n {
            for j in 0..n {
                for k in 0..n {
                    a[i * n + j] += l[i * n + k] * l[j * n + k];
                }
            }
        }
        let mut identity = vec![0f64; n * n];
        for i in 0..n {
            identity[i * n + i] = 0.1;
        }

        let (x, exponent) = cholesky_solve(&quantize(&a), n, n, &quantize(&identity), n, 0).unwrap();

        // X should satisfy A X ~= B up to the returned exponent, i.e. X is
        // 0.1 * A^-1 for a symmetric A
        let xf = to_f64(&x);
        let scale = 2f64.powi(exponent);
        for i in 0..n {
            for j in 0..n {
                let mut acc = 0.0;
                for k in 0..n {
                    acc += a[i * n + k] * xf[k * n + j] * scale;
                }
                let want = if i == j { 0.1 } else { 0.0 };
                assert!((acc - want).abs() < 1e-4, "AX[{i}][{j}] = {acc} != {want}");
            }
        }
    }

    #[test]
    fn test_dimension_validation() {
        assert!(cholesky_decompose(&[0; 6], 4).is_err());
        let (r, d) = cholesky_decompose(&[1 << 28; 1], 1).unwrap();
        assert!(cholesky_forward_substitute(&r, &d, &[0; 3], 2).is_err());
    }
}
