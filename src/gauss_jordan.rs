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

//! Gauss-Jordan elimination with per-step row pivoting over an augmented
//! [A | B] matrix, for general real or complex systems and inversion.
//!
//! The working matrix lives in i64 at Q31 with renormalization before every
//! elimination step; the pivot reciprocal comes from Newton-Raphson, never a
//! division. Precision drifts a known power of two per step, so every entry
//! point returns the output exponent alongside the Q31 mantissas.
//!
//! An exactly zero pivot is numeric degeneracy, not an error: the step is
//! skipped and the affected rows read out through a saturated reciprocal,
//! deterministically.

use crate::err::try_vec;
use crate::q31::{Q31, Q31_MAX, Q31_MIN};
use crate::recip::{recip_q31_wide, recip_q62_wide};
use crate::QernError;
use num_complex::Complex;
use num_traits::Zero;

/// Working-precision rail: saturating the intermediates keeps a degenerate
/// system deterministic instead of wrapping.
const WIDE_SAT: i64 = 1 << 62;

#[inline(always)]
fn clamp_wide(v: i128) -> i64 {
    if v > WIDE_SAT as i128 {
        WIDE_SAT
    } else if v < -(WIDE_SAT as i128) {
        -WIDE_SAT
    } else {
        v as i64
    }
}

#[inline(always)]
fn rnd_shr_wide(v: i128, shift: u32) -> i128 {
    if shift == 0 {
        v
    } else if shift > 126 {
        0
    } else {
        (v + (1i128 << (shift - 1))) >> shift
    }
}

#[inline(always)]
fn signed_shift_wide(v: i128, shift: i32) -> i64 {
    if shift >= 0 {
        clamp_wide(rnd_shr_wide(v, shift as u32))
    } else {
        clamp_wide(v << (-shift).min(64) as u32)
    }
}

/// Shift every entry so the largest magnitude sits in [2^30, 2^31). Whole
/// matrix scalings leave the solution of [A | B] untouched, so nothing needs
/// tracking here.
fn renormalize(w: &mut [i64]) {
    let max_mag = w.iter().map(|v| v.unsigned_abs()).max().unwrap_or(0);
    if max_mag == 0 {
        return;
    }
    let lead = 63 - max_mag.leading_zeros() as i32;
    let s = lead - 30;
    if s > 0 {
        for v in w.iter_mut() {
            *v = (*v + (1 << (s - 1))) >> s;
        }
    } else if s < 0 {
        for v in w.iter_mut() {
            *v <<= -s;
        }
    }
}

fn narrow_block(wide: &[i64], base_exponent: i32) -> (Vec<Q31>, i32) {
    let max_mag = wide.iter().map(|v| v.unsigned_abs()).max().unwrap_or(0);
    if max_mag == 0 {
        return (vec![0; wide.len()], 0);
    }
    let lead = 63 - max_mag.leading_zeros() as i32;
    let s = lead - 30;
    let mantissas = wide
        .iter()
        .map(|&v| {
            let shifted = signed_shift_wide(v as i128, s);
            if shifted > Q31_MAX as i64 {
                Q31_MAX
            } else if shifted < Q31_MIN as i64 {
                Q31_MIN
            } else {
                shifted as i32
            }
        })
        .collect();
    (mantissas, base_exponent + s)
}

/// Solve A X = B for a general real matrix by Gauss-Jordan elimination.
///
/// `a` is order x order row-major Q31, `b` order x rhs_cols. Returns the
/// solution mantissas and the exponent e with X = mantissa * 2^e.
pub fn gauss_jordan_solve(
    a: &[Q31],
    b: &[Q31],
    order: usize,
    rhs_cols: usize,
) -> Result<(Vec<Q31>, i32), QernError> {
    if a.len() != order * order {
        return Err(QernError::NonSquareMatrix(a.len()));
    }
    if b.len() != order * rhs_cols {
        return Err(QernError::RhsSizeMismatch(order * rhs_cols, b.len()));
    }

    let width = order + rhs_cols;
    let mut w = try_vec![0i64; order * width];
    for r in 0..order {
        for c in 0..order {
            w[r * width + c] = a[r * order + c] as i64;
        }
        for c in 0..rhs_cols {
            w[r * width + order + c] = b[r * rhs_cols + c] as i64;
        }
    }

    for k in 0..order {
        renormalize(&mut w);

        // pivot selection: largest magnitude in column k at or below row k;
        // strict comparison keeps the first of equals
        let mut pivot_row = k;
        let mut pivot_mag = w[k * width + k].unsigned_abs();
        for i in (k + 1)..order {
            let mag = w[i * width + k].unsigned_abs();
            if mag > pivot_mag {
                pivot_mag = mag;
                pivot_row = i;
            }
        }
        if pivot_row != k {
            for j in 0..width {
                w.swap(k * width + j, pivot_row * width + j);
            }
        }

        let pivot = w[k * width + k];
        if pivot == 0 {
            // singular: nothing to eliminate against, readout saturates
            continue;
        }

        // normalize the pivot row so its diagonal is one
        let (rm, re) = recip_q31_wide(pivot);
        let row_shift = 30 - re;
        for j in 0..width {
            let scaled = (w[k * width + j] as i128) * rm as i128;
            w[k * width + j] = signed_shift_wide(scaled, row_shift);
        }

        for i in 0..order {
            if i == k {
                continue;
            }
            let f = w[i * width + k];
            if f != 0 {
                for j in 0..width {
                    let delta = rnd_shr_wide((f as i128) * (w[k * width + j] as i128), 31);
                    w[i * width + j] = clamp_wide(w[i * width + j] as i128 - delta);
                }
            }
            // clear the residue the fixed-point delta leaves behind
            w[i * width + k] = 0;
        }
    }

    renormalize(&mut w);

    // readout: each row holds d_r * x_r = b_r with d_r the surviving
    // diagonal, so one more reciprocal per row recovers x
    let mut wide_x = try_vec![0i64; order * rhs_cols];
    let mut row_exponent = try_vec![0i32; order];
    for r in 0..order {
        let (dm, de) = recip_q31_wide(w[r * width + r]);
        row_exponent[r] = de;
        for c in 0..rhs_cols {
            let product = (w[r * width + order + c] as i128) * dm as i128;
            wide_x[r * rhs_cols + c] = clamp_wide(rnd_shr_wide(product, 30));
        }
    }

    let out_exponent = row_exponent.iter().copied().max().unwrap_or(0);
    for r in 0..order {
        let s = (out_exponent - row_exponent[r]).min(63);
        if s > 0 {
            for c in 0..rhs_cols {
                let v = wide_x[r * rhs_cols + c] as i128;
                wide_x[r * rhs_cols + c] = clamp_wide(rnd_shr_wide(v, s as u32));
            }
        }
    }

    Ok(narrow_block(&wide_x, out_exponent))
}

/// Invert a real matrix in place of a solve against the identity. The
/// identity is staged at half scale since 1.0 is not representable in Q31;
/// the returned exponent absorbs the doubling.
pub fn gauss_jordan_invert(a: &[Q31], order: usize) -> Result<(Vec<Q31>, i32), QernError> {
    let mut identity = try_vec![0i32; order * order];
    for i in 0..order {
        identity[i * order + i] = 1 << 30;
    }
    let (x, e) = gauss_jordan_solve(a, &identity, order, order)?;
    Ok((x, e + 1))
}

#[inline(always)]
fn cmag2(v: Complex<i64>) -> u64 {
    let re = v.re.unsigned_abs();
    let im = v.im.unsigned_abs();
    re * re + im * im
}

#[inline(always)]
fn c_mul_wide(a: Complex<i64>, b: Complex<i64>) -> (i128, i128) {
    (
        a.re as i128 * b.re as i128 - a.im as i128 * b.im as i128,
        a.re as i128 * b.im as i128 + a.im as i128 * b.re as i128,
    )
}

fn renormalize_c(w: &mut [Complex<i64>]) {
    let max_mag = w
        .iter()
        .flat_map(|v| [v.re.unsigned_abs(), v.im.unsigned_abs()])
        .max()
        .unwrap_or(0);
    if max_mag == 0 {
        return;
    }
    let lead = 63 - max_mag.leading_zeros() as i32;
    let s = lead - 30;
    if s > 0 {
        for v in w.iter_mut() {
            v.re = (v.re + (1 << (s - 1))) >> s;
            v.im = (v.im + (1 << (s - 1))) >> s;
        }
    } else if s < 0 {
        for v in w.iter_mut() {
            v.re <<= -s;
            v.im <<= -s;
        }
    }
}

fn narrow_block_c(wide: &[Complex<i64>], base_exponent: i32) -> (Vec<Complex<Q31>>, i32) {
    let max_mag = wide
        .iter()
        .flat_map(|v| [v.re.unsigned_abs(), v.im.unsigned_abs()])
        .max()
        .unwrap_or(0);
    if max_mag == 0 {
        return (vec![Complex::zero(); wide.len()], 0);
    }
    let lead = 63 - max_mag.leading_zeros() as i32;
    let s = lead - 30;
    let narrow = |v: i64| {
        let shifted = signed_shift_wide(v as i128, s);
        if shifted > Q31_MAX as i64 {
            Q31_MAX
        } else if shifted < Q31_MIN as i64 {
            Q31_MIN
        } else {
            shifted as i32
        }
    };
    let mantissas = wide
        .iter()
        .map(|v| Complex {
            re: narrow(v.re),
            im: narrow(v.im),
        })
        .collect();
    (mantissas, base_exponent + s)
}

// reciprocal of a complex pivot as conj(p) / |p|^2, carried as a Q31-scale
// complex mantissa and an exponent
fn c_recip(p: Complex<i64>) -> (Complex<i64>, i32) {
    let mag2 = cmag2(p);
    if mag2 == 0 {
        return (
            Complex {
                re: Q31_MAX as i64,
                im: 0,
            },
            62,
        );
    }
    let (ym, e) = recip_q62_wide(mag2 as i64);
    let re = (p.re as i128 * ym as i128) >> 30;
    let im = (-(p.im as i128) * ym as i128) >> 30;
    (
        Complex {
            re: clamp_wide(re),
            im: clamp_wide(im),
        },
        e,
    )
}

/// Solve A X = B for a complex matrix. Pivot magnitudes compare by squared
/// modulus, which spares a square root per scan.
pub fn gauss_jordan_solve_complex(
    a: &[Complex<Q31>],
    b: &[Complex<Q31>],
    order: usize,
    rhs_cols: usize,
) -> Result<(Vec<Complex<Q31>>, i32), QernError> {
    if a.len() != order * order {
        return Err(QernError::NonSquareMatrix(a.len()));
    }
    if b.len() != order * rhs_cols {
        return Err(QernError::RhsSizeMismatch(order * rhs_cols, b.len()));
    }

    let width = order + rhs_cols;
    let mut w = try_vec![Complex::<i64>::zero(); order * width];
    for r in 0..order {
        for c in 0..order {
            w[r * width + c] = Complex {
                re: a[r * order + c].re as i64,
                im: a[r * order + c].im as i64,
            };
        }
        for c in 0..rhs_cols {
            w[r * width + order + c] = Complex {
                re: b[r * rhs_cols + c].re as i64,
                im: b[r * rhs_cols + c].im as i64,
            };
        }
    }

    for k in 0..order {
        renormalize_c(&mut w);

        let mut pivot_row = k;
        let mut pivot_mag = cmag2(w[k * width + k]);
        for i in (k + 1)..order {
            let mag = cmag2(w[i * width + k]);
            if mag > pivot_mag {
                pivot_mag = mag;
                pivot_row = i;
            }
        }
        if pivot_row != k {
            for j in 0..width {
                w.swap(k * width + j, pivot_row * width + j);
            }
        }

        let pivot = w[k * width + k];
        if cmag2(pivot) == 0 {
            continue;
        }

        let (rm, re) = c_recip(pivot);
        let row_shift = 31 - re;
        for j in 0..width {
            let (sre, sim) = c_mul_wide(w[k * width + j], rm);
            w[k * width + j] = Complex {
                re: signed_shift_wide(sre, row_shift),
                im: signed_shift_wide(sim, row_shift),
            };
        }

        for i in 0..order {
            if i == k {
                continue;
            }
            let f = w[i * width + k];
            if f.re != 0 || f.im != 0 {
                for j in 0..width {
                    let (dre, dim) = c_mul_wide(f, w[k * width + j]);
                    let entry = &mut w[i * width + j];
                    entry.re = clamp_wide(entry.re as i128 - rnd_shr_wide(dre, 31));
                    entry.im = clamp_wide(entry.im as i128 - rnd_shr_wide(dim, 31));
                }
            }
            w[i * width + k] = Complex::zero();
        }
    }

    renormalize_c(&mut w);

    let mut wide_x = try_vec![Complex::<i64>::zero(); order * rhs_cols];
    let mut row_exponent = try_vec![0i32; order];
    for r in 0..order {
        let (dm, de) = c_recip(w[r * width + r]);
        row_exponent[r] = de;
        for c in 0..rhs_cols {
            let (xre, xim) = c_mul_wide(w[r * width + order + c], dm);
            wide_x[r * rhs_cols + c] = Complex {
                re: clamp_wide(rnd_shr_wide(xre, 31)),
                im: clamp_wide(rnd_shr_wide(xim, 31)),
            };
        }
    }

    let out_exponent = row_exponent.iter().copied().max().unwrap_or(0);
    for r in 0..order {
        let s = (out_exponent - row_exponent[r]).min(63);
        if s > 0 {
            for c in 0..rhs_cols {
                let v = wide_x[r * rhs_cols + c];
                wide_x[r * rhs_cols + c] = Complex {
                    re: clamp_wide(rnd_shr_wide(v.re as i128, s as u32)),
                    im: clamp_wide(rnd_shr_wide(v.im as i128, s as u32)),
                };
            }
        }
    }

    Ok(narrow_block_c(&wide_x, out_exponent))
}

/// Invert a complex matrix. See [`gauss_jordan_invert`] for the half-scale
/// identity staging.
pub fn gauss_jordan_invert_complex(
    a: &[Complex<Q31>],
    order: usize,
) -> Result<(Vec<Complex<Q31>>, i32), QernError> {
    let mut identity = try_vec![Complex::<Q31>::zero(); order * order];
    for i in 0..order {
        identity[i * order + i] = Complex { re: 1 << 30, im: 0 };
    }
    let (x, e) = gauss_jordan_solve_complex(a, &identity, order, order)?;
    Ok((x, e + 1))
}

/// Working-buffer element count for a solve of the given shape; the solver
/// allocates this internally, callers budgeting memory can query it.
pub fn gauss_jordan_scratch_len(order: usize, rhs_cols: usize) -> usize {
    order * (order + rhs_cols)
}
