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
use crate::butterflies::ScaledButterfly;
use crate::q31::{c_sat_add, c_sat_sub, c_shift_q31, rnd_sat_narrow, Q31};
use crate::twiddles::compute_twiddle_q31;
use crate::FftDirection;
use num_complex::Complex;

pub(crate) struct Butterfly5 {
    direction: FftDirection,
    twiddle1: Complex<Q31>,
    twiddle2: Complex<Q31>,
}

impl Butterfly5 {
    pub(crate) fn new(fft_direction: FftDirection) -> Self {
        Butterfly5 {
            direction: fft_direction,
            twiddle1: compute_twiddle_q31(1, 5, fft_direction),
            twiddle2: compute_twiddle_q31(2, 5, fft_direction),
        }
    }
}

// w1.coef * a + w2.coef * b + c, evaluated wide and narrowed once
#[inline(always)]
fn comb_q31(w1: i32, a: i32, w2: i32, b: i32, c: i32) -> i64 {
    w1 as i64 * a as i64 + w2 as i64 * b as i64 + ((c as i64) << 31)
}

#[inline(always)]
fn comb2_q31(w1: i32, a: i32, w2: i32, b: i32) -> i64 {
    w1 as i64 * a as i64 + w2 as i64 * b as i64
}

impl ScaledButterfly for Butterfly5 {
    fn length(&self) -> usize {
        5
    }

    fn growth_bits(&self) -> u32 {
        3
    }

    fn execute_scaled(&self, in_place: &mut [Complex<Q31>], shift: i32) {
        for chunk in in_place.chunks_exact_mut(5) {
            let u0 = c_shift_q31(chunk[0], shift);
            let u1 = c_shift_q31(chunk[1], shift);
            let u2 = c_shift_q31(chunk[2], shift);
            let u3 = c_shift_q31(chunk[3], shift);
            let u4 = c_shift_q31(chunk[4], shift);

            // Radix-5 butterfly

            let x14p = c_sat_add(u1, u4);
            let x14n = c_sat_sub(u1, u4);
            let x23p = c_sat_add(u2, u3);
            let x23n = c_sat_sub(u2, u3);
            let y0 = c_sat_add(u0, c_sat_add(x14p, x23p));

            let b14re_a = comb_q31(self.twiddle1.re, x14p.re, self.twiddle2.re, x23p.re, u0.re);
            let b14re_b = comb2_q31(self.twiddle1.im, x14n.im, self.twiddle2.im, x23n.im);
            let b23re_a = comb_q31(self.twiddle2.re, x14p.re, self.twiddle1.re, x23p.re, u0.re);
            let b23re_b = comb2_q31(self.twiddle2.im, x14n.im, -self.twiddle1.im, x23n.im);

            let b14im_a = comb_q31(self.twiddle1.re, x14p.im, self.twiddle2.re, x23p.im, u0.im);
            let b14im_b = comb2_q31(self.twiddle1.im, x14n.re, self.twiddle2.im, x23n.re);
            let b23im_a = comb_q31(self.twiddle2.re, x14p.im, self.twiddle1.re, x23p.im, u0.im);
            let b23im_b = comb2_q31(self.twiddle2.im, x14n.re, -self.twiddle1.im, x23n.re);

            let y1 = Complex {
                re: rnd_sat_narrow(b14re_a - b14re_b, 31),
                im: rnd_sat_narrow(b14im_a + b14im_b, 31),
            };
            let y2 = Complex {
                re: rnd_sat_narrow(b23re_a - b23re_b, 31),
                im: rnd_sat_narrow(b23im_a + b23im_b, 31),
            };
            let y3 = Complex {
                re: rnd_sat_narrow(b23re_a + b23re_b, 31),
                im: rnd_sat_narrow(b23im_a - b23im_b, 31),
            };
            let y4 = Complex {
                re: rnd_sat_narrow(b14re_a + b14re_b, 31),
                im: rnd_sat_narrow(b14im_a - b14im_b, 31),
            };

            chunk[0] = y0;
            chunk[1] = y1;
            chunk[2] = y2;
            chunk[3] = y3;
            chunk[4] = y4;
        }
    }
}
