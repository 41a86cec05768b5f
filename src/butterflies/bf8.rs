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
use crate::butterflies::{butterfly4_core, rotate_90, ScaledButterfly};
use crate::q31::{c_sat_add, c_sat_sub, c_shift_q31, quantize_q31, rnd_sat_narrow, Q31};
use crate::FftDirection;
use num_complex::Complex;

pub(crate) struct Butterfly8 {
    direction: FftDirection,
    root2: Q31,
}

impl Butterfly8 {
    pub(crate) fn new(fft_direction: FftDirection) -> Self {
        Butterfly8 {
            direction: fft_direction,
            root2: quantize_q31(0.5f64.sqrt()),
        }
    }

    // (rotate_90(v) + v) * sqrt(1/2), summed wide so the components can
    // exceed the rails before the narrowing
    #[inline(always)]
    fn diag_twiddle_add(&self, v: Complex<Q31>) -> Complex<Q31> {
        let r = rotate_90(v, self.direction);
        Complex {
            re: rnd_sat_narrow((r.re as i64 + v.re as i64) * self.root2 as i64, 31),
            im: rnd_sat_narrow((r.im as i64 + v.im as i64) * self.root2 as i64, 31),
        }
    }

    #[inline(always)]
    fn diag_twiddle_sub(&self, v: Complex<Q31>) -> Complex<Q31> {
        let r = rotate_90(v, self.direction);
        Complex {
            re: rnd_sat_narrow((r.re as i64 - v.re as i64) * self.root2 as i64, 31),
            im: rnd_sat_narrow((r.im as i64 - v.im as i64) * self.root2 as i64, 31),
        }
    }
}

impl ScaledButterfly for Butterfly8 {
    fn length(&self) -> usize {
        8
    }

    fn growth_bits(&self) -> u32 {
        3
    }

    fn execute_scaled(&self, in_place: &mut [Complex<Q31>], shift: i32) {
        for chunk in in_place.chunks_exact_mut(8) {
            let u0 = c_shift_q31(chunk[0], shift);
            let u1 = c_shift_q31(chunk[1], shift);
            let u2 = c_shift_q31(chunk[2], shift);
            let u3 = c_shift_q31(chunk[3], shift);
            let u4 = c_shift_q31(chunk[4], shift);
            let u5 = c_shift_q31(chunk[5], shift);
            let u6 = c_shift_q31(chunk[6], shift);
            let u7 = c_shift_q31(chunk[7], shift);

            // Radix-8 butterfly: two radix-4 halves glued by the diagonal
            // eighth roots of unity
            let (e0, e1, e2, e3) = butterfly4_core(u0, u2, u4, u6, self.direction);
            let (o0, mut o1, mut o2, mut o3) = butterfly4_core(u1, u3, u5, u7, self.direction);

            o1 = self.diag_twiddle_add(o1);
            o2 = rotate_90(o2, self.direction);
            o3 = self.diag_twiddle_sub(o3);

            chunk[0] = c_sat_add(e0, o0);
            chunk[1] = c_sat_add(e1, o1);
            chunk[2] = c_sat_add(e2, o2);
            chunk[3] = c_sat_add(e3, o3);
            chunk[4] = c_sat_sub(e0, o0);
            chunk[5] = c_sat_sub(e1, o1);
            chunk[6] = c_sat_sub(e2, o2);
            chunk[7] = c_sat_sub(e3, o3);
        }
    }
}
