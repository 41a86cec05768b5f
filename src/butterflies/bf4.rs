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
use crate::butterflies::{butterfly4_core, ScaledButterfly};
use crate::q31::{c_shift_q31, Q31};
use crate::FftDirection;
use num_complex::Complex;

pub(crate) struct Butterfly4 {
    direction: FftDirection,
}

impl Butterfly4 {
    pub(crate) fn new(fft_direction: FftDirection) -> Self {
        Butterfly4 {
            direction: fft_direction,
        }
    }
}

impl ScaledButterfly for Butterfly4 {
    fn length(&self) -> usize {
        4
    }

    fn growth_bits(&self) -> u32 {
        2
    }

    fn execute_scaled(&self, in_place: &mut [Complex<Q31>], shift: i32) {
        for chunk in in_place.chunks_exact_mut(4) {
            let u0 = c_shift_q31(chunk[0], shift);
            let u1 = c_shift_q31(chunk[1], shift);
            let u2 = c_shift_q31(chunk[2], shift);
            let u3 = c_shift_q31(chunk[3], shift);

            let (y0, y1, y2, y3) = butterfly4_core(u0, u1, u2, u3, self.direction);

            chunk[0] = y0;
            chunk[1] = y1;
            chunk[2] = y2;
            chunk[3] = y3;
        }
    }
}
