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

/// Digit-reversal transpose in base 4: rearranges `input` so that the
/// radix-4 cross stages that follow the base butterfly produce results in
/// natural order. `height` is the base butterfly length.
pub(crate) fn digit_reversed_transpose_4<T: Copy>(height: usize, input: &[T], output: &mut [T]) {
    let width = input.len() / height;

    if width <= 1 {
        output.copy_from_slice(input);
        return;
    }

    assert!(input.len() % height == 0 && input.len() == output.len());

    let strided_width = width / 4;
    let rev_digits = {
        let width_bits = width.trailing_zeros();
        // width must be a power of 4 for the stage walk to terminate at n
        assert!(width_bits % 2 == 0);
        width_bits / 2
    };

    if strided_width == 0 {
        output.copy_from_slice(input);
        return;
    }

    for x in 0..strided_width {
        let x_fwd = std::array::from_fn::<usize, 4, _>(|i| 4 * x + i);
        let x_rev = x_fwd.map(|x| reverse_base4_digits(x, rev_digits));

        // The loop below indexes up to (x_rev[i] + 1) * height - 1, so it is
        // enough that every reversed column index stays inside the width.
        for r in x_rev {
            assert!(r < width);
        }
        for y in 0..height {
            for (fwd, rev) in x_fwd.iter().zip(x_rev.iter()) {
                let input_index = *fwd + y * width;
                let output_index = y + *rev * height;

                unsafe {
                    let temp = *input.get_unchecked(input_index);
                    *output.get_unchecked_mut(output_index) = temp;
                }
            }
        }
    }
}

fn reverse_base4_digits(value: usize, digits: u32) -> usize {
    let mut result: usize = 0;
    let mut value = value;
    for _ in 0..digits {
        result = (result << 2) | (value & 3);
        value >>= 2;
    }
    result
}

/// Helper function to check if a number is a power of 5.
pub(crate) fn is_power_of_five(n: u64) -> bool {
    let mut n = n;
    if n == 0 {
        return false;
    }
    while n % 5 == 0 {
        n /= 5;
    }
    n == 1
}

/// computes `n` such that `d ^ n == value`, or `None` when `value` is not a
/// perfect power of `d`.
pub(crate) fn compute_logarithm(d: usize, value: usize) -> Option<u32> {
    if value == 0 || d < 2 {
        return None;
    }

    let mut current_exponent = 0;
    let mut current_value = value;

    while current_value % d == 0 {
        current_exponent += 1;
        current_value /= d;
    }

    if current_value == 1 {
        Some(current_exponent)
    } else {
        None
    }
}
