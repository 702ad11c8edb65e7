use dr_core::Sample;

use crate::buffer::{BufferRef, BufferView};

/// Direct-form convolution, accumulated into `output`
///
/// Adds `input[i] · h[j]` to `output[i + j]` for every channel, so the
/// caller clears `output` first for a plain convolution. `output` needs room
/// for `input.len + h.len - 1` samples and all three share a channel count.
pub fn convolve<S: Sample>(
    input: &BufferRef<'_, S>,
    h: &BufferRef<'_, S>,
    output: &mut BufferView<'_, S>,
) {
    debug_assert!(
        input.num_channels() == h.num_channels() && output.num_channels() == input.num_channels(),
        "channel counts differ"
    );
    if input.is_empty() || h.is_empty() {
        return;
    }
    debug_assert!(
        output.num_samples() >= input.num_samples() + h.num_samples() - 1,
        "output too short for the full convolution"
    );

    for channel in 0..input.num_channels() {
        let taps = h.channel(channel);
        let out = output.channel_mut(channel);
        for (i, &x) in input.channel(channel).iter().enumerate() {
            for (acc, &tap) in out[i..i + taps.len()].iter_mut().zip(taps) {
                *acc += x * tap;
            }
        }
    }
}
