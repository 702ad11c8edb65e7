//! Multi-channel sample storage and the non-owning views over it
//!
//! Storage is channel-major: channel `c` occupies
//! `data[c * stride .. (c + 1) * stride]`. A view selects a channel range
//! and a sample window `[offset, offset + len)` inside every channel, so
//! sub-range and sub-channel views are plain reborrows with no copying.
//!
//! - [`BufferRef`] - read-only, `Copy`
//! - [`BufferView`] - mutable, with elementwise `+= -= *= /=`
//! - [`AudioBuffer`] - owning storage, sized outside the audio callback

use std::ops::{AddAssign, DivAssign, MulAssign, Range, SubAssign};

use dr_core::Sample;

/// Position of a view inside channel-major storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    channels: usize,
    stride: usize,
    offset: usize,
    len: usize,
}

impl Layout {
    #[inline]
    fn new(channels: usize, stride: usize, offset: usize, len: usize, storage: usize) -> Self {
        debug_assert!(offset + len <= stride, "window exceeds channel capacity");
        debug_assert!(channels * stride <= storage, "channels exceed storage");
        Self {
            channels,
            stride,
            offset,
            len,
        }
    }

    #[inline]
    fn range(&self, channel: usize) -> Range<usize> {
        debug_assert!(
            channel < self.channels,
            "channel {channel} out of range ({} channels)",
            self.channels
        );
        let start = channel * self.stride + self.offset;
        start..start + self.len
    }

    #[inline]
    fn sub_range(&self, offset: usize, len: usize) -> Self {
        debug_assert!(offset + len <= self.len, "sub-range exceeds view");
        Self {
            offset: self.offset + offset,
            len,
            ..*self
        }
    }

    /// Storage range and layout for `count` channels starting at `start`
    #[inline]
    fn channels(&self, start: usize, count: usize) -> (Range<usize>, Self) {
        debug_assert!(start + count <= self.channels, "channel range exceeds view");
        (
            start * self.stride..(start + count) * self.stride,
            Self {
                channels: count,
                ..*self
            },
        )
    }
}

// ============ Read-only view ============

/// Read-only view over one or more channels
#[derive(Debug, Clone, Copy)]
pub struct BufferRef<'a, S> {
    data: &'a [S],
    layout: Layout,
}

impl<'a, S: Sample> BufferRef<'a, S> {
    /// View all of `data` as `channels` channels of equal length
    pub fn new(data: &'a [S], channels: usize) -> Self {
        let stride = data.len().checked_div(channels).unwrap_or(0);
        Self::from_parts(data, channels, stride, 0, stride)
    }

    /// View `len` samples at `offset` of each channel, channels `stride` apart
    pub fn from_parts(
        data: &'a [S],
        channels: usize,
        stride: usize,
        offset: usize,
        len: usize,
    ) -> Self {
        Self {
            layout: Layout::new(channels, stride, offset, len, data.len()),
            data,
        }
    }

    #[inline]
    pub fn num_channels(&self) -> usize {
        self.layout.channels
    }

    #[inline]
    pub fn num_samples(&self) -> usize {
        self.layout.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layout.len == 0 || self.layout.channels == 0
    }

    /// Samples of one channel, starting at the view offset
    #[inline]
    pub fn channel(&self, channel: usize) -> &'a [S] {
        &self.data[self.layout.range(channel)]
    }

    #[inline]
    pub fn sample(&self, channel: usize, index: usize) -> S {
        debug_assert!(index < self.layout.len, "sample index out of range");
        self.channel(channel)[index]
    }

    pub fn sub_range(self, offset: usize, len: usize) -> BufferRef<'a, S> {
        Self {
            data: self.data,
            layout: self.layout.sub_range(offset, len),
        }
    }

    pub fn channel_view(self, channel: usize) -> BufferRef<'a, S> {
        self.channels_view(channel, 1)
    }

    pub fn channels_view(self, start: usize, count: usize) -> BufferRef<'a, S> {
        let (range, layout) = self.layout.channels(start, count);
        Self {
            data: &self.data[range],
            layout,
        }
    }
}

// ============ Mutable view ============

/// Mutable view over one or more channels
#[derive(Debug)]
pub struct BufferView<'a, S> {
    data: &'a mut [S],
    layout: Layout,
}

impl<'a, S: Sample> BufferView<'a, S> {
    /// View all of `data` as `channels` channels of equal length
    pub fn new(data: &'a mut [S], channels: usize) -> Self {
        let stride = data.len().checked_div(channels).unwrap_or(0);
        Self::from_parts(data, channels, stride, 0, stride)
    }

    /// View `len` samples at `offset` of each channel, channels `stride` apart
    pub fn from_parts(
        data: &'a mut [S],
        channels: usize,
        stride: usize,
        offset: usize,
        len: usize,
    ) -> Self {
        Self {
            layout: Layout::new(channels, stride, offset, len, data.len()),
            data,
        }
    }

    #[inline]
    pub fn num_channels(&self) -> usize {
        self.layout.channels
    }

    #[inline]
    pub fn num_samples(&self) -> usize {
        self.layout.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layout.len == 0 || self.layout.channels == 0
    }

    #[inline]
    pub fn channel(&self, channel: usize) -> &[S] {
        &self.data[self.layout.range(channel)]
    }

    #[inline]
    pub fn channel_mut(&mut self, channel: usize) -> &mut [S] {
        let range = self.layout.range(channel);
        &mut self.data[range]
    }

    #[inline]
    pub fn sample(&self, channel: usize, index: usize) -> S {
        debug_assert!(index < self.layout.len, "sample index out of range");
        self.channel(channel)[index]
    }

    #[inline]
    pub fn set_sample(&mut self, channel: usize, index: usize, value: S) {
        debug_assert!(index < self.layout.len, "sample index out of range");
        self.channel_mut(channel)[index] = value;
    }

    pub fn to_ref(&self) -> BufferRef<'_, S> {
        BufferRef {
            data: &*self.data,
            layout: self.layout,
        }
    }

    /// Shorter-lived view of the same window
    pub fn reborrow(&mut self) -> BufferView<'_, S> {
        BufferView {
            data: &mut *self.data,
            layout: self.layout,
        }
    }

    pub fn sub_range(&mut self, offset: usize, len: usize) -> BufferView<'_, S> {
        BufferView {
            layout: self.layout.sub_range(offset, len),
            data: &mut *self.data,
        }
    }

    pub fn channel_view(&mut self, channel: usize) -> BufferView<'_, S> {
        self.channels_view(channel, 1)
    }

    pub fn channels_view(&mut self, start: usize, count: usize) -> BufferView<'_, S> {
        let (range, layout) = self.layout.channels(start, count);
        BufferView {
            data: &mut self.data[range],
            layout,
        }
    }

    pub fn fill(&mut self, value: S) {
        for channel in 0..self.layout.channels {
            self.channel_mut(channel).fill(value);
        }
    }

    pub fn clear(&mut self) {
        self.fill(S::ZERO);
    }

    /// Copy `src` into one channel starting at `dst_offset`
    pub fn copy_from(&mut self, channel: usize, dst_offset: usize, src: &[S]) {
        debug_assert!(dst_offset + src.len() <= self.layout.len, "copy exceeds view");
        self.channel_mut(channel)[dst_offset..dst_offset + src.len()].copy_from_slice(src);
    }

    /// Copy `len` samples between single channels of two views
    pub fn copy_channel_from(
        &mut self,
        channel: usize,
        dst_offset: usize,
        src: &BufferRef<'_, S>,
        src_channel: usize,
        src_offset: usize,
        len: usize,
    ) {
        debug_assert!(src_offset + len <= src.num_samples(), "copy exceeds source view");
        let samples = &src.channel(src_channel)[src_offset..src_offset + len];
        self.copy_from(channel, dst_offset, samples);
    }

    /// Copy every channel of `src` into this view
    ///
    /// `src` must have at least as many channels and samples as `self`.
    pub fn copy_from_ref(&mut self, src: &BufferRef<'_, S>) {
        check_operand(&self.layout, src);
        let len = self.layout.len;
        for channel in 0..self.layout.channels {
            self.channel_mut(channel)
                .copy_from_slice(&src.channel(channel)[..len]);
        }
    }
}

#[inline]
fn check_operand<S: Sample>(layout: &Layout, src: &BufferRef<'_, S>) {
    debug_assert!(
        src.num_channels() >= layout.channels,
        "operand has {} channels, view has {}",
        src.num_channels(),
        layout.channels
    );
    debug_assert!(
        src.num_samples() >= layout.len,
        "operand has {} samples, view has {}",
        src.num_samples(),
        layout.len
    );
}

macro_rules! view_ops {
    ($($trait:ident, $method:ident => $scalar_kernel:ident, $slice_kernel:ident;)*) => {
        $(
            impl<S: Sample> $trait<S> for BufferView<'_, S> {
                #[inline]
                fn $method(&mut self, value: S) {
                    for channel in 0..self.layout.channels {
                        S::$scalar_kernel(self.channel_mut(channel), value);
                    }
                }
            }

            impl<S: Sample> $trait<&BufferRef<'_, S>> for BufferView<'_, S> {
                #[inline]
                fn $method(&mut self, src: &BufferRef<'_, S>) {
                    check_operand(&self.layout, src);
                    for channel in 0..self.layout.channels {
                        S::$slice_kernel(self.channel_mut(channel), src.channel(channel));
                    }
                }
            }
        )*
    };
}

view_ops! {
    AddAssign, add_assign => add_scalar, add_slice;
    SubAssign, sub_assign => sub_scalar, sub_slice;
    MulAssign, mul_assign => mul_scalar, mul_slice;
    DivAssign, div_assign => div_scalar, div_slice;
}

// ============ Owning storage ============

/// Owned channel-major sample storage
#[derive(Debug, Clone)]
pub struct AudioBuffer<S> {
    data: Vec<S>,
    channels: usize,
    capacity: usize,
}

impl<S: Sample> AudioBuffer<S> {
    pub fn new(channels: usize, samples: usize) -> Self {
        Self {
            data: vec![S::ZERO; channels * samples],
            channels,
            capacity: samples,
        }
    }

    /// Build a buffer from per-channel slices; shorter channels are zero-padded
    pub fn from_channels(channels: &[&[S]]) -> Self {
        let samples = channels.iter().map(|c| c.len()).max().unwrap_or(0);
        let mut buffer = Self::new(channels.len(), samples);
        for (index, source) in channels.iter().enumerate() {
            buffer.channel_mut(index)[..source.len()].copy_from_slice(source);
        }
        buffer
    }

    /// Resize and clear. Allocates: call from `prepare`, never per block.
    pub fn set_size(&mut self, channels: usize, samples: usize) {
        self.data.clear();
        self.data.resize(channels * samples, S::ZERO);
        self.channels = channels;
        self.capacity = samples;
    }

    #[inline]
    pub fn num_channels(&self) -> usize {
        self.channels
    }

    #[inline]
    pub fn num_samples(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.data.fill(S::ZERO);
    }

    #[inline]
    pub fn channel(&self, channel: usize) -> &[S] {
        debug_assert!(channel < self.channels, "channel {channel} out of range");
        let start = channel * self.capacity;
        &self.data[start..start + self.capacity]
    }

    #[inline]
    pub fn channel_mut(&mut self, channel: usize) -> &mut [S] {
        debug_assert!(channel < self.channels, "channel {channel} out of range");
        let start = channel * self.capacity;
        &mut self.data[start..start + self.capacity]
    }

    pub fn view(&mut self) -> BufferView<'_, S> {
        let len = self.capacity;
        self.view_range(0, len)
    }

    pub fn view_range(&mut self, offset: usize, len: usize) -> BufferView<'_, S> {
        BufferView::from_parts(&mut self.data, self.channels, self.capacity, offset, len)
    }

    pub fn to_ref(&self) -> BufferRef<'_, S> {
        self.ref_range(0, self.capacity)
    }

    pub fn ref_range(&self, offset: usize, len: usize) -> BufferRef<'_, S> {
        BufferRef::from_parts(&self.data, self.channels, self.capacity, offset, len)
    }
}

impl<S: Sample> Default for AudioBuffer<S> {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo_ramp(len: usize) -> AudioBuffer<f32> {
        let left: Vec<f32> = (0..len).map(|i| i as f32).collect();
        let right: Vec<f32> = (0..len).map(|i| -(i as f32)).collect();
        AudioBuffer::<f32>::from_channels(&[left.as_slice(), right.as_slice()])
    }

    #[test]
    fn test_view_accessors() {
        let mut buffer = stereo_ramp(16);
        let view = buffer.view();
        assert_eq!(view.num_channels(), 2);
        assert_eq!(view.num_samples(), 16);
        assert_eq!(view.sample(1, 3), -3.0);
        assert_eq!(view.channel(0)[15], 15.0);
    }

    #[test]
    fn test_sub_range_is_offset_adjusted() {
        let mut buffer = stereo_ramp(16);
        let mut view = buffer.view();
        let mut window = view.sub_range(4, 8);
        assert_eq!(window.num_samples(), 8);
        assert_eq!(window.channel(0)[0], 4.0);
        assert_eq!(window.channel(1)[7], -11.0);

        window += 100.0;
        assert_eq!(buffer.channel(0)[3], 3.0);
        assert_eq!(buffer.channel(0)[4], 104.0);
        assert_eq!(buffer.channel(0)[11], 111.0);
        assert_eq!(buffer.channel(0)[12], 12.0);
    }

    #[test]
    fn test_channel_views() {
        let mut buffer = AudioBuffer::<f64>::new(4, 8);
        {
            let mut view = buffer.view();
            let mut middle = view.channels_view(1, 2);
            assert_eq!(middle.num_channels(), 2);
            middle.fill(1.0);
            let mut last = view.channel_view(3);
            last.fill(3.0);
        }
        assert!(buffer.channel(0).iter().all(|&s| s == 0.0));
        assert!(buffer.channel(1).iter().all(|&s| s == 1.0));
        assert!(buffer.channel(2).iter().all(|&s| s == 1.0));
        assert!(buffer.channel(3).iter().all(|&s| s == 3.0));
    }

    #[test]
    fn test_buffer_ops() {
        let mut a = AudioBuffer::<f64>::from_channels(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]]);
        let b = AudioBuffer::<f64>::from_channels(&[&[1.0, 1.0, 1.0], &[2.0, 2.0, 2.0]]);
        let mut view = a.view();

        view += &b.to_ref();
        assert_eq!(view.channel(0), &[2.0, 3.0, 4.0]);
        view -= &b.to_ref();
        assert_eq!(view.channel(1), &[4.0, 5.0, 6.0]);
        view *= &b.to_ref();
        assert_eq!(view.channel(1), &[8.0, 10.0, 12.0]);
        view /= &b.to_ref();
        assert_eq!(view.channel(1), &[4.0, 5.0, 6.0]);
        view *= 0.5;
        assert_eq!(view.channel(0), &[0.5, 1.0, 1.5]);
        view -= 0.5;
        assert_eq!(view.channel(0), &[0.0, 0.5, 1.0]);
        view /= 2.0;
        assert_eq!(view.channel(0), &[0.0, 0.25, 0.5]);
    }

    #[test]
    fn test_operand_may_be_larger() {
        let mut small = AudioBuffer::<f32>::new(1, 4);
        let large = stereo_ramp(10);
        let mut view = small.view();
        view += &large.to_ref();
        assert_eq!(view.channel(0), &[0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_strided_view_over_raw_storage() {
        // Two channels of capacity 6, viewing samples 2..5
        let mut storage = [0.0f32, 1.0, 2.0, 3.0, 4.0, 5.0, 10.0, 11.0, 12.0, 13.0, 14.0, 15.0];
        let mut view = BufferView::from_parts(&mut storage, 2, 6, 2, 3);
        assert_eq!(view.channel(0), &[2.0, 3.0, 4.0]);
        assert_eq!(view.channel(1), &[12.0, 13.0, 14.0]);
        view.set_sample(1, 0, -1.0);
        assert_eq!(storage[8], -1.0);
    }

    #[test]
    fn test_copy_helpers() {
        let source = stereo_ramp(8);
        let mut target = AudioBuffer::<f32>::new(2, 8);
        let mut view = target.view();

        view.copy_from(0, 2, &[7.0, 8.0]);
        view.copy_channel_from(1, 0, &source.to_ref(), 0, 5, 3);
        assert_eq!(view.channel(0)[..4], [0.0, 0.0, 7.0, 8.0]);
        assert_eq!(view.channel(1)[..4], [5.0, 6.0, 7.0, 0.0]);

        view.copy_from_ref(&source.to_ref());
        assert_eq!(view.channel(1), source.channel(1));

        view.clear();
        assert!(target.channel(1).iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_set_size_clears() {
        let mut buffer = stereo_ramp(4);
        buffer.set_size(3, 5);
        assert_eq!(buffer.num_channels(), 3);
        assert_eq!(buffer.num_samples(), 5);
        assert!(buffer.channel(2).iter().all(|&s| s == 0.0));
        assert!(buffer.channel(0).iter().all(|&s| s == 0.0));
    }
}
