//! Multi-channel circular delay line
//!
//! Capacity is `max_delay + block_size` so that a whole block can be read at
//! the maximum delay. Reads never disturb the ring: the same delay may be
//! popped any number of times between two pushes.

use dr_core::{ProcessSpec, Sample};

use crate::buffer::{AudioBuffer, BufferRef, BufferView};
use crate::lifecycle::Lifecycle;

/// Circular buffer with block push / pop at arbitrary delays
#[derive(Debug, Clone)]
pub struct DelayLine<S> {
    num_channels: usize,
    max_delay: usize,
    buffer: AudioBuffer<S>,
    write_pos: usize,
    lifecycle: Lifecycle,
}

impl<S: Sample> DelayLine<S> {
    pub fn new(num_channels: usize, max_delay: usize) -> Self {
        Self {
            num_channels,
            max_delay,
            buffer: AudioBuffer::new(num_channels, 0),
            write_pos: 0,
            lifecycle: Lifecycle::Unprepared,
        }
    }

    #[inline]
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    #[inline]
    pub fn max_delay(&self) -> usize {
        self.max_delay
    }

    /// Ring length in samples (0 before `prepare`)
    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.num_samples()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn write_position(&self) -> usize {
        self.write_pos
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.lifecycle.is_ready()
    }

    pub fn prepare(&mut self, spec: ProcessSpec) {
        debug_assert!(spec.block_size > 0, "block size must be positive");
        self.buffer
            .set_size(self.num_channels, self.max_delay + spec.block_size);
        self.write_pos = 0;
        self.lifecycle.prepare(spec);
        log::debug!(
            "delay line prepared: {} ch, {} samples",
            self.num_channels,
            self.len()
        );
    }

    pub fn reset(&mut self) {
        if !self.lifecycle.is_ready() {
            return;
        }
        self.buffer.clear();
        self.write_pos = 0;
    }

    /// Append a block, overwriting the oldest samples
    pub fn push_samples(&mut self, src: &BufferRef<'_, S>) {
        if !self.lifecycle.is_ready() || src.is_empty() {
            return;
        }
        let size = self.len();
        let len = src.num_samples();
        debug_assert!(src.num_channels() >= self.num_channels, "too few channels pushed");
        debug_assert!(len <= size, "block longer than ring");

        let first = len.min(size - self.write_pos);
        for channel in 0..self.num_channels {
            let samples = &src.channel(channel)[..len];
            let ring = self.buffer.channel_mut(channel);
            ring[self.write_pos..self.write_pos + first].copy_from_slice(&samples[..first]);
            ring[..len - first].copy_from_slice(&samples[first..]);
        }
        self.write_pos = (self.write_pos + len) % size;
    }

    /// Fill `dst` with the block that ends `delay` samples before the write
    /// position. Delay 0 returns the most recently pushed samples.
    pub fn pop_samples(&self, dst: &mut BufferView<'_, S>, delay: usize) {
        if !self.lifecycle.is_ready() || dst.is_empty() {
            return;
        }
        let size = self.len();
        let len = dst.num_samples();
        debug_assert!(
            delay <= self.max_delay,
            "delay {delay} exceeds maximum {}",
            self.max_delay
        );
        debug_assert!(delay + len <= size, "read window exceeds ring");
        debug_assert!(dst.num_channels() <= self.num_channels, "too many channels popped");

        let start = (self.write_pos + size - delay - len) % size;
        let first = len.min(size - start);
        for channel in 0..dst.num_channels() {
            let ring = self.buffer.channel(channel);
            let out = dst.channel_mut(channel);
            out[..first].copy_from_slice(&ring[start..start + first]);
            out[first..].copy_from_slice(&ring[..len - first]);
        }
    }

    /// Single sample `delay` samples before the newest one
    #[inline]
    pub fn sample(&self, channel: usize, delay: usize) -> S {
        if !self.lifecycle.is_ready() {
            return S::ZERO;
        }
        let size = self.len();
        debug_assert!(delay < size, "delay {delay} exceeds ring");
        self.buffer.channel(channel)[(self.write_pos + size - delay - 1) % size]
    }
}
