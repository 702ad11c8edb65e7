//! Per-block processing context

use dr_core::Sample;

use crate::buffer::{BufferRef, BufferView};

/// Input and output of one processing call
///
/// A replacing context reads and writes the same buffer; a non-replacing
/// one reads `input` and writes a distinct `output` of the same shape.
#[derive(Debug)]
pub struct ProcessContext<'a, S> {
    input: Option<BufferRef<'a, S>>,
    output: BufferView<'a, S>,
}

impl<'a, S: Sample> ProcessContext<'a, S> {
    /// Process `buffer` in place
    pub fn replacing(buffer: BufferView<'a, S>) -> Self {
        Self {
            input: None,
            output: buffer,
        }
    }

    /// Read `input`, write `output`
    pub fn non_replacing(input: BufferRef<'a, S>, output: BufferView<'a, S>) -> Self {
        debug_assert!(
            input.num_channels() == output.num_channels()
                && input.num_samples() == output.num_samples(),
            "input and output shapes differ"
        );
        Self {
            input: Some(input),
            output,
        }
    }

    #[inline]
    pub fn is_replacing(&self) -> bool {
        self.input.is_none()
    }

    /// Input samples (the output buffer itself when replacing)
    #[inline]
    pub fn input(&self) -> BufferRef<'_, S> {
        match self.input {
            Some(input) => input,
            None => self.output.to_ref(),
        }
    }

    #[inline]
    pub fn output(&mut self) -> &mut BufferView<'a, S> {
        &mut self.output
    }

    #[inline]
    pub fn num_channels(&self) -> usize {
        self.output.num_channels()
    }

    #[inline]
    pub fn num_samples(&self) -> usize {
        self.output.num_samples()
    }

    /// Copy input to output; nothing to do when replacing
    pub fn copy_input_to_output(&mut self) {
        if let Some(input) = self.input {
            self.output.copy_from_ref(&input);
        }
    }
}
