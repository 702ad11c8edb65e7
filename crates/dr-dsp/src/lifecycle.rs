use dr_core::ProcessSpec;

/// Preparation state shared by every processor
///
/// Operations on an `Unprepared` processor leave all buffers untouched.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Lifecycle {
    #[default]
    Unprepared,
    Ready(ProcessSpec),
}

impl Lifecycle {
    #[inline]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    #[inline]
    pub fn spec(&self) -> Option<ProcessSpec> {
        match self {
            Self::Ready(spec) => Some(*spec),
            Self::Unprepared => None,
        }
    }

    /// Largest block accepted by `process` (0 before `prepare`)
    #[inline]
    pub fn block_size(&self) -> usize {
        self.spec().map_or(0, |spec| spec.block_size)
    }

    pub fn prepare(&mut self, spec: ProcessSpec) {
        *self = Self::Ready(spec);
    }
}
