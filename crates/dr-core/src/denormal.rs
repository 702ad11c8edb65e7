//! Denormal protection
//!
//! Long reverb tails decay into the subnormal range, where x86 arithmetic
//! slows down by orders of magnitude. [`NoDenormals`] sets DAZ + FTZ on the
//! current thread for its lifetime and restores the previous MXCSR on drop.

/// Scoped flush-to-zero / denormals-are-zero guard.
///
/// The change affects the current thread only. On targets other than
/// x86_64 the guard does nothing (aarch64 defaults are relied upon).
#[must_use = "denormals are restored as soon as the guard is dropped"]
pub struct NoDenormals {
    #[cfg(target_arch = "x86_64")]
    previous: u32,
}

// DAZ (Denormals Are Zero) = bit 6, FTZ (Flush To Zero) = bit 15
#[cfg(target_arch = "x86_64")]
const DAZ_FTZ: u32 = 0x8040;

impl NoDenormals {
    #[inline]
    #[allow(deprecated)]
    pub fn new() -> Self {
        #[cfg(target_arch = "x86_64")]
        {
            use std::arch::x86_64::{_mm_getcsr, _mm_setcsr};
            // Safety: only floating-point control bits of this thread are changed
            let previous = unsafe { _mm_getcsr() };
            unsafe { _mm_setcsr(previous | DAZ_FTZ) };
            Self { previous }
        }

        #[cfg(not(target_arch = "x86_64"))]
        {
            Self {}
        }
    }
}

impl Default for NoDenormals {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for NoDenormals {
    #[inline]
    #[allow(deprecated)]
    fn drop(&mut self) {
        #[cfg(target_arch = "x86_64")]
        {
            use std::arch::x86_64::_mm_setcsr;
            unsafe { _mm_setcsr(self.previous) };
        }
    }
}

/// Check if denormals are being flushed to zero on this thread
#[inline]
#[allow(deprecated)]
pub fn denormals_are_zero() -> bool {
    #[cfg(target_arch = "x86_64")]
    {
        use std::arch::x86_64::_mm_getcsr;
        let mxcsr = unsafe { _mm_getcsr() };
        (mxcsr & DAZ_FTZ) == DAZ_FTZ
    }

    #[cfg(not(target_arch = "x86_64"))]
    {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_restores_state() {
        let before = denormals_are_zero();
        {
            let _guard = NoDenormals::new();
            assert!(denormals_are_zero());
        }
        assert_eq!(denormals_are_zero(), before);
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn test_guard_flushes_subnormals() {
        let _guard = NoDenormals::new();
        let tiny = std::hint::black_box(f32::MIN_POSITIVE);
        let product = tiny * std::hint::black_box(0.5f32);
        assert_eq!(product, 0.0);
    }
}
