//! Sample types and the elementwise kernels behind buffer arithmetic
//!
//! Every buffer operator (`+=`, `-=`, `*=`, `/=` by scalar or by slice) ends
//! up in one of the kernels declared on [`Sample`]. The trait provides plain
//! loops as defaults; `f32` overrides them with 8-lane [`wide::f32x8`]
//! kernels and a scalar tail. Lane arithmetic is IEEE per element with no
//! fused or reassociated operations, so both paths are bit-identical.

use std::fmt::Debug;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

/// Audio sample scalar.
pub trait Sample:
    Copy
    + Default
    + PartialEq
    + PartialOrd
    + Debug
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign
    + DivAssign
{
    const ZERO: Self;
    const ONE: Self;
    /// Width of the vector path (1 when only the scalar loops exist)
    const LANES: usize;

    fn from_f64(value: f64) -> Self;
    fn to_f64(self) -> f64;

    #[inline]
    fn add_scalar(dst: &mut [Self], value: Self) {
        scalar::add_scalar(dst, value)
    }
    #[inline]
    fn sub_scalar(dst: &mut [Self], value: Self) {
        scalar::sub_scalar(dst, value)
    }
    #[inline]
    fn mul_scalar(dst: &mut [Self], value: Self) {
        scalar::mul_scalar(dst, value)
    }
    #[inline]
    fn div_scalar(dst: &mut [Self], value: Self) {
        scalar::div_scalar(dst, value)
    }
    #[inline]
    fn add_slice(dst: &mut [Self], src: &[Self]) {
        scalar::add_slice(dst, src)
    }
    #[inline]
    fn sub_slice(dst: &mut [Self], src: &[Self]) {
        scalar::sub_slice(dst, src)
    }
    #[inline]
    fn mul_slice(dst: &mut [Self], src: &[Self]) {
        scalar::mul_slice(dst, src)
    }
    #[inline]
    fn div_slice(dst: &mut [Self], src: &[Self]) {
        scalar::div_slice(dst, src)
    }
}

impl Sample for f64 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;
    const LANES: usize = 1;

    #[inline]
    fn from_f64(value: f64) -> Self {
        value
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self
    }
}

impl Sample for f32 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;
    const LANES: usize = lanes::LANES;

    #[inline]
    fn from_f64(value: f64) -> Self {
        value as f32
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn add_scalar(dst: &mut [Self], value: Self) {
        lanes::add_scalar(dst, value)
    }
    #[inline]
    fn sub_scalar(dst: &mut [Self], value: Self) {
        lanes::sub_scalar(dst, value)
    }
    #[inline]
    fn mul_scalar(dst: &mut [Self], value: Self) {
        lanes::mul_scalar(dst, value)
    }
    #[inline]
    fn div_scalar(dst: &mut [Self], value: Self) {
        lanes::div_scalar(dst, value)
    }
    #[inline]
    fn add_slice(dst: &mut [Self], src: &[Self]) {
        lanes::add_slice(dst, src)
    }
    #[inline]
    fn sub_slice(dst: &mut [Self], src: &[Self]) {
        lanes::sub_slice(dst, src)
    }
    #[inline]
    fn mul_slice(dst: &mut [Self], src: &[Self]) {
        lanes::mul_slice(dst, src)
    }
    #[inline]
    fn div_slice(dst: &mut [Self], src: &[Self]) {
        lanes::div_slice(dst, src)
    }
}

// ============ Scalar Implementations (Fallback) ============

/// Plain per-sample loops, available for every sample type.
///
/// Slice kernels process `dst.len()` samples; `src` must be at least as long.
pub mod scalar {
    use super::Sample;

    macro_rules! scalar_kernels {
        ($($scalar_fn:ident, $slice_fn:ident => $op:tt;)*) => {
            $(
                #[inline]
                pub fn $scalar_fn<S: Sample>(dst: &mut [S], value: S) {
                    for sample in dst.iter_mut() {
                        *sample $op value;
                    }
                }

                #[inline]
                pub fn $slice_fn<S: Sample>(dst: &mut [S], src: &[S]) {
                    debug_assert!(src.len() >= dst.len(), "operand shorter than destination");
                    for (d, s) in dst.iter_mut().zip(src.iter()) {
                        *d $op *s;
                    }
                }
            )*
        };
    }

    scalar_kernels! {
        add_scalar, add_slice => +=;
        sub_scalar, sub_slice => -=;
        mul_scalar, mul_slice => *=;
        div_scalar, div_slice => /=;
    }
}

// ============ f32x8 Implementations ============

/// 8-lane `f32` kernels with a scalar remainder loop.
pub mod lanes {
    use wide::f32x8;

    /// f32 lanes per vector
    pub const LANES: usize = 8;

    #[inline(always)]
    fn load(chunk: &[f32]) -> f32x8 {
        let mut lanes = [0.0f32; LANES];
        lanes.copy_from_slice(chunk);
        f32x8::from(lanes)
    }

    #[inline(always)]
    fn store(chunk: &mut [f32], value: f32x8) {
        chunk.copy_from_slice(&value.to_array());
    }

    macro_rules! lane_kernels {
        ($($scalar_fn:ident, $slice_fn:ident => $op:tt, $assign:tt;)*) => {
            $(
                pub fn $scalar_fn(dst: &mut [f32], value: f32) {
                    let splat = f32x8::splat(value);
                    let mut chunks = dst.chunks_exact_mut(LANES);
                    for chunk in &mut chunks {
                        let result = load(chunk) $op splat;
                        store(chunk, result);
                    }
                    for sample in chunks.into_remainder() {
                        *sample $assign value;
                    }
                }

                pub fn $slice_fn(dst: &mut [f32], src: &[f32]) {
                    debug_assert!(src.len() >= dst.len(), "operand shorter than destination");
                    let src = &src[..dst.len()];
                    let mut dst_chunks = dst.chunks_exact_mut(LANES);
                    let mut src_chunks = src.chunks_exact(LANES);
                    for (d, s) in (&mut dst_chunks).zip(&mut src_chunks) {
                        let result = load(d) $op load(s);
                        store(d, result);
                    }
                    for (d, s) in dst_chunks
                        .into_remainder()
                        .iter_mut()
                        .zip(src_chunks.remainder())
                    {
                        *d $assign *s;
                    }
                }
            )*
        };
    }

    lane_kernels! {
        add_scalar, add_slice => +, +=;
        sub_scalar, sub_slice => -, -=;
        mul_scalar, mul_slice => *, *=;
        div_scalar, div_slice => /, /=;
    }
}
