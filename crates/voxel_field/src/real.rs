//! Floating point scalar abstraction shared by every kernel.
//!
//! Kernels are generic over `f32` and `f64` through `num_traits::Float`.
//! On top of that each scalar carries an atomic cell type used by the
//! scatter kernels: floats have no native atomic add, so accumulation runs a
//! compare-exchange loop over the value's bit pattern.

use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;
use std::iter::Sum;
use std::ops::{AddAssign, MulAssign, SubAssign};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Scalar type usable as tree data, coordinates and gradients.
pub trait Real:
  Float + FromPrimitive + Debug + Default + Send + Sync + AddAssign + SubAssign + MulAssign + Sum + 'static
{
  /// Atomic storage cell for lock-free accumulation.
  type Atomic: Send + Sync + Debug;

  /// Constant or index in this precision. Values outside the range of
  /// `Self` become NaN.
  #[inline(always)]
  fn cast(value: f64) -> Self {
    Self::from_f64(value).unwrap_or_else(Self::nan)
  }

  fn atomic_new(value: Self) -> Self::Atomic;
  fn atomic_load(cell: &Self::Atomic) -> Self;
  /// Lock-free `*cell += value`.
  fn atomic_add(cell: &Self::Atomic, value: Self);
  fn atomic_into_inner(cell: Self::Atomic) -> Self;
}

macro_rules! impl_real {
  ($float:ty, $atomic:ty) => {
    impl Real for $float {
      type Atomic = $atomic;

      #[inline]
      fn atomic_new(value: Self) -> Self::Atomic {
        <$atomic>::new(value.to_bits())
      }

      #[inline]
      fn atomic_load(cell: &Self::Atomic) -> Self {
        <$float>::from_bits(cell.load(Ordering::Relaxed))
      }

      #[inline]
      fn atomic_add(cell: &Self::Atomic, value: Self) {
        let mut current = cell.load(Ordering::Relaxed);
        loop {
          let next = (<$float>::from_bits(current) + value).to_bits();
          match cell.compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return,
            Err(actual) => current = actual,
          }
        }
      }

      #[inline]
      fn atomic_into_inner(cell: Self::Atomic) -> Self {
        <$float>::from_bits(cell.into_inner())
      }
    }
  };
}

impl_real!(f32, AtomicU32);
impl_real!(f64, AtomicU64);
