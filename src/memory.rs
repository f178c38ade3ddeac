use num::{NumCast, Zero, Float};
use std::{
    fmt::{Debug, Display, LowerExp}, iter::Sum, ops::{Add, AddAssign, DivAssign, Sub, SubAssign}
};

pub trait Primitive: Add + AddAssign + Sum + Sub + SubAssign + DivAssign + Zero + Float + NumCast
                + PartialOrd + Copy + Default + Display + Debug + Sync + Send + LowerExp + 'static
                + for<'a> AddAssign<&'a Self> {}
impl Primitive for f32 {}
impl Primitive for f64 {}

/// Convert a point count into the primitive type used for the calculation.
#[inline(always)]
pub(crate) fn from_count<T: Primitive>(count: usize) -> T {
    // every usize is representable (possibly rounded) by f32 and f64
    T::from(count).unwrap_or_else(T::infinity)
}
