//! Resource vectors.
//!
//! A [`Resource`] is a small value type. Components are signed so that an
//! over-committed node shows up as a negative available ledger. Arithmetic
//! saturates at the `i64` bounds, so absurd caller-supplied values clamp
//! instead of panicking.

use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// Memory and compute shares requested by, or available to, containers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resource {
    /// Memory in megabytes.
    pub memory_mb: i64,

    /// Virtual cores.
    pub vcores: i64,
}

impl Resource {
    pub const ZERO: Self = Self {
        memory_mb: 0,
        vcores: 0,
    };

    #[must_use]
    pub const fn new(memory_mb: i64, vcores: i64) -> Self {
        Self { memory_mb, vcores }
    }

    /// A resource with only a memory component.
    #[must_use]
    pub const fn memory(memory_mb: i64) -> Self {
        Self::new(memory_mb, 0)
    }

    /// Returns true if no component is negative.
    pub fn is_non_negative(&self) -> bool {
        self.memory_mb >= 0 && self.vcores >= 0
    }

    /// Returns true if every component of `self` is at most the matching component of `other`.
    pub fn fits_in(&self, other: &Resource) -> bool {
        self.memory_mb <= other.memory_mb && self.vcores <= other.vcores
    }
}

impl Add for Resource {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(
            self.memory_mb.saturating_add(rhs.memory_mb),
            self.vcores.saturating_add(rhs.vcores),
        )
    }
}

impl AddAssign for Resource {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Resource {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(
            self.memory_mb.saturating_sub(rhs.memory_mb),
            self.vcores.saturating_sub(rhs.vcores),
        )
    }
}

impl SubAssign for Resource {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl std::iter::Sum for Resource {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<memory:{}, vCores:{}>", self.memory_mb, self.vcores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_arithmetic() {
        let a = Resource::new(1024, 4);
        let b = Resource::new(256, 1);

        assert_eq!(a + b, Resource::new(1280, 5));
        assert_eq!(a - b, Resource::new(768, 3));

        let mut c = a;
        c -= b;
        c += b;
        assert_eq!(c, a);
    }

    #[test]
    fn test_resource_can_go_negative() {
        let available = Resource::memory(100) - Resource::memory(300);
        assert_eq!(available.memory_mb, -200);
        assert!(!available.is_non_negative());
    }

    #[test]
    fn test_resource_fits_in() {
        let node = Resource::new(1000, 4);
        assert!(Resource::new(1000, 4).fits_in(&node));
        assert!(Resource::new(200, 1).fits_in(&node));
        assert!(!Resource::new(200, 5).fits_in(&node));
        assert!(!Resource::new(1001, 0).fits_in(&node));
    }

    #[test]
    fn test_resource_sum() {
        let total: Resource = [Resource::memory(100), Resource::new(50, 2)]
            .into_iter()
            .sum();
        assert_eq!(total, Resource::new(150, 2));
    }

    #[test]
    fn test_resource_arithmetic_saturates() {
        let huge = Resource::new(i64::MAX, i64::MAX);
        assert_eq!(huge + Resource::new(1, 1), huge);

        let total: Resource = [huge, huge].into_iter().sum();
        assert_eq!(total, huge);

        let mut low = Resource::new(i64::MIN, 0);
        low -= Resource::new(1, 0);
        assert_eq!(low.memory_mb, i64::MIN);
    }

    #[test]
    fn test_resource_display() {
        assert_eq!(Resource::new(512, 2).to_string(), "<memory:512, vCores:2>");
    }
}
