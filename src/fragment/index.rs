//! Zero-based fragment positioning within a payload.
//!
//! Provides [`FragmentIndex`], a type-safe wrapper around the 16-bit index
//! carried in every packet header.

use std::num::TryFromIntError;

use derive_more::{Display, From};

/// Zero-based ordinal describing a fragment's position within its payload.
///
/// # Examples
///
/// ```
/// use chunkwire::fragment::FragmentIndex;
/// let index = FragmentIndex::new(3);
/// assert_eq!(index.get(), 3);
/// assert!(index.checked_increment().is_some());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From)]
#[display("{_0}")]
pub struct FragmentIndex(u16);

impl FragmentIndex {
    /// Construct an index from a `u16` value.
    #[must_use]
    pub const fn new(value: u16) -> Self { Self(value) }

    /// Return the first valid fragment index.
    #[must_use]
    pub const fn zero() -> Self { Self(0) }

    /// Return the underlying numeric value.
    #[must_use]
    pub const fn get(self) -> u16 { self.0 }

    /// Return the index as a `usize` for slice addressing.
    #[must_use]
    pub fn as_usize(self) -> usize { usize::from(self.0) }

    /// Increment the index, returning `None` on overflow.
    #[must_use]
    pub fn checked_increment(self) -> Option<Self> { self.0.checked_add(1).map(Self) }
}

impl TryFrom<usize> for FragmentIndex {
    type Error = TryFromIntError;

    fn try_from(value: usize) -> Result<Self, Self::Error> { u16::try_from(value).map(Self) }
}

impl From<FragmentIndex> for u16 {
    fn from(value: FragmentIndex) -> Self { value.0 }
}
