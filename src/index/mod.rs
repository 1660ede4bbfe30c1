//! Traversal-order indexing.
//!
//! The wire format never carries addresses.  Every node is named by its
//! 0-based position in head-to-tail order, and the encoder and decoder agree
//! on nothing else.  Because [`List`](crate::list::List) stores nodes in
//! append order, storage position and traversal position are the same number.
//!
//! # Cross index on disk
//! A signed 32-bit value.  [`NO_CROSS`] (`-1`) means "no cross-reference".
//! Any other value outside `[0, count)` is resolved to "no cross-reference"
//! as well; it is never treated as corruption.

/// Sentinel stored in place of a cross index when a node has no cross-reference.
pub const NO_CROSS: i32 = -1;

/// Largest node count whose positions are all addressable by an `i32` cross index.
pub const MAX_ADDRESSABLE: usize = i32::MAX as usize;

/// Map an optional traversal position to its on-disk cross index.
///
/// Returns `None` when `position` cannot be represented as an `i32`; callers
/// reject such lists before encoding (see [`MAX_ADDRESSABLE`]).
#[inline]
pub fn to_wire(position: Option<usize>) -> Option<i32> {
    match position {
        None    => Some(NO_CROSS),
        Some(p) => i32::try_from(p).ok(),
    }
}

/// Resolve a stored cross index against a list of `len` nodes.
///
/// The sentinel and every out-of-range value map to `None`.
#[inline]
pub fn resolve(stored: i32, len: usize) -> Option<usize> {
    usize::try_from(stored).ok().filter(|&p| p < len)
}

/// Position before `position` in a chain, if any.
#[inline]
pub fn previous_of(position: usize) -> Option<usize> {
    position.checked_sub(1)
}

/// Position after `position` in a chain of `len` nodes, if any.
#[inline]
pub fn next_of(position: usize, len: usize) -> Option<usize> {
    let next = position + 1;
    (next < len).then_some(next)
}
