//! Payload identifiers and the bounded allocator that hands them out.
//!
//! Identifiers occupy a single header byte. Value `255` is reserved, leaving
//! [`PAYLOAD_ID_CAPACITY`] usable identifiers that are recycled once every
//! packet of the payload holding them has been handed to the transport.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use derive_more::{Display, Into};
use thiserror::Error;

/// Header value that is never allocated nor accepted on the wire.
pub const RESERVED_PAYLOAD_ID: u8 = u8::MAX;

/// Number of identifiers that may be in flight at once.
pub const PAYLOAD_ID_CAPACITY: usize = RESERVED_PAYLOAD_ID as usize;

/// Identifier shared by every packet of one payload.
///
/// # Examples
///
/// ```
/// use chunkwire::fragment::PayloadId;
///
/// let id = PayloadId::new(42).expect("42 is not reserved");
/// assert_eq!(id.get(), 42);
/// assert!(PayloadId::new(255).is_none());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Into)]
#[display("{_0}")]
pub struct PayloadId(u8);

impl PayloadId {
    /// Create an identifier, returning `None` for the reserved value.
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if value == RESERVED_PAYLOAD_ID {
            None
        } else {
            Some(Self(value))
        }
    }

    /// Return the header byte.
    #[must_use]
    pub const fn get(self) -> u8 { self.0 }

    fn slot(self) -> usize { usize::from(self.0) }
}

/// The reserved identifier was supplied where a payload id was expected.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("payload id {RESERVED_PAYLOAD_ID} is reserved")]
pub struct ReservedPayloadId;

impl TryFrom<u8> for PayloadId {
    type Error = ReservedPayloadId;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(ReservedPayloadId)
    }
}

/// Every identifier is currently leased to an undelivered payload.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("all {PAYLOAD_ID_CAPACITY} payload ids are in flight")]
pub struct PayloadIdExhausted;

#[derive(Debug)]
struct AllocatorState {
    cursor: u8,
    active: [bool; PAYLOAD_ID_CAPACITY],
    in_flight: usize,
}

/// Monotonic, wrap-around allocator over the usable identifier space.
///
/// Allocation scans forward from the last handed-out identifier and skips any
/// identifier still leased, so a payload id is never reused while packets
/// carrying it may still be queued.
///
/// # Examples
///
/// ```
/// use chunkwire::fragment::PayloadIdAllocator;
///
/// let allocator = PayloadIdAllocator::new();
/// let first = allocator.allocate().expect("ids available");
/// let second = allocator.allocate().expect("ids available");
/// assert_eq!((first.id().get(), second.id().get()), (0, 1));
/// assert_eq!(allocator.in_flight(), 2);
/// drop(first);
/// assert_eq!(allocator.in_flight(), 1);
/// ```
#[derive(Debug)]
pub struct PayloadIdAllocator {
    state: Mutex<AllocatorState>,
}

impl PayloadIdAllocator {
    /// Create an allocator whose first identifier is `0`.
    #[must_use]
    pub fn new() -> Arc<Self> { Self::with_starting_id(PayloadId(0)) }

    /// Create an allocator whose first identifier is `start_at`.
    #[must_use]
    pub fn with_starting_id(start_at: PayloadId) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(AllocatorState {
                cursor: start_at.get(),
                active: [false; PAYLOAD_ID_CAPACITY],
                in_flight: 0,
            }),
        })
    }

    /// Lease the next free identifier.
    ///
    /// The identifier returns to the pool when the lease is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadIdExhausted`] when all identifiers are leased.
    pub fn allocate(self: &Arc<Self>) -> Result<PayloadIdLease, PayloadIdExhausted> {
        let mut state = self.lock();
        if state.in_flight == PAYLOAD_ID_CAPACITY {
            return Err(PayloadIdExhausted);
        }

        let mut candidate = state.cursor;
        while state.active[usize::from(candidate)] {
            candidate = next_id(candidate);
        }
        state.active[usize::from(candidate)] = true;
        state.in_flight += 1;
        state.cursor = next_id(candidate);
        drop(state);

        Ok(PayloadIdLease {
            id: PayloadId(candidate),
            allocator: Arc::clone(self),
        })
    }

    /// Number of identifiers currently leased.
    #[must_use]
    pub fn in_flight(&self) -> usize { self.lock().in_flight }

    /// Whether `id` is currently leased.
    #[must_use]
    pub fn is_leased(&self, id: PayloadId) -> bool { self.lock().active[id.slot()] }

    fn release(&self, id: PayloadId) {
        let mut state = self.lock();
        if std::mem::replace(&mut state.active[id.slot()], false) {
            state.in_flight -= 1;
        }
    }

    fn lock(&self) -> MutexGuard<'_, AllocatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn next_id(current: u8) -> u8 {
    if current + 1 == RESERVED_PAYLOAD_ID {
        0
    } else {
        current + 1
    }
}

/// Exclusive use of one [`PayloadId`] until dropped.
#[derive(Debug)]
pub struct PayloadIdLease {
    id: PayloadId,
    allocator: Arc<PayloadIdAllocator>,
}

impl PayloadIdLease {
    /// The leased identifier.
    #[must_use]
    pub const fn id(&self) -> PayloadId { self.id }
}

impl Drop for PayloadIdLease {
    fn drop(&mut self) { self.allocator.release(self.id); }
}
