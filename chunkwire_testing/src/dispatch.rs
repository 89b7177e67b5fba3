//! A dispatcher that keeps every delivery for later inspection.

use std::sync::{Arc, Mutex, PoisonError};

use chunkwire::dispatch::{Delivery, Dispatcher};

/// Cloneable dispatcher recording deliveries in arrival order.
#[derive(Clone, Debug, Default)]
pub struct RecordingDispatcher {
    deliveries: Arc<Mutex<Vec<Delivery>>>,
}

impl RecordingDispatcher {
    /// Copy of every delivery so far.
    #[must_use]
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remove and return every delivery so far.
    #[must_use]
    pub fn take(&self) -> Vec<Delivery> {
        std::mem::take(&mut *self.deliveries.lock().unwrap_or_else(PoisonError::into_inner))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.deliveries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl Dispatcher for RecordingDispatcher {
    fn dispatch(&self, delivery: Delivery) {
        self.deliveries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(delivery);
    }
}
