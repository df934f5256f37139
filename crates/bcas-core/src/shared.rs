//! Thread-safe handle to a pseudo card.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{
    card::{BcasCard, EcmResult, PseudoCard},
    correlator::CorrelatorEvent,
    env::Environment,
    error::CardError,
    status::{CardStatus, InitStatus},
};

/// Cloneable handle sharing one [`PseudoCard`] between a producer and readers.
///
/// The capture reader calls [`push`](Self::push) while descrambler threads
/// call [`process_ecm`](Self::process_ecm). Each call holds the lock for its
/// whole duration, so a lookup never observes a history mid-update.
#[derive(Debug)]
pub struct SharedCard<E: Environment> {
    inner: Arc<Mutex<PseudoCard<E>>>,
}

impl<E: Environment> Clone for SharedCard<E> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<E: Environment> SharedCard<E> {
    /// Wrap a card.
    pub fn new(card: PseudoCard<E>) -> Self {
        Self { inner: Arc::new(Mutex::new(card)) }
    }

    // Poisoning is ignored; readers keep serving whatever history remains.
    fn lock(&self) -> MutexGuard<'_, PseudoCard<E>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Feed captured stream bytes.
    pub fn push(&self, data: &[u8]) -> Vec<CorrelatorEvent> {
        self.lock().push(data)
    }

    /// Look up the key material captured for `request`.
    pub fn process_ecm(&self, request: &[u8]) -> Result<EcmResult, CardError> {
        self.lock().process_ecm(request)
    }

    /// Snapshot of the card's counters.
    pub fn get_status(&self) -> CardStatus {
        self.lock().get_status()
    }

    /// Personalisation data, if installed.
    pub fn get_init_status(&self) -> Result<InitStatus, CardError> {
        self.lock().get_init_status()
    }

    /// Change the number of records kept.
    pub fn set_capacity(&self, capacity: usize) {
        self.lock().set_capacity(capacity);
    }

    /// Run `f` with exclusive access to the card.
    pub fn with<R>(&self, f: impl FnOnce(&mut PseudoCard<E>) -> R) -> R {
        f(&mut self.lock())
    }
}

impl<E: Environment> BcasCard for SharedCard<E> {
    fn init(&mut self) -> Result<(), CardError> {
        self.lock().init()
    }

    fn get_init_status(&self) -> Result<InitStatus, CardError> {
        Self::get_init_status(self)
    }

    fn process_ecm(&mut self, request: &[u8]) -> Result<EcmResult, CardError> {
        Self::process_ecm(self, request)
    }

    fn get_status(&self) -> CardStatus {
        Self::get_status(self)
    }
}
