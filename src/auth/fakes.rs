//! Cheap collaborators for tests that count how often they are used.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread::ThreadId;

use super::jwt::{TokenError, TokenSigner};
use super::password::{CredentialHasher, HashingError};

#[derive(Default)]
pub struct FakeHasher {
    pub hashes: AtomicUsize,
    pub verifies: AtomicUsize,
    /// Thread of every hash or verify call, in order.
    pub threads: Mutex<Vec<ThreadId>>,
    failing: AtomicBool,
}

impl FakeHasher {
    pub fn failing() -> Self {
        let hasher = Self::default();
        hasher.failing.store(true, Ordering::SeqCst);
        hasher
    }

    pub fn calls(&self) -> usize {
        self.hashes.load(Ordering::SeqCst) + self.verifies.load(Ordering::SeqCst)
    }
}

impl CredentialHasher for FakeHasher {
    fn hash(&self, plain: &str) -> Result<String, HashingError> {
        self.hashes.fetch_add(1, Ordering::SeqCst);
        self.threads.lock().unwrap().push(std::thread::current().id());
        if self.failing.load(Ordering::SeqCst) {
            return Err(HashingError("entropy source unavailable".into()));
        }
        Ok(format!("fake${}", plain.chars().rev().collect::<String>()))
    }

    fn verify(&self, secret: &str, plain: &str) -> bool {
        self.verifies.fetch_add(1, Ordering::SeqCst);
        self.threads.lock().unwrap().push(std::thread::current().id());
        secret == format!("fake${}", plain.chars().rev().collect::<String>())
    }
}

/// Wraps a real signer and counts `sign` calls.
pub struct CountingSigner<S> {
    inner: S,
    pub signs: AtomicUsize,
}

impl<S> CountingSigner<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            signs: AtomicUsize::new(0),
        }
    }

    pub fn signs(&self) -> usize {
        self.signs.load(Ordering::SeqCst)
    }
}

impl<S: TokenSigner> TokenSigner for CountingSigner<S> {
    fn sign(&self, user_id: i64) -> Result<String, TokenError> {
        self.signs.fetch_add(1, Ordering::SeqCst);
        self.inner.sign(user_id)
    }

    fn verify(&self, token: &str) -> Result<i64, TokenError> {
        self.inner.verify(token)
    }
}
