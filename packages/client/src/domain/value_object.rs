//! Value Objects for domain models.
//!
//! Value Objects are immutable objects that represent values in the domain.
//! They are compared by their value, not by identity.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use serde::{Deserialize, Serialize};

use chatlink_shared::time::current_unix_millis;

/// Message identifier value object.
///
/// Assigned by the caller. Unique enough to tell messages of one session
/// apart, but not globally unique by contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MsgId(i64);

impl MsgId {
    /// Create a new MsgId.
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the inner i64 value.
    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for MsgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User identifier value object.
///
/// Represents an account id assigned by the chat server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Create a new UserId.
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the inner i64 value.
    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Group identifier value object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(i64);

impl GroupId {
    /// Create a new GroupId.
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the inner i64 value.
    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out message ids.
///
/// The first id is the current time in milliseconds; every later id is
/// strictly greater than the previous one, even when the clock stalls or
/// steps backwards.
#[derive(Debug)]
pub struct MsgIdGenerator {
    last: AtomicI64,
}

impl MsgIdGenerator {
    /// Create a generator seeded from the wall clock.
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Create a generator whose ids are all greater than `floor`.
    pub fn starting_at(floor: i64) -> Self {
        Self {
            last: AtomicI64::new(floor),
        }
    }

    /// Get the next id.
    pub fn next_id(&self) -> MsgId {
        let now = current_unix_millis();
        let mut current = self.last.load(Ordering::SeqCst);
        loop {
            let candidate = now.max(current + 1);
            match self.last.compare_exchange(
                current,
                candidate,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return MsgId::new(candidate),
                Err(actual) => current = actual,
            }
        }
    }
}

impl Default for MsgIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
