//! The backing store contract.
//!
//! Everything the RESP layer needs from the data grid goes through the [`Store`] trait: reading a
//! key, atomically applying a pure transform to a key, and listening for changes. Replication,
//! eviction and marshalling all live behind it.

pub mod memory;

use bytes::Bytes;
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;
use thiserror::Error as ThisError;

use crate::list::bucket::ListBucket;

pub use memory::MemoryStore;

/// The value held by a single key.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bytes(Bytes),
    List(ListBucket<Bytes>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bytes(_) => "string",
            Value::List(_) => "list",
        }
    }
}

/// What a transform wants committed for its key.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    Keep,
    Put(Value),
    Remove,
}

/// The result handed back to the caller once a transform commits.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Unit,
    Flag(bool),
    Float(f64),
    /// Length of the value after the update.
    Size(usize),
    Element(Option<Bytes>),
    /// `None` when the key did not exist.
    Elements(Option<Vec<Bytes>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub update: Update,
    pub output: Output,
}

impl Applied {
    pub fn new(update: Update, output: Output) -> Self {
        Self { update, output }
    }

    pub fn read(output: Output) -> Self {
        Self {
            update: Update::Keep,
            output,
        }
    }
}

/// A side-effect free function from the latest committed value of a key to the value that should
/// replace it. The store may call it several times for one `apply`.
pub type Transform = Arc<dyn Fn(Option<&Value>) -> Result<Applied, StoreError> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Created,
    Modified,
    Removed,
}

#[derive(Debug, Clone)]
pub struct Event {
    pub key: Bytes,
    pub kind: EventKind,
    /// The committed value. Absent for removals.
    pub value: Option<Arc<Value>>,
}

/// Receives change notifications. Called on whatever task committed the change, so
/// implementations hand the event off instead of doing work in place.
pub trait Listener: Send + Sync {
    fn on_event(&self, event: &Event);
}

/// Decides which keys a listener hears about.
pub struct KeyFilter(Box<dyn Fn(&[u8]) -> bool + Send + Sync>);

impl KeyFilter {
    pub fn new(accept: impl Fn(&[u8]) -> bool + Send + Sync + 'static) -> Self {
        Self(Box::new(accept))
    }

    /// Accepts only events for exactly `key`.
    pub fn exact(key: Bytes) -> Self {
        Self::new(move |candidate| candidate == &key[..])
    }

    pub fn accept(&self, key: &[u8]) -> bool {
        (self.0)(key)
    }
}

impl fmt::Debug for KeyFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyFilter")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

#[derive(Debug, Clone, ThisError, PartialEq)]
pub enum StoreError {
    /// The key holds a value of a different type than the operation expects.
    #[error("key holds a {actual} value")]
    WrongType { actual: &'static str },
    /// The existing value cannot be used by the operation (e.g. not a number).
    #[error("{0}")]
    InvalidValue(&'static str),
    /// The store itself failed. The request cannot be answered.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Atomic single-key access to the grid.
///
/// `apply` is linearizable per key: the transform is run against the latest committed value and
/// its result committed only if nothing else committed in between, otherwise it is run again.
pub trait Store: Send + Sync {
    fn get(&self, key: &Bytes) -> BoxFuture<'static, Result<Option<Arc<Value>>, StoreError>>;

    fn apply(&self, key: Bytes, transform: Transform) -> BoxFuture<'static, Result<Output, StoreError>>;

    fn add_listener(
        &self,
        filter: KeyFilter,
        listener: Arc<dyn Listener>,
    ) -> BoxFuture<'static, Result<ListenerId, StoreError>>;

    fn remove_listener(&self, id: ListenerId) -> BoxFuture<'static, Result<(), StoreError>>;
}
