pub mod bucket;
pub mod functions;

use bytes::Bytes;
use std::sync::Arc;
use thiserror::Error as ThisError;

use crate::store::{Output, Store, StoreError, Value};

#[derive(Debug, ThisError, PartialEq)]
pub enum ListError {
    #[error("ERR {0}")]
    Argument(&'static str),
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ListError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::WrongType { .. } => ListError::WrongType,
            StoreError::InvalidValue(msg) => ListError::Argument(msg),
            err => ListError::Store(err),
        }
    }
}

/// List operations over the grid.
///
/// Every mutation is expressed as a transform from [`functions`] and handed to
/// [`Store::apply`], so each call is atomic for its key no matter how many connections or nodes
/// touch it. Store failures come back as [`ListError`], never as raw [`StoreError`]s.
#[derive(Clone)]
pub struct ListMultimap {
    store: Arc<dyn Store>,
}

impl ListMultimap {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Number of elements in the list, 0 if the key does not exist.
    pub async fn size(&self, key: &Bytes) -> Result<usize, ListError> {
        match self.store.get(key).await?.as_deref() {
            Some(Value::List(bucket)) => Ok(bucket.size()),
            Some(_) => Err(ListError::WrongType),
            None => Ok(0),
        }
    }

    /// Inserts `values` at the head, one after the other, as a single atomic update. Returns the
    /// length of the list afterwards.
    pub async fn offer_first(&self, key: Bytes, values: Vec<Bytes>) -> Result<usize, ListError> {
        self.offer(key, values, true).await
    }

    /// Appends `values` at the tail as a single atomic update. Returns the length of the list
    /// afterwards.
    pub async fn offer_last(&self, key: Bytes, values: Vec<Bytes>) -> Result<usize, ListError> {
        self.offer(key, values, false).await
    }

    async fn offer(&self, key: Bytes, values: Vec<Bytes>, first: bool) -> Result<usize, ListError> {
        match self.store.apply(key, functions::offer(values, first)).await? {
            Output::Size(size) => Ok(size),
            output => Err(unexpected(output)),
        }
    }

    /// The element at `index`, counting from the tail when negative. `None` when the key does not
    /// exist or the index is out of range.
    pub async fn index(&self, key: Bytes, index: i64) -> Result<Option<Bytes>, ListError> {
        match self.store.apply(key, functions::index(index)).await? {
            Output::Element(element) => Ok(element),
            output => Err(unexpected(output)),
        }
    }

    /// The elements between `from` and `to`, both inclusive. `None` when the key does not exist.
    pub async fn sublist(
        &self,
        key: Bytes,
        from: i64,
        to: i64,
    ) -> Result<Option<Vec<Bytes>>, ListError> {
        match self.store.apply(key, functions::sublist(from, to)).await? {
            Output::Elements(elements) => Ok(elements),
            output => Err(unexpected(output)),
        }
    }

    /// Removes up to `count` elements from the head. `None` when the key does not exist.
    pub async fn poll_first(&self, key: Bytes, count: i64) -> Result<Option<Vec<Bytes>>, ListError> {
        self.poll(key, count, true).await
    }

    /// Removes up to `count` elements from the tail, returned head to tail. `None` when the key
    /// does not exist.
    pub async fn poll_last(&self, key: Bytes, count: i64) -> Result<Option<Vec<Bytes>>, ListError> {
        self.poll(key, count, false).await
    }

    async fn poll(
        &self,
        key: Bytes,
        count: i64,
        first: bool,
    ) -> Result<Option<Vec<Bytes>>, ListError> {
        let count = require_positive(count)?;

        match self.store.apply(key, functions::poll(first, count)).await? {
            Output::Elements(elements) => Ok(elements),
            output => Err(unexpected(output)),
        }
    }
}

fn require_positive(count: i64) -> Result<usize, ListError> {
    usize::try_from(count).map_err(|_| ListError::Argument("value is out of range, must be positive"))
}

fn unexpected(output: Output) -> ListError {
    ListError::Store(StoreError::Unavailable(format!(
        "unexpected transform output {:?}",
        output
    )))
}
