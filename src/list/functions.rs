//! Pure transforms applied to a list key through [`Store::apply`](crate::store::Store::apply).
//!
//! None of these functions touch anything but their input: the store may run them more than once
//! against different values of the key before one result commits.

use bytes::Bytes;
use std::sync::Arc;

use crate::list::bucket::ListBucket;
use crate::store::{Applied, Output, StoreError, Transform, Update, Value};

fn bucket(current: Option<&Value>) -> Result<Option<&ListBucket<Bytes>>, StoreError> {
    match current {
        None => Ok(None),
        Some(Value::List(bucket)) => Ok(Some(bucket)),
        Some(other) => Err(StoreError::WrongType {
            actual: other.type_name(),
        }),
    }
}

/// Inserts every value in one commit, creating the list when the key is missing.
pub fn offer(values: Vec<Bytes>, first: bool) -> Transform {
    Arc::new(move |current| {
        let next = match bucket(current)? {
            Some(bucket) => bucket.offer(values.iter().cloned(), first),
            None => ListBucket::new().offer(values.iter().cloned(), first),
        };
        let size = next.size();
        Ok(Applied::new(Update::Put(Value::List(next)), Output::Size(size)))
    })
}

pub fn index(index: i64) -> Transform {
    Arc::new(move |current| {
        let element = bucket(current)?.and_then(|bucket| bucket.index(index).cloned());
        Ok(Applied::read(Output::Element(element)))
    })
}

pub fn sublist(from: i64, to: i64) -> Transform {
    Arc::new(move |current| {
        let elements = bucket(current)?.map(|bucket| bucket.sublist(from, to));
        Ok(Applied::read(Output::Elements(elements)))
    })
}

pub fn poll(first: bool, count: usize) -> Transform {
    Arc::new(move |current| {
        let Some(bucket) = bucket(current)? else {
            return Ok(Applied::read(Output::Elements(None)));
        };

        if count == 0 {
            return Ok(Applied::read(Output::Elements(Some(Vec::new()))));
        }

        let (polled, remaining) = bucket.poll(first, count);
        // A drained list is indistinguishable from a missing key, so it is not kept around.
        let update = if remaining.is_empty() {
            Update::Remove
        } else {
            Update::Put(Value::List(remaining))
        };

        Ok(Applied::new(update, Output::Elements(Some(polled))))
    })
}
