use std::collections::VecDeque;

/// Immutable snapshot of a list-valued entry.
///
/// A bucket is never changed once built: `offer` and `poll` hand back a new bucket and leave the
/// receiver untouched. The store may run a transform several times against different snapshots
/// before one of them commits, so transforms must only ever derive new buckets from old ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListBucket<V> {
    values: VecDeque<V>,
}

impl<V> Default for ListBucket<V> {
    fn default() -> Self {
        Self {
            values: VecDeque::new(),
        }
    }
}

impl<V: Clone> ListBucket<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn size(&self) -> usize {
        self.values.len()
    }

    pub fn to_vec(&self) -> Vec<V> {
        self.values.iter().cloned().collect()
    }

    /// Returns a new bucket with `values` inserted one after the other at the head (`first`) or
    /// at the tail. Offered at the head, they end up in reverse order.
    pub fn offer<I>(&self, values: I, first: bool) -> ListBucket<V>
    where
        I: IntoIterator<Item = V>,
    {
        let mut next = self.values.clone();

        for value in values {
            if first {
                next.push_front(value);
            } else {
                next.push_back(value);
            }
        }

        ListBucket { values: next }
    }

    /// Returns the element at `index`. Zero is the head, `-1` the tail. Out of range yields
    /// `None`.
    pub fn index(&self, index: i64) -> Option<&V> {
        if index == 0 {
            return self.values.front();
        }

        let len = self.values.len() as i64;
        if index == len - 1 {
            return self.values.back();
        }

        if index > 0 {
            if index >= len {
                return None;
            }
            return self.values.get(index as usize);
        }

        let from_tail = index.unsigned_abs();
        if from_tail > len as u64 {
            return None;
        }
        self.values.iter().rev().nth(from_tail as usize - 1)
    }

    /// Inclusive range between `from` and `to`, either of which may count from the tail.
    pub fn sublist(&self, from: i64, to: i64) -> Vec<V> {
        // Two non-negative or two negative offsets in the wrong order always produce nothing.
        // Mixed signs fall through to the normalized scan below.
        if (from >= 0 && to >= 0 && from > to) || (from < 0 && to < 0 && from > to) {
            return Vec::new();
        }

        if from == to {
            return self.index(from).cloned().into_iter().collect();
        }

        let len = self.values.len() as i64;
        let from = if from < 0 { len + from } else { from };
        let to = if to < 0 { len + to } else { to };

        self.values
            .iter()
            .enumerate()
            .skip_while(|(offset, _)| (*offset as i64) < from)
            .take_while(|(offset, _)| (*offset as i64) <= to)
            .map(|(_, value)| value.clone())
            .collect()
    }

    /// Removes up to `count` elements from the head (`first`) or the tail.
    ///
    /// The removed elements are returned in list order, head to tail, whichever end they were
    /// taken from. The second value is the bucket that remains.
    pub fn poll(&self, first: bool, count: usize) -> (Vec<V>, ListBucket<V>) {
        if count >= self.values.len() {
            return (self.to_vec(), ListBucket::new());
        }

        let mut remaining = self.values.clone();
        let polled: Vec<V> = if first {
            remaining.drain(..count).collect()
        } else {
            let split = remaining.len() - count;
            remaining.drain(split..).collect()
        };

        (polled, ListBucket { values: remaining })
    }
}

impl<V> FromIterator<V> for ListBucket<V> {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> ListBucket<&'static str> {
        ListBucket::from_iter(["a", "b", "c"])
    }

    #[test]
    fn offer_leaves_original_untouched() {
        let bucket = ListBucket::new().offer(["b"], false);

        let head = bucket.offer(["a"], true);
        let tail = head.offer(["c"], false);

        assert_eq!(bucket.to_vec(), vec!["b"]);
        assert_eq!(head.to_vec(), vec!["a", "b"]);
        assert_eq!(tail.to_vec(), vec!["a", "b", "c"]);
    }

    #[test]
    fn offer_many() {
        let bucket = abc();

        assert_eq!(
            bucket.offer(["x", "y"], true).to_vec(),
            vec!["y", "x", "a", "b", "c"]
        );
        assert_eq!(
            bucket.offer(["x", "y"], false).to_vec(),
            vec!["a", "b", "c", "x", "y"]
        );
    }

    #[test]
    fn index() {
        let bucket = abc();

        assert_eq!(bucket.index(0), Some(&"a"));
        assert_eq!(bucket.index(1), Some(&"b"));
        assert_eq!(bucket.index(2), Some(&"c"));
        assert_eq!(bucket.index(3), None);
        assert_eq!(bucket.index(-1), Some(&"c"));
        assert_eq!(bucket.index(-3), Some(&"a"));
        assert_eq!(bucket.index(-4), None);
    }

    #[test]
    fn index_on_empty_bucket() {
        let bucket: ListBucket<&str> = ListBucket::new();

        assert_eq!(bucket.index(0), None);
        assert_eq!(bucket.index(-1), None);
        assert_eq!(bucket.index(5), None);
    }

    #[test]
    fn sublist_single_element() {
        let bucket = abc();

        assert_eq!(bucket.sublist(0, 0), vec!["a"]);
        assert_eq!(bucket.sublist(-1, -1), vec!["c"]);
        assert_eq!(bucket.sublist(7, 7), Vec::<&str>::new());
    }

    #[test]
    fn sublist_reversed_bounds() {
        let bucket = abc();

        assert_eq!(bucket.sublist(2, 1), Vec::<&str>::new());
        assert_eq!(bucket.sublist(-1, -2), Vec::<&str>::new());
    }

    #[test]
    fn sublist_ranges() {
        let bucket = abc();

        assert_eq!(bucket.sublist(0, -1), vec!["a", "b", "c"]);
        assert_eq!(bucket.sublist(1, 10), vec!["b", "c"]);
        assert_eq!(bucket.sublist(-2, -1), vec!["b", "c"]);
        assert_eq!(bucket.sublist(-100, 1), vec!["a", "b"]);
        // Mixed signs are normalized and may still be empty.
        assert_eq!(bucket.sublist(2, -3), Vec::<&str>::new());
        assert_eq!(bucket.sublist(-3, 1), vec!["a", "b"]);
    }

    #[test]
    fn poll_from_head() {
        let bucket = abc();

        let (polled, remaining) = bucket.poll(true, 2);

        assert_eq!(polled, vec!["a", "b"]);
        assert_eq!(remaining.to_vec(), vec!["c"]);
        assert_eq!(bucket.size(), 3);
    }

    #[test]
    fn poll_from_tail_keeps_list_order() {
        let bucket = abc();

        let (polled, remaining) = bucket.poll(false, 2);

        assert_eq!(polled, vec!["b", "c"]);
        assert_eq!(remaining.to_vec(), vec!["a"]);
    }

    #[test]
    fn poll_everything() {
        let bucket = abc();

        let (polled, remaining) = bucket.poll(false, 3);
        assert_eq!(polled, vec!["a", "b", "c"]);
        assert!(remaining.is_empty());

        let (polled, remaining) = bucket.poll(true, 10);
        assert_eq!(polled, vec!["a", "b", "c"]);
        assert!(remaining.is_empty());
    }

    #[test]
    fn poll_nothing() {
        let bucket = abc();

        let (polled, remaining) = bucket.poll(true, 0);

        assert!(polled.is_empty());
        assert_eq!(remaining, bucket);
    }
}
