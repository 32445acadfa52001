//! Pages produced by a paginated read, and fixed-size batches cut from them.

/// One page of input plus the opaque token that fetches the next one.
///
/// A missing token marks the end of the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T, K> {
    pub items: Vec<T>,
    pub next_page_token: Option<K>,
}

impl<T, K> Page<T, K> {
    /// Final page of the stream.
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_page_token: None,
        }
    }

    /// A page followed by more pages, fetched with `token`.
    pub fn more(items: Vec<T>, token: K) -> Self {
        Self {
            items,
            next_page_token: Some(token),
        }
    }

    pub fn is_last(&self) -> bool {
        self.next_page_token.is_none()
    }

    pub fn into_parts(self) -> (Vec<T>, Option<K>) {
        (self.items, self.next_page_token)
    }
}

/// Number of batches `len` items split into at `size` items per batch.
pub fn batch_count(len: usize, size: usize) -> usize {
    if size == 0 { 0 } else { len.div_ceil(size) }
}

/// Owned, order-preserving chunks of at most `size` items.
///
/// The last batch holds the remainder; an empty input yields nothing.
pub struct Batches<T> {
    items: std::vec::IntoIter<T>,
    size: usize,
}

impl<T> Batches<T> {
    pub fn new(items: Vec<T>, size: std::num::NonZeroUsize) -> Self {
        Self {
            items: items.into_iter(),
            size: size.get(),
        }
    }
}

impl<T> Iterator for Batches<T> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Vec<T>> {
        let batch: Vec<T> = self.items.by_ref().take(self.size).collect();
        if batch.is_empty() { None } else { Some(batch) }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = batch_count(self.items.len(), self.size);
        (remaining, Some(remaining))
    }
}

impl<T> ExactSizeIterator for Batches<T> {}
