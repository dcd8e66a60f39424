//! Chunked pagination cursor
//!
//! Remote collections are walked in fixed-size chunks. The walker holds no
//! IO: the caller asks for the next window, fetches it, and reports how
//! many items came back. Exhaustion is detected from a short page, never
//! from a server-reported total. When the collection size is an exact
//! multiple of the chunk size this costs one extra empty-page request.

use provider_traits::provider::PageQuery;

/// Sans-io cursor over a chunked remote collection
#[derive(Debug)]
pub struct PageWalker {
    chunk_size: u64,
    offset: u64,
    finished: bool,
}

impl PageWalker {
    pub fn new(chunk_size: u64) -> Self {
        Self {
            chunk_size,
            offset: 0,
            finished: false,
        }
    }

    /// The next window to request, or `None` once the collection is
    /// exhausted
    pub fn next_query(&self) -> Option<PageQuery> {
        if self.finished {
            return None;
        }
        Some(PageQuery::new(self.offset, self.chunk_size))
    }

    /// Record the size of the page the last window returned
    pub fn record_page(&mut self, returned: usize) {
        if (returned as u64) < self.chunk_size {
            self.finished = true;
        } else {
            self.offset += self.chunk_size;
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
