use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::Comment;

/// One fetched slice of root comments for a thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based page number.
    pub index: usize,
    pub results: Vec<Arc<Comment>>,
    pub total_results: usize,
    pub total_pages: usize,
}

impl Page {
    pub fn new(index: usize, results: Vec<Comment>, total_results: usize, total_pages: usize) -> Self {
        Page {
            index,
            results: results.into_iter().map(Arc::new).collect(),
            total_results,
            total_pages,
        }
    }

    pub fn with_results(&self, results: Vec<Arc<Comment>>) -> Page {
        Page {
            results,
            ..self.clone()
        }
    }

    pub fn is_last(&self) -> bool {
        self.index >= self.total_pages
    }
}
