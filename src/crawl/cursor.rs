//! Highest-seen post identifier shared by a crawl's extraction tasks.

use std::sync::Mutex;

use crate::api::PostId;

/// Running maximum of the post identifiers seen during one crawl.
#[derive(Debug, Default)]
pub struct CursorState {
    highest: Mutex<Option<PostId>>,
}

impl CursorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the cursor to `id` if it is higher. Never lowers it.
    pub fn observe(&self, id: PostId) {
        let mut highest = self.highest.lock().unwrap_or_else(|e| e.into_inner());
        if highest.map_or(true, |current| id > current) {
            *highest = Some(id);
        }
    }

    /// The highest identifier observed so far.
    pub fn highest(&self) -> Option<PostId> {
        *self.highest.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_only_raises() {
        let cursor = CursorState::new();
        assert_eq!(cursor.highest(), None);

        cursor.observe(PostId(104));
        cursor.observe(PostId(105));
        cursor.observe(PostId(99));
        assert_eq!(cursor.highest(), Some(PostId(105)));
    }

    #[test]
    fn test_numeric_not_lexical() {
        let cursor = CursorState::new();
        cursor.observe(PostId(999));
        cursor.observe(PostId(1000));
        assert_eq!(cursor.highest(), Some(PostId(1000)));
    }

    #[test]
    fn test_concurrent_observers_keep_maximum() {
        let cursor = Arc::new(CursorState::new());

        let handles: Vec<_> = (0..8u64)
            .map(|t| {
                let cursor = Arc::clone(&cursor);
                std::thread::spawn(move || {
                    for i in 0..500u64 {
                        cursor.observe(PostId(i * 8 + t));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cursor.highest(), Some(PostId(499 * 8 + 7)));
    }
}
