use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies one admitted incoming request, for logs and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(u64);

impl RequestId {
    pub fn new(value: u64) -> Self {
        RequestId(value)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RequestId({})", self.0)
    }
}

impl From<u64> for RequestId {
    fn from(value: u64) -> Self {
        RequestId::new(value)
    }
}

#[derive(Debug)]
pub struct RequestIdAllocator {
    next: AtomicU64,
}

impl RequestIdAllocator {
    pub const fn new() -> Self {
        RequestIdAllocator {
            next: AtomicU64::new(1),
        }
    }

    pub fn allocate(&self) -> RequestId {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        RequestId::new(id)
    }

    pub fn peek_next(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

impl Default for RequestIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_id_creation_and_display() {
        let id = RequestId::new(42);
        assert_eq!(id.as_u64(), 42);
        assert_eq!(format!("{}", id), "RequestId(42)");

        let from: RequestId = 7u64.into();
        assert_eq!(from.as_u64(), 7);
    }

    #[test]
    fn test_allocator_monotonic() {
        let allocator = RequestIdAllocator::new();

        assert_eq!(allocator.allocate().as_u64(), 1);
        assert_eq!(allocator.allocate().as_u64(), 2);
        assert_eq!(allocator.allocate().as_u64(), 3);
        assert_eq!(allocator.peek_next(), 4);
    }

    #[test]
    fn test_allocator_thread_safety() {
        let allocator = Arc::new(RequestIdAllocator::new());
        let mut handles = vec![];

        for _ in 0..8 {
            let alloc = Arc::clone(&allocator);
            handles.push(thread::spawn(move || {
                (0..100).map(|_| alloc.allocate().as_u64()).collect::<Vec<_>>()
            }));
        }

        let mut all_ids = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(all_ids.insert(id), "Duplicate ID found: {}", id);
            }
        }
        assert_eq!(all_ids.len(), 800);
    }

    #[test]
    fn test_serialization() {
        let id = RequestId::new(99);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "99");
        let back: RequestId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
