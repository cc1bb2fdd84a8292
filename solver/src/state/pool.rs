//! An optional free-list of `Domain` buffers, reused by propagators that would otherwise
//! allocate a fresh `Domain` per candidate narrowing and discard most of them. Off by
//! default (`Config::enable_pooling`): the retrieval pack documents this choice as
//! performance-neutral in practice, so it is kept as an implementation option rather than
//! a mandated feature.

use crate::core::IntCst;
use crate::domain::Domain;

#[derive(Default)]
pub struct DomainPool {
    free: Vec<Domain>,
}

impl DomainPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes a pooled empty-capacity buffer matching `capacity`, or allocates a fresh one.
    pub fn take(&mut self, capacity: IntCst) -> Domain {
        if let Some(pos) = self.free.iter().position(|d| d.capacity() == capacity) {
            let mut d = self.free.swap_remove(pos);
            d.clear();
            d
        } else {
            Domain::empty(capacity)
        }
    }

    /// Returns a no-longer-referenced `Domain` to the pool for future reuse.
    pub fn recycle(&mut self, domain: Domain) {
        self.free.push(domain);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recycled_buffer_is_reused() {
        let mut pool = DomainPool::new();
        let d = pool.take(10);
        pool.recycle(d);
        assert_eq!(pool.free.len(), 1);
        let d2 = pool.take(10);
        assert!(d2.is_empty());
        assert_eq!(pool.free.len(), 0);
    }
}
