/// Source pool
///
/// Reusable collection of source handles. Grows on demand, never caps and
/// never shrinks. The pool only manages activation; audio parameters are the
/// caller's to reset before reuse.
use std::collections::VecDeque;
use std::fmt;

use super::source::{AudioSource, SourceFactory};

pub struct SourcePool {
    factory: Box<dyn SourceFactory>,
    idle: VecDeque<Box<dyn AudioSource>>,
    constructed: usize,
}

impl SourcePool {
    /// Create a pool and construct `start_size` idle sources up front
    pub fn new(factory: Box<dyn SourceFactory>, start_size: usize) -> Self {
        let mut pool = Self {
            factory,
            idle: VecDeque::with_capacity(start_size),
            constructed: 0,
        };
        for _ in 0..start_size {
            let source = pool.construct();
            pool.release(source);
        }
        pool
    }

    fn construct(&mut self) -> Box<dyn AudioSource> {
        self.constructed += 1;
        self.factory.create_source()
    }

    /// Take an idle source, constructing a new one if none is left
    pub fn acquire(&mut self) -> Box<dyn AudioSource> {
        let mut source = match self.idle.pop_front() {
            Some(source) => source,
            None => {
                let source = self.construct();
                tracing::debug!("Source pool grew to {} sources", self.constructed);
                source
            }
        };
        source.set_active(true);
        source
    }

    /// Return a source to the idle set
    pub fn release(&mut self, mut source: Box<dyn AudioSource>) {
        source.set_active(false);
        source.set_position([0.0; 3]);
        self.idle.push_back(source);
    }

    pub fn idle_count(&self) -> usize {
        self.idle.len()
    }

    /// Total number of sources ever constructed by this pool
    pub fn size(&self) -> usize {
        self.constructed
    }

    /// Sources currently handed out
    pub fn in_use(&self) -> usize {
        self.constructed - self.idle.len()
    }
}

impl fmt::Debug for SourcePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourcePool")
            .field("idle", &self.idle.len())
            .field("constructed", &self.constructed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_system::headless::HeadlessFactory;

    #[test]
    fn test_pool_prefills() {
        let factory = HeadlessFactory::new();
        let pool = SourcePool::new(Box::new(factory.clone()), 3);

        assert_eq!(pool.idle_count(), 3);
        assert_eq!(pool.size(), 3);
        assert_eq!(factory.created(), 3);
    }

    #[test]
    fn test_acquire_grows_when_empty() {
        let mut pool = SourcePool::new(Box::new(HeadlessFactory::new()), 2);

        let a = pool.acquire();
        assert_eq!(pool.idle_count(), 1);
        let b = pool.acquire();
        assert_eq!(pool.idle_count(), 0);
        let c = pool.acquire();
        assert_eq!(pool.idle_count(), 0);
        assert_eq!(pool.size(), 3);
        assert_eq!(pool.in_use(), 3);

        assert!(a.is_active() && b.is_active() && c.is_active());
    }

    #[test]
    fn test_release_deactivates_and_reuses() {
        let factory = HeadlessFactory::new();
        let mut pool = SourcePool::new(Box::new(factory.clone()), 1);

        for _ in 0..10 {
            let source = pool.acquire();
            pool.release(source);
        }

        assert_eq!(factory.created(), 1);
        assert_eq!(pool.idle_count(), 1);

        let source = pool.acquire();
        assert!(source.is_active());
        pool.release(source);
    }

    #[test]
    fn test_zero_start_size() {
        let mut pool = SourcePool::new(Box::new(HeadlessFactory::new()), 0);
        assert_eq!(pool.size(), 0);

        let source = pool.acquire();
        assert_eq!(pool.size(), 1);
        pool.release(source);
        assert_eq!(pool.idle_count(), 1);
    }
}
