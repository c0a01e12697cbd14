//! Magic point pools
//!
//! The whole party shares one pool; every enemy owns its own.

use serde::{Deserialize, Serialize};

/// Change notification raised by a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolChange {
    Gained { available: u32 },
    Lost { available: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MpPool {
    id: String,
    capacity: u32,
    available: u32,
}

impl MpPool {
    /// Create a full pool
    pub fn new(id: impl Into<String>, capacity: u32) -> Self {
        Self {
            id: id.into(),
            capacity,
            available: capacity,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn available(&self) -> u32 {
        self.available
    }

    /// Restore up to capacity; notifies only when the value moved
    pub fn restore(&mut self, amount: u32) -> Option<PoolChange> {
        let old = self.available;
        self.available = self.available.saturating_add(amount).min(self.capacity);
        (self.available != old).then_some(PoolChange::Gained {
            available: self.available,
        })
    }

    pub fn spend(&mut self, amount: u32) -> Option<PoolChange> {
        if amount == 0 {
            return None;
        }
        self.available = self.available.saturating_sub(amount);
        Some(PoolChange::Lost {
            available: self.available,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restore_clamps_to_capacity() {
        let mut pool = MpPool::new("party", 100);
        pool.spend(30);
        assert_eq!(
            pool.restore(50),
            Some(PoolChange::Gained { available: 100 })
        );
    }

    #[test]
    fn test_restore_full_pool_is_silent() {
        let mut pool = MpPool::new("party", 100);
        assert_eq!(pool.restore(10), None);
    }

    #[test]
    fn test_spend_clamps_to_zero() {
        let mut pool = MpPool::new("enemy", 20);
        assert_eq!(pool.spend(50), Some(PoolChange::Lost { available: 0 }));
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn test_interleaved_use_loses_nothing() {
        let mut pool = MpPool::new("party", 100);
        pool.spend(40);
        pool.restore(10);
        pool.spend(25);
        pool.restore(5);
        assert_eq!(pool.available(), 50);
    }
}
