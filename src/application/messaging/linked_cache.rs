//! Bounded map from an invoking message to the replies it produced

use std::collections::{HashMap, VecDeque};

/// FIFO-evicting cache so deleting a command also deletes its replies
#[derive(Debug)]
pub struct LinkedCache {
    capacity: usize,
    order: VecDeque<String>,
    links: HashMap<String, Vec<(String, String)>>,
}

impl LinkedCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
            links: HashMap::with_capacity(capacity),
        }
    }

    /// Remember that `reply_id` in `channel_id` answered `invoking_id`.
    pub fn link(&mut self, invoking_id: &str, channel_id: &str, reply_id: &str) {
        if self.capacity == 0 {
            return;
        }
        if !self.links.contains_key(invoking_id) {
            if self.order.len() == self.capacity {
                if let Some(oldest) = self.order.pop_front() {
                    self.links.remove(&oldest);
                }
            }
            self.order.push_back(invoking_id.to_string());
        }
        self.links
            .entry(invoking_id.to_string())
            .or_default()
            .push((channel_id.to_string(), reply_id.to_string()));
    }

    /// Forget `invoking_id`, returning its `(channel, reply)` pairs.
    pub fn take(&mut self, invoking_id: &str) -> Vec<(String, String)> {
        match self.links.remove(invoking_id) {
            Some(replies) => {
                self.order.retain(|id| id != invoking_id);
                replies
            }
            None => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_when_full() {
        let mut cache = LinkedCache::new(2);
        cache.link("a", "c", "ra");
        cache.link("b", "c", "rb");
        cache.link("c", "c", "rc");
        assert_eq!(cache.len(), 2);
        assert!(cache.take("a").is_empty());
        assert_eq!(cache.take("c"), vec![("c".to_string(), "rc".to_string())]);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn multiple_replies_share_one_slot() {
        let mut cache = LinkedCache::new(1);
        cache.link("a", "c", "r1");
        cache.link("a", "c", "r2");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.take("a").len(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn zero_capacity_keeps_nothing() {
        let mut cache = LinkedCache::new(0);
        cache.link("a", "c", "r1");
        assert!(cache.take("a").is_empty());
    }
}
