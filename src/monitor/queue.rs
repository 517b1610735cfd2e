use std::sync::Arc;

use crate::events::{Event, EventId};

/// Active events ordered by descending priority, insertion order for ties.
#[derive(Debug, Default, Clone)]
pub struct ActiveEventQueue {
    events: Vec<Arc<Event>>,
}

impl ActiveEventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert behind every event of equal or higher priority.
    /// Returns the position the event landed at.
    pub fn insert(&mut self, event: Arc<Event>) -> usize {
        let position = self
            .events
            .partition_point(|existing| existing.priority() >= event.priority());
        self.events.insert(position, event);
        position
    }

    /// Remove the first entry with `id`
    pub fn remove(&mut self, id: EventId) -> Option<Arc<Event>> {
        let position = self.position(id)?;
        Some(self.events.remove(position))
    }

    pub fn clear(&mut self) -> usize {
        let count = self.events.len();
        self.events.clear();
        count
    }

    pub fn position(&self, id: EventId) -> Option<usize> {
        self.events.iter().position(|event| event.id() == id)
    }

    pub fn contains(&self, id: EventId) -> bool {
        self.position(id).is_some()
    }

    pub fn head(&self) -> Option<&Arc<Event>> {
        self.events.first()
    }

    pub fn head_id(&self) -> Option<EventId> {
        self.head().map(|event| event.id())
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn snapshot(&self) -> Vec<Arc<Event>> {
        self.events.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(title: &str, priority: u8) -> Arc<Event> {
        Arc::new(Event::custom(title).priority(priority).build())
    }

    fn titles(queue: &ActiveEventQueue) -> Vec<String> {
        queue
            .snapshot()
            .iter()
            .map(|event| event.title().to_string())
            .collect()
    }

    #[test]
    fn test_insert_orders_by_descending_priority() {
        let mut queue = ActiveEventQueue::new();
        queue.insert(event("low", 10));
        queue.insert(event("high", 90));
        queue.insert(event("mid", 50));

        assert_eq!(titles(&queue), vec!["high", "mid", "low"]);
    }

    #[test]
    fn test_equal_priorities_keep_insertion_order() {
        let mut queue = ActiveEventQueue::new();
        assert_eq!(queue.insert(event("first", 50)), 0);
        assert_eq!(queue.insert(event("second", 50)), 1);
        assert_eq!(queue.insert(event("urgent", 80)), 0);
        assert_eq!(queue.insert(event("third", 50)), 3);

        assert_eq!(titles(&queue), vec!["urgent", "first", "second", "third"]);
    }

    #[test]
    fn test_sorted_after_every_insert() {
        let mut queue = ActiveEventQueue::new();
        for priority in [40, 100, 0, 75, 75, 20, 99, 1] {
            queue.insert(event("e", priority));
            let priorities: Vec<u8> = queue.snapshot().iter().map(|e| e.priority()).collect();
            assert!(priorities.windows(2).all(|pair| pair[0] >= pair[1]));
        }
    }

    #[test]
    fn test_remove_missing_id_is_noop() {
        let mut queue = ActiveEventQueue::new();
        let kept = event("kept", 50);
        queue.insert(kept.clone());

        assert!(queue.remove(EventId::new()).is_none());
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.head_id(), Some(kept.id()));
    }

    #[test]
    fn test_remove_head_promotes_next() {
        let mut queue = ActiveEventQueue::new();
        let high = event("high", 90);
        let low = event("low", 10);
        queue.insert(low.clone());
        queue.insert(high.clone());

        assert_eq!(queue.remove(high.id()).map(|e| e.id()), Some(high.id()));
        assert_eq!(queue.head_id(), Some(low.id()));
        assert!(!queue.contains(high.id()));
    }
}
