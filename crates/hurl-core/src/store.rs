//! Fixed-capacity in-memory post store.
//!
//! A ring buffer in insertion order plus an id index, both behind one mutex
//! so they never disagree. When full, the oldest post leaves both.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::constants::DEFAULT_STORE_CAPACITY;
use crate::post::Post;

#[derive(Debug, Default)]
struct Inner {
    buffer: VecDeque<Arc<Post>>,
    index: HashMap<String, Arc<Post>>,
}

#[derive(Debug)]
pub struct BoundedPostStore {
    capacity: usize,
    inner: Mutex<Inner>,
}

impl BoundedPostStore {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            inner: Mutex::new(Inner {
                buffer: VecDeque::with_capacity(capacity.min(1024)),
                index: HashMap::new(),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.inner.lock().buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a post, evicting the oldest when full. Returns the evicted post.
    pub fn add(&self, post: Arc<Post>) -> Option<Arc<Post>> {
        let mut inner = self.inner.lock();
        let evicted = if inner.buffer.len() >= self.capacity {
            let old = inner.buffer.pop_front();
            if let Some(old) = &old {
                inner.index.remove(&old.id);
            }
            old
        } else {
            None
        };
        inner.index.insert(post.id.clone(), Arc::clone(&post));
        inner.buffer.push_back(post);
        evicted
    }

    pub fn get(&self, id: &str) -> Option<Arc<Post>> {
        self.inner.lock().index.get(id).cloned()
    }

    /// The last `limit` posts, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<Arc<Post>> {
        let inner = self.inner.lock();
        let skip = inner.buffer.len().saturating_sub(limit);
        inner.buffer.iter().skip(skip).cloned().collect()
    }

    /// The last `limit` posts by one persona, oldest first.
    pub fn by_persona(&self, persona_id: &str, limit: usize) -> Vec<Arc<Post>> {
        self.last_matching(limit, |p| p.persona_id == persona_id)
    }

    /// The last `limit` posts mentioning a topic, oldest first.
    pub fn by_topic(&self, topic_id: &str, limit: usize) -> Vec<Arc<Post>> {
        self.last_matching(limit, |p| p.mentions(topic_id))
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.buffer.clear();
        inner.index.clear();
    }

    fn last_matching(&self, limit: usize, pred: impl Fn(&Post) -> bool) -> Vec<Arc<Post>> {
        let inner = self.inner.lock();
        let mut out: Vec<Arc<Post>> = inner
            .buffer
            .iter()
            .rev()
            .filter(|p| pred(p))
            .take(limit)
            .cloned()
            .collect();
        out.reverse();
        out
    }
}

impl Default for BoundedPostStore {
    fn default() -> Self {
        Self::new(DEFAULT_STORE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::post::{EngagementMetrics, Lineage, Mode, StyleMetrics};

    fn post(id: &str, persona: &str, topics: &[&str]) -> Arc<Post> {
        Arc::new(Post {
            id: id.to_string(),
            text: format!("post {id}"),
            persona_id: persona.to_string(),
            created_at: "1970-01-01T00:00:00.000Z".to_string(),
            mode: Mode::Emergent,
            topics: topics.iter().map(|t| (*t).to_string()).collect(),
            language: "en".to_string(),
            style: StyleMetrics::default(),
            lineage: Lineage::default(),
            metrics: EngagementMetrics::default(),
            toxicity: 0.0,
        })
    }

    fn ids(posts: &[Arc<Post>]) -> Vec<&str> {
        posts.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_eviction_drops_oldest() {
        let store = BoundedPostStore::new(3);
        for id in ["p1", "p2", "p3"] {
            assert!(store.add(post(id, "a", &[])).is_none());
        }
        let evicted = store.add(post("p4", "a", &[])).unwrap();
        assert_eq!(evicted.id, "p1");
        assert!(store.get("p1").is_none());
        assert_eq!(ids(&store.recent(3)), vec!["p2", "p3", "p4"]);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_recent_limit_larger_than_len() {
        let store = BoundedPostStore::new(10);
        store.add(post("p1", "a", &[]));
        store.add(post("p2", "a", &[]));
        assert_eq!(ids(&store.recent(50)), vec!["p1", "p2"]);
        assert!(store.recent(0).is_empty());
    }

    #[test]
    fn test_by_persona_and_topic() {
        let store = BoundedPostStore::new(10);
        store.add(post("p1", "a", &["ai"]));
        store.add(post("p2", "b", &["crypto"]));
        store.add(post("p3", "a", &["crypto", "ai"]));
        store.add(post("p4", "a", &["memes"]));

        assert_eq!(ids(&store.by_persona("a", 2)), vec!["p3", "p4"]);
        assert_eq!(ids(&store.by_topic("crypto", 10)), vec!["p2", "p3"]);
        assert!(store.by_persona("z", 10).is_empty());
    }

    #[test]
    fn test_clear() {
        let store = BoundedPostStore::new(2);
        store.add(post("p1", "a", &[]));
        store.clear();
        assert!(store.is_empty());
        assert!(store.get("p1").is_none());
    }

    #[test]
    fn test_zero_capacity_raised() {
        let store = BoundedPostStore::new(0);
        store.add(post("p1", "a", &[]));
        assert_eq!(store.capacity(), 1);
        assert_eq!(store.len(), 1);
    }
}
