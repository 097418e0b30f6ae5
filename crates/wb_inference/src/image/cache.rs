use std::collections::{HashMap, VecDeque};

use sha2::{Digest, Sha256};
use wb_core::text::normalize_question;
use wb_core::ImageResult;

/// Prompt-keyed image cache with least-recently-used eviction.
#[derive(Debug, Clone)]
pub struct ImageCache {
    capacity: usize,
    entries: HashMap<String, ImageResult>,
    // Front is the least recently used key.
    order: VecDeque<String>,
}

impl ImageCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
    }

    /// Content address of a prompt: SHA-256 of its normalized form.
    pub fn key(prompt: &str) -> String {
        format!("{:x}", Sha256::digest(normalize_question(prompt).as_bytes()))
    }

    pub fn get(&mut self, prompt: &str) -> Option<ImageResult> {
        let key = Self::key(prompt);
        let hit = self.entries.get(&key).cloned()?;
        self.touch(&key);
        Some(hit)
    }

    pub fn insert(&mut self, image: ImageResult) {
        if self.capacity == 0 {
            return;
        }

        let key = Self::key(&image.prompt);
        if self.entries.insert(key.clone(), image).is_some() {
            self.touch(&key);
            return;
        }

        self.order.push_back(key);
        while self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.entries.remove(&evicted);
                tracing::debug!("Evicted cached image {}", &evicted[..12]);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_back(k);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wb_core::ImageFormat;

    fn image(prompt: &str) -> ImageResult {
        ImageResult {
            prompt: prompt.to_string(),
            bytes: vec![1, 2, 3],
            format: ImageFormat::Png,
            attempts: 1,
        }
    }

    #[test]
    fn test_key_ignores_case_and_spacing() {
        assert_eq!(ImageCache::key("A Red  Fox"), ImageCache::key(" a red fox "));
        assert_ne!(ImageCache::key("a red fox"), ImageCache::key("a blue fox"));
        assert_eq!(ImageCache::key("x").len(), 64);
    }

    #[test]
    fn test_key_is_lowercase_hex_sha256() {
        assert_eq!(
            ImageCache::key("   "),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            ImageCache::key("ABC"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let mut cache = ImageCache::new(2);
        cache.insert(image("one"));
        cache.insert(image("two"));
        assert!(cache.get("one").is_some());

        cache.insert(image("three"));
        assert_eq!(cache.len(), 2);
        assert!(cache.get("two").is_none());
        assert!(cache.get("one").is_some());
        assert!(cache.get("three").is_some());
    }

    #[test]
    fn test_reinsert_does_not_grow() {
        let mut cache = ImageCache::new(2);
        cache.insert(image("one"));
        cache.insert(image("ONE"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_zero_capacity_disables_cache() {
        let mut cache = ImageCache::new(0);
        cache.insert(image("one"));
        assert!(cache.is_empty());
        assert!(cache.get("one").is_none());
    }
}
