//! Session-only list of generated images.

use crate::models::AspectRatio;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: Uuid,
    pub prompt: String,
    pub aspect_ratio: AspectRatio,
    pub image_url: String,
}

impl HistoryItem {
    pub fn new(prompt: String, aspect_ratio: AspectRatio, image_url: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            prompt,
            aspect_ratio,
            image_url,
        }
    }
}

/// Most-recent-first, in memory only.
#[derive(Debug, Default, Clone)]
pub struct ImageHistory {
    items: Vec<HistoryItem>,
}

impl ImageHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: HistoryItem) {
        self.items.insert(0, item);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    pub fn get(&self, id: Uuid) -> Option<&HistoryItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
