//! Element registry: the authoritative list of stage elements.
//!
//! DESIGN
//! ======
//! One ordered `Vec` of records. Insertion order is kept so snapshots replay
//! elements in the order they were spawned. The registry is owned by
//! [`crate::state::Stage`] and only the router mutates it, so every method is
//! synchronous and takes `&mut self`.
//!
//! Duplicate spawns and references to unknown ids are not errors: they come
//! back as [`Insert::Duplicate`] or `false` so the router can decide not to
//! broadcast.

use events::{ElementRecord, Filters};

/// Result of [`Registry::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insert {
    Inserted,
    /// A record with this id already exists. The registry is unchanged.
    Duplicate,
}

#[derive(Debug, Default)]
pub struct Registry {
    records: Vec<ElementRecord>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `record` unless its id is taken.
    pub fn insert(&mut self, record: ElementRecord) -> Insert {
        if self.get(&record.id).is_some() {
            return Insert::Duplicate;
        }
        self.records.push(record);
        Insert::Inserted
    }

    /// Overwrite the position. Returns `false` if `id` is unknown.
    pub fn apply_move(&mut self, id: &str, x: f64, y: f64) -> bool {
        self.update(id, |record| {
            record.x = x;
            record.y = y;
        })
    }

    /// Overwrite the size. Returns `false` if `id` is unknown.
    pub fn apply_resize(&mut self, id: &str, width: f64, height: f64) -> bool {
        self.update(id, |record| {
            record.width = width;
            record.height = height;
        })
    }

    /// Replace the whole filter map. Keys missing from `filters` are removed.
    pub fn apply_filters(&mut self, id: &str, filters: Filters) -> bool {
        self.update(id, |record| record.filters = filters)
    }

    pub fn remove(&mut self, id: &str) -> Option<ElementRecord> {
        let index = self.records.iter().position(|r| r.id == id)?;
        Some(self.records.remove(index))
    }

    /// Every current record, in insertion order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ElementRecord> {
        self.records.clone()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ElementRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn update(&mut self, id: &str, apply: impl FnOnce(&mut ElementRecord)) -> bool {
        match self.records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                apply(record);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
