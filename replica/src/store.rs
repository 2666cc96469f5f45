//! Local element store: the replica's view of the registry.
//!
//! Elements are kept in the order they were first rendered. Each carries the
//! canonical [`ElementRecord`] plus two client-local derived values: the CSS
//! effect string for its filters and a stacking index. Stacking is never
//! shared; every client decides its own front-to-back order.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use events::{ElementRecord, Filters};

use crate::effect::filter_effect;

/// An element as rendered by this client.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalElement {
    /// Canonical shared state.
    pub record: ElementRecord,
    /// Derived CSS `filter` value for `record.filters`.
    pub effect: String,
    /// Client-local stacking order; higher draws on top.
    pub z: u64,
}

impl LocalElement {
    fn new(record: ElementRecord, z: u64) -> Self {
        let effect = filter_effect(&record.filters);
        Self { record, effect, z }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.record.id
    }
}

/// Ordered store of locally rendered elements.
#[derive(Debug, Default)]
pub struct ReplicaStore {
    elements: Vec<LocalElement>,
    top_z: u64,
}

impl ReplicaStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record on top of the stack. Returns `None` without touching
    /// the existing element if the id is already present.
    pub fn insert(&mut self, record: ElementRecord) -> Option<&LocalElement> {
        if self.contains(&record.id) {
            return None;
        }
        self.top_z += 1;
        self.elements.push(LocalElement::new(record, self.top_z));
        self.elements.last()
    }

    /// Remove an element, returning it if it was present.
    pub fn remove(&mut self, id: &str) -> Option<LocalElement> {
        let index = self.position(id)?;
        Some(self.elements.remove(index))
    }

    /// Drop every element and reset stacking.
    pub fn clear(&mut self) {
        self.elements.clear();
        self.top_z = 0;
    }

    /// Replace the store contents with a snapshot, in snapshot order.
    /// Repeated ids after the first are skipped.
    pub fn load_snapshot(&mut self, records: Vec<ElementRecord>) {
        self.clear();
        for record in records {
            self.insert(record);
        }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&LocalElement> {
        self.elements.iter().find(|el| el.record.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    /// Overwrite the position. `None` if the element is not rendered.
    pub fn set_position(&mut self, id: &str, x: f64, y: f64) -> Option<&LocalElement> {
        let el = self.get_mut(id)?;
        el.record.x = x;
        el.record.y = y;
        Some(&*el)
    }

    /// Overwrite the size. `None` if the element is not rendered.
    pub fn set_size(&mut self, id: &str, width: f64, height: f64) -> Option<&LocalElement> {
        let el = self.get_mut(id)?;
        el.record.width = width;
        el.record.height = height;
        Some(&*el)
    }

    /// Replace the filter map and refresh the derived effect.
    pub fn set_filters(&mut self, id: &str, filters: Filters) -> Option<&LocalElement> {
        let el = self.get_mut(id)?;
        el.effect = filter_effect(&filters);
        el.record.filters = filters;
        Some(&*el)
    }

    /// Raise an element above every other. Returns its new stacking index.
    pub fn bring_to_front(&mut self, id: &str) -> Option<u64> {
        let next = self.top_z + 1;
        let el = self.get_mut(id)?;
        el.z = next;
        self.top_z = next;
        Some(next)
    }

    /// Elements in first-rendered order.
    pub fn iter(&self) -> impl Iterator<Item = &LocalElement> {
        self.elements.iter()
    }

    /// Elements back-to-front.
    #[must_use]
    pub fn sorted_by_z(&self) -> Vec<&LocalElement> {
        let mut out: Vec<&LocalElement> = self.elements.iter().collect();
        out.sort_by_key(|el| el.z);
        out
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.elements.iter().position(|el| el.record.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut LocalElement> {
        self.elements.iter_mut().find(|el| el.record.id == id)
    }
}
