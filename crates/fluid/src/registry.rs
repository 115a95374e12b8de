//! Ordered blob storage.

use crate::blob::{Blob, BlobPatch, CenterFn, CenterSpec};
use common::geometry::{Point, Size};
use common::units::{Axis, Resolved};
use indexmap::IndexMap;

/// Pre-parsed geometry so frames never re-parse unit strings.
#[derive(Clone)]
enum CompiledCenter {
    Symbolic { x: Resolved, y: Resolved },
    Computed(CenterFn),
}

/// A stored blob together with its derived render cache.
#[derive(Clone)]
pub struct BlobEntry {
    blob: Blob,
    diameter: Resolved,
    center: CompiledCenter,
}

impl BlobEntry {
    fn new(blob: Blob) -> Self {
        let diameter = blob.diameter.compile();
        let center = compile_center(&blob.center);
        Self { blob, diameter, center }
    }

    fn recompile(&mut self) {
        self.diameter = self.blob.diameter.compile();
        self.center = compile_center(&self.blob.center);
    }

    pub fn blob(&self) -> &Blob {
        &self.blob
    }

    /// Logical center for the given viewport, before motion.
    pub fn center(&self, dims: Size) -> Point {
        match &self.center {
            CompiledCenter::Symbolic { x, y } => Point::new(x.to_px(dims, Axis::X), y.to_px(dims, Axis::Y)),
            CompiledCenter::Computed(f) => f(dims),
        }
    }

    /// Logical radius for the given viewport, before breathing.
    pub fn base_radius(&self, dims: Size) -> f64 {
        self.diameter.to_px(dims, Axis::Max) / 2.0
    }
}

fn compile_center(center: &CenterSpec) -> CompiledCenter {
    match center {
        CenterSpec::Symbolic { x, y } => CompiledCenter::Symbolic {
            x: x.compile(),
            y: y.compile(),
        },
        CenterSpec::Computed(f) => CompiledCenter::Computed(f.clone()),
    }
}

/// What an [`BlobRegistry::update`] call did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// An existing blob was patched.
    Updated,
    /// The id was unknown and the patch carried one, so a blob was created.
    Inserted,
    /// Unknown id and no embedded id.
    Ignored,
}

/// Blobs keyed by id, iterated in insertion order.
#[derive(Clone, Default)]
pub struct BlobRegistry {
    entries: IndexMap<String, BlobEntry>,
}

impl BlobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a blob, replacing any blob with the same id in place.
    /// Returns `true` if an existing blob was replaced.
    pub fn add(&mut self, blob: Blob) -> bool {
        let id = blob.id.clone();
        self.entries.insert(id, BlobEntry::new(blob)).is_some()
    }

    /// Merge a partial record onto the blob stored under `id`.
    ///
    /// An unknown `id` is only an insert when the patch names its own id;
    /// the new blob starts from defaults and lives under the patch's id.
    pub fn update(&mut self, id: &str, patch: &BlobPatch) -> UpdateOutcome {
        if let Some(entry) = self.entries.get_mut(id) {
            patch.apply_to(&mut entry.blob);
            entry.recompile();
            return UpdateOutcome::Updated;
        }

        match &patch.id {
            Some(new_id) => {
                let mut blob = Blob::new(new_id.clone());
                patch.apply_to(&mut blob);
                self.add(blob);
                UpdateOutcome::Inserted
            }
            None => UpdateOutcome::Ignored,
        }
    }

    /// Remove a blob, keeping the order of the rest.
    pub fn remove(&mut self, id: &str) -> Option<Blob> {
        self.entries.shift_remove(id).map(|entry| entry.blob)
    }

    pub fn get(&self, id: &str) -> Option<&Blob> {
        self.entries.get(id).map(|entry| &entry.blob)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Blobs in paint order.
    pub fn iter(&self) -> impl Iterator<Item = &Blob> {
        self.entries.values().map(|entry| &entry.blob)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entries with their render caches, in paint order.
    pub fn entries(&self) -> impl Iterator<Item = &BlobEntry> {
        self.entries.values()
    }
}
