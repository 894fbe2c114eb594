//! Named canvas collection with an active canvas and favorite slots.

use crate::canvas::Canvas;
use crate::error::{ValidationError, ValidationResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Number of favorite slots.
pub const FAVORITE_SLOTS: usize = 4;

/// All canvases of a process, plus the active one and favorites.
///
/// This is also the persisted state: loading and saving operate on the
/// whole collection. There is always at least one canvas and the active id
/// always resolves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasCollection {
    canvases: Vec<Canvas>,
    active: String,
    #[serde(default)]
    favorites: [Option<String>; FAVORITE_SLOTS],
}

impl Default for CanvasCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl CanvasCollection {
    /// Create a collection with a single empty canvas.
    pub fn new() -> Self {
        let first = Canvas::new("Canvas 1");
        Self {
            active: first.id.clone(),
            canvases: vec![first],
            favorites: Default::default(),
        }
    }

    /// Restore invariants after deserialization: unique canvas ids (later
    /// duplicates are dropped), at least one canvas, a resolvable active id,
    /// favorites that reference live canvases, and no orphaned prompt nodes.
    pub fn repair(&mut self) {
        let mut seen = HashSet::new();
        self.canvases.retain(|canvas| {
            let unique = seen.insert(canvas.id.clone());
            if !unique {
                log::warn!("Dropping canvas with duplicate id {}", canvas.id);
            }
            unique
        });
        if self.canvases.is_empty() {
            self.canvases.push(Canvas::new("Canvas 1"));
        }
        if self.get(&self.active).is_none() {
            self.active = self.canvases[0].id.clone();
        }
        for slot in self.favorites.iter_mut() {
            if slot.as_ref().is_some_and(|id| !self.canvases.iter().any(|c| &c.id == id)) {
                *slot = None;
            }
        }
        for canvas in &mut self.canvases {
            canvas.prune_orphans();
        }
    }

    /// Canvases in creation order.
    pub fn canvases(&self) -> &[Canvas] {
        &self.canvases
    }

    pub fn len(&self) -> usize {
        self.canvases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canvases.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Canvas> {
        self.canvases.iter().find(|c| c.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Canvas> {
        self.canvases.iter_mut().find(|c| c.id == id)
    }

    pub fn active_id(&self) -> &str {
        &self.active
    }

    /// The active canvas.
    pub fn active(&self) -> &Canvas {
        let idx = self.active_index();
        &self.canvases[idx]
    }

    /// The active canvas, mutably.
    pub fn active_mut(&mut self) -> &mut Canvas {
        let idx = self.active_index();
        &mut self.canvases[idx]
    }

    fn active_index(&self) -> usize {
        // The active id is kept resolvable by every mutation; fall back to
        // the first canvas rather than panicking on a hand-edited save file.
        self.canvases
            .iter()
            .position(|c| c.id == self.active)
            .unwrap_or(0)
    }

    /// Create a canvas and make it active. Blank names get "Canvas N".
    pub fn create(&mut self, name: Option<&str>) -> String {
        let name = match name.map(str::trim) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => self.next_default_name(),
        };
        let canvas = Canvas::new(name);
        let id = canvas.id.clone();
        log::info!("Created canvas '{}' ({})", canvas.name, id);
        self.canvases.push(canvas);
        self.active = id.clone();
        id
    }

    fn next_default_name(&self) -> String {
        let mut n = self.canvases.len() + 1;
        loop {
            let candidate = format!("Canvas {n}");
            if !self.canvases.iter().any(|c| c.name == candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Make a canvas active.
    pub fn select(&mut self, id: &str) -> ValidationResult<()> {
        if self.get(id).is_none() {
            return Err(ValidationError::UnknownCanvas(id.to_string()));
        }
        self.active = id.to_string();
        Ok(())
    }

    /// Rename a canvas.
    pub fn rename(&mut self, id: &str, name: &str) -> ValidationResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyCanvasName);
        }
        let canvas = self
            .get_mut(id)
            .ok_or_else(|| ValidationError::UnknownCanvas(id.to_string()))?;
        canvas.name = name.to_string();
        Ok(())
    }

    /// Delete a canvas. Favorites pointing at it are cleared. Deleting the
    /// active canvas activates a neighbour, or a fresh canvas if it was the
    /// last one.
    pub fn delete(&mut self, id: &str) -> ValidationResult<Canvas> {
        let idx = self
            .canvases
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| ValidationError::UnknownCanvas(id.to_string()))?;
        let removed = self.canvases.remove(idx);

        for slot in self.favorites.iter_mut() {
            if slot.as_deref() == Some(id) {
                *slot = None;
            }
        }

        if self.canvases.is_empty() {
            self.canvases.push(Canvas::new("Canvas 1"));
        }
        if self.active == id {
            let next = idx.min(self.canvases.len() - 1);
            self.active = self.canvases[next].id.clone();
        }
        log::info!("Deleted canvas '{}' ({})", removed.name, removed.id);
        Ok(removed)
    }

    /// Favorite slots, in order.
    pub fn favorites(&self) -> &[Option<String>; FAVORITE_SLOTS] {
        &self.favorites
    }

    /// Put a canvas into a favorite slot, or clear the slot with `None`.
    pub fn set_favorite(&mut self, slot: usize, id: Option<&str>) -> ValidationResult<()> {
        if slot >= FAVORITE_SLOTS {
            return Err(ValidationError::FavoriteSlot(slot));
        }
        if let Some(id) = id {
            if self.get(id).is_none() {
                return Err(ValidationError::UnknownCanvas(id.to_string()));
            }
            // A canvas occupies at most one slot.
            for other in self.favorites.iter_mut() {
                if other.as_deref() == Some(id) {
                    *other = None;
                }
            }
        }
        self.favorites[slot] = id.map(str::to_string);
        Ok(())
    }

    /// Toggle a canvas in the favorites: remove it if present, otherwise
    /// place it in the first free slot. Returns whether it is now a
    /// favorite; `Ok(false)` with no change when all slots are taken.
    pub fn toggle_favorite(&mut self, id: &str) -> ValidationResult<bool> {
        if self.get(id).is_none() {
            return Err(ValidationError::UnknownCanvas(id.to_string()));
        }
        if let Some(slot) = self.favorites.iter().position(|s| s.as_deref() == Some(id)) {
            self.favorites[slot] = None;
            return Ok(false);
        }
        match self.favorites.iter().position(Option::is_none) {
            Some(slot) => {
                self.favorites[slot] = Some(id.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Case-insensitive substring search over canvas names.
    pub fn search(&self, query: &str) -> Vec<&Canvas> {
        let query = query.trim().to_lowercase();
        self.canvases
            .iter()
            .filter(|c| query.is_empty() || c.name.to_lowercase().contains(&query))
            .collect()
    }

    /// Serialize the collection to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a collection from JSON and repair its invariants.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut collection: Self = serde_json::from_str(json)?;
        collection.repair();
        Ok(collection)
    }
}
