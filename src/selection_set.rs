//! Named, ordered groups of scene items. Items are live references at
//! runtime and paths in persisted form; creation, rename, update and delete
//! are undoable commands in `changes`.

use crate::error::Result;
use crate::scene::{ItemRef, SceneGraph};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectionSetId(String);

impl SelectionSetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SelectionSetId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct SelectionSet {
    id: SelectionSetId,
    pub name: String,
    pub items: Vec<ItemRef>,
}

impl SelectionSet {
    pub fn new(name: impl Into<String>, items: Vec<ItemRef>) -> Self {
        Self { id: SelectionSetId::new(), name: name.into(), items }
    }

    pub fn id(&self) -> &SelectionSetId {
        &self.id
    }

    pub fn copy_from(&mut self, other: &SelectionSet) {
        self.name = other.name.clone();
        self.items = other.items.clone();
    }

    // /////////////////////////////////////////
    // Persistence

    pub fn save_json(&self) -> SelectionSetJson {
        SelectionSetJson {
            id: self.id.clone(),
            name: self.name.clone(),
            items: self.items.iter().map(|item| item.borrow().path().to_vec()).collect(),
        }
    }

    /// Stale item paths are skipped with a warning rather than failing the
    /// whole set.
    pub fn load_json(&mut self, scene: &SceneGraph, json: &SelectionSetJson) -> Result<()> {
        self.id = json.id.clone();
        self.name = json.name.clone();
        self.items.clear();
        for path in &json.items {
            match scene.resolve_item(path) {
                Some(item) => self.items.push(item),
                None => log::warn!("selection set {}: item {path:?} no longer resolves", self.name),
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionSetJson {
    #[serde(default)]
    pub id: SelectionSetId,
    pub name: String,
    pub items: Vec<Vec<String>>,
}
