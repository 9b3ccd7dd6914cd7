//! Project persistence: the JSON aggregate tying assets, the Initial View,
//! views and selection sets together. Sections owned by external
//! collaborators (cutting planes, materials, material assignments) pass
//! through untouched so a round trip preserves them byte for byte.
//!
//! Load policy: per-entry failures (stale paths, type mismatches, one bad
//! view) are isolated and logged; only malformed JSON fails the whole load.

use crate::editor::Editor;
use crate::scene::SceneGraph;
use crate::selection_set::{SelectionSet, SelectionSetJson};
use crate::view::{View, ViewJson};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetJson {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectJson {
    pub assets: Vec<AssetJson>,
    pub initial_view: ViewJson,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub views: Option<Vec<ViewJson>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_sets: Option<Vec<SelectionSetJson>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cutting_planes: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub materials: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_assignments: Option<serde_json::Value>,
}

impl Editor {
    pub fn save_project(&self) -> ProjectJson {
        let views: Vec<ViewJson> = self.views().iter().map(View::save_json).collect();
        let selection_sets: Vec<SelectionSetJson> =
            self.selection_sets().iter().map(SelectionSet::save_json).collect();
        ProjectJson {
            assets: self
                .asset_urls()
                .iter()
                .map(|url| AssetJson { url: url.clone() })
                .collect(),
            initial_view: self.initial_view().save_json(),
            views: (!views.is_empty()).then_some(views),
            selection_sets: (!selection_sets.is_empty()).then_some(selection_sets),
            cutting_planes: None,
            materials: None,
            material_assignments: None,
        }
    }

    /// Rebuilds the project against `scene`, which the host populated by
    /// loading the referenced assets first — poses are never activated
    /// against a scene whose parameters have not resolved yet.
    pub fn load_project(&mut self, json: &ProjectJson, scene: SceneGraph) {
        self.new_project();
        self.replace_scene(scene);
        for asset in &json.assets {
            self.register_asset(asset.url.clone());
        }

        let mut initial_view = View::new("");
        if let Err(err) = initial_view.load_json(self.scene(), &json.initial_view) {
            log::warn!("initial view failed to load cleanly: {err}");
        }
        // The neutral pose restores the scene exactly as it was authored.
        initial_view.pose.activate(None);
        self.replace_initial_view(initial_view);

        for view_json in json.views.as_deref().unwrap_or_default() {
            let mut view = View::new("");
            if let Err(err) = view.load_json(self.scene(), view_json) {
                log::warn!("view '{}' failed to load cleanly: {err}", view_json.name);
            }
            self.push_loaded_view(view);
        }

        for set_json in json.selection_sets.as_deref().unwrap_or_default() {
            let mut set = SelectionSet::new("", Vec::new());
            if let Err(err) = set.load_json(self.scene(), set_json) {
                log::warn!("selection set '{}' failed to load cleanly: {err}", set_json.name);
            }
            self.push_loaded_selection_set(set);
        }
    }

    pub fn save_project_to_path(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.save_project())
            .context("Serializing project")?;
        fs::write(path, json).with_context(|| format!("Writing project {}", path.display()))?;
        Ok(())
    }

    pub fn load_project_from_path(&mut self, path: &Path, scene: SceneGraph) -> Result<()> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Reading project {}", path.display()))?;
        let json: ProjectJson = serde_json::from_str(&text)
            .with_context(|| format!("Parsing project {}", path.display()))?;
        self.load_project(&json, scene);
        Ok(())
    }
}
