//! A pose is a named snapshot: an insertion-ordered map from parameter path
//! keys to captured values. The Initial View's pose (the "neutral pose")
//! layers underneath every other pose so returning to the untouched scene is
//! lossless.

use crate::animation::LerpTrack;
use crate::error::{EngineError, Result};
use crate::math::XfoData;
use crate::scene::{ItemRef, ParamPath, ParamRef, ParamValue, SceneGraph, VISIBLE_PARAM};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

#[derive(Debug, Default)]
pub struct Pose {
    /// Captured value per path key, insertion ordered.
    values: IndexMap<String, ParamValue>,
    /// Live handle per path key. Not persisted; re-resolved from the path on
    /// load. Always has the same key set as `values`.
    params: IndexMap<String, ParamRef>,
}

impl Pose {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn value(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    /// Captures `value` for `param`. With `only_new` the first write wins:
    /// an existing entry is left untouched, protecting the originally
    /// authored value.
    pub fn store_param_value(&mut self, param: &ParamRef, value: ParamValue, only_new: bool) {
        let key = param.borrow().key();
        if only_new && self.values.contains_key(&key) {
            return;
        }
        self.values.insert(key.clone(), value);
        self.params.insert(key, Rc::clone(param));
    }

    /// Snapshots the current global transform of each item, overwriting any
    /// previous capture.
    pub fn store_tree_items_pose(&mut self, items: &[ItemRef]) {
        for item in items {
            let param = item.borrow().global_xfo_param();
            let value = param.borrow().value();
            self.store_param_value(&param, value, false);
        }
    }

    /// Lazily captures "how it looked before anyone touched it": stores each
    /// item's current transform only if no value exists for it yet.
    pub fn store_neutral_pose(&mut self, items: &[ItemRef]) {
        for item in items {
            let param = item.borrow().global_xfo_param();
            let value = param.borrow().value();
            self.store_param_value(&param, value, true);
        }
    }

    /// Merges all entries of `other` into `self`, overwriting on conflict.
    pub fn copy_from(&mut self, other: &Pose) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
        for (key, param) in &other.params {
            self.params.insert(key.clone(), Rc::clone(param));
        }
    }

    /// Writes the snapshot out to the live parameters. Fallback-only keys
    /// are restored first, then this pose's own values, so a view's edits
    /// always win over the neutral default for the same key.
    pub fn activate(&self, fallback: Option<&Pose>) {
        if let Some(fallback) = fallback {
            for (key, value) in &fallback.values {
                if self.values.contains_key(key) {
                    continue;
                }
                if let Some(param) = fallback.params.get(key) {
                    param.borrow_mut().set_value(value.clone());
                }
            }
        }
        for (key, value) in &self.values {
            if let Some(param) = self.params.get(key) {
                param.borrow_mut().set_value(value.clone());
            }
        }
    }

    /// Builds interpolation tracks for the union of this pose and the
    /// fallback's exclusive keys. Start values are read from the live
    /// parameters at call time; end values are the stored snapshots.
    pub fn lerp_plan(&self, fallback: Option<&Pose>) -> Vec<LerpTrack> {
        let mut tracks = Vec::with_capacity(self.values.len());
        if let Some(fallback) = fallback {
            for (key, value) in &fallback.values {
                if self.values.contains_key(key) {
                    continue;
                }
                if let Some(param) = fallback.params.get(key) {
                    let start = param.borrow().value();
                    tracks.push(LerpTrack::new(Rc::clone(param), start, value.clone()));
                }
            }
        }
        for (key, value) in &self.values {
            if let Some(param) = self.params.get(key) {
                let start = param.borrow().value();
                tracks.push(LerpTrack::new(Rc::clone(param), start, value.clone()));
            }
        }
        tracks
    }

    /// Items this pose marks invisible. Recomputed on demand: pose entries
    /// arrive through several code paths, so nothing is cached.
    pub fn hidden_items(&self, scene: &SceneGraph) -> Vec<ItemRef> {
        let mut hidden = Vec::new();
        for (key, value) in &self.values {
            if !matches!(value, ParamValue::Bool(false)) {
                continue;
            }
            let Some(param) = self.params.get(key) else {
                continue;
            };
            let param = param.borrow();
            if param.path().param_name() != Some(VISIBLE_PARAM) {
                continue;
            }
            if let Some(item) = scene.resolve_item(param.path().owner_path()) {
                hidden.push(item);
            }
        }
        hidden
    }

    // /////////////////////////////////////////
    // Persistence

    pub fn save_json(&self) -> PoseJson {
        let mut json = PoseJson::default();
        for (key, value) in &self.values {
            json.values.insert(key.clone(), value.into());
        }
        json
    }

    /// Re-binds persisted entries against `scene`. Stale paths and entries
    /// whose stored type no longer matches the live parameter are skipped
    /// with a warning; a single bad entry never aborts the load.
    pub fn load_json(&mut self, scene: &SceneGraph, json: &PoseJson) -> Result<()> {
        for (key, value_json) in &json.values {
            let path = match ParamPath::parse_key(key) {
                Ok(path) => path,
                Err(err) => {
                    log::warn!("pose entry has malformed key {key}: {err}");
                    continue;
                }
            };
            let Some(param) = scene.resolve_param(&path) else {
                log::warn!("pose entry skipped: {}", EngineError::StaleReference(key.clone()));
                continue;
            };
            let value = ParamValue::from(value_json.clone());
            let expected = param.borrow().value().kind();
            if value.kind() != expected {
                let err = EngineError::TypeMismatch {
                    key: key.clone(),
                    expected: expected.name(),
                    found: value.kind().name(),
                };
                log::warn!("pose entry skipped: {err}");
                continue;
            }
            self.values.insert(key.clone(), value);
            self.params.insert(key.clone(), param);
        }
        Ok(())
    }
}

// /////////////////////////////////////////
// Wire format

/// One captured value on the wire: a transform object, or a bare JSON
/// boolean/number/string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValueJson {
    Bool(bool),
    Number(f64),
    Str(String),
    Xfo(XfoData),
}

impl From<&ParamValue> for ParamValueJson {
    fn from(value: &ParamValue) -> Self {
        match value {
            ParamValue::Xfo(xfo) => ParamValueJson::Xfo(xfo.into()),
            ParamValue::Bool(b) => ParamValueJson::Bool(*b),
            ParamValue::Number(n) => ParamValueJson::Number(*n),
            ParamValue::Str(s) => ParamValueJson::Str(s.clone()),
        }
    }
}

impl From<ParamValueJson> for ParamValue {
    fn from(json: ParamValueJson) -> Self {
        match json {
            ParamValueJson::Xfo(data) => ParamValue::Xfo(data.into()),
            ParamValueJson::Bool(b) => ParamValue::Bool(b),
            ParamValueJson::Number(n) => ParamValue::Number(n),
            ParamValueJson::Str(s) => ParamValue::Str(s),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoseJson {
    pub values: IndexMap<String, ParamValueJson>,
}
