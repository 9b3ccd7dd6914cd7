//! A view is a named camera snapshot plus an owned pose, optionally linked
//! to selection sets. Exactly one view per project is the Initial View; its
//! pose is the neutral pose that underlies every other view's activation.

use crate::animation::{Animation, CameraLerp, PoseLerp};
use crate::camera::{Camera, CameraRef};
use crate::error::Result;
use crate::math::{Vec3Data, Xfo, XfoData};
use crate::pose::{Pose, PoseJson};
use crate::scene::{ItemRef, SceneGraph};
use crate::selection_set::SelectionSetId;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque stable view identifier, generated once per view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewId(String);

impl ViewId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ViewId {
    fn default() -> Self {
        Self::new()
    }
}

/// Weak link to a selection set: views reference sets, they never own them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionSetLink {
    pub id: SelectionSetId,
    pub name: String,
}

#[derive(Debug)]
pub struct View {
    id: ViewId,
    pub name: String,
    camera_xfo: Xfo,
    camera_target: Vec3,
    pub pose: Pose,
    selection_sets: Option<Vec<SelectionSetLink>>,
}

impl View {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ViewId::new(),
            name: name.into(),
            camera_xfo: Xfo::default(),
            camera_target: Vec3::ZERO,
            pose: Pose::new(),
            selection_sets: None,
        }
    }

    pub fn id(&self) -> &ViewId {
        &self.id
    }

    pub fn camera_xfo(&self) -> &Xfo {
        &self.camera_xfo
    }

    pub fn camera_target(&self) -> Vec3 {
        self.camera_target
    }

    /// Captures the live camera's transform and look-at target.
    pub fn set_camera_params(&mut self, camera: &Camera) {
        self.camera_xfo = camera.global_xfo();
        self.camera_target = camera.target_position();
    }

    pub fn set_camera_xfo(&mut self, xfo: Xfo, target: Vec3) {
        self.camera_xfo = xfo;
        self.camera_target = target;
    }

    /// Instant activation: restores the camera snapshot, derives the focal
    /// distance from camera→target, then replays the pose over the neutral
    /// fallback.
    pub fn activate(&self, camera: &CameraRef, neutral_pose: Option<&Pose>) {
        {
            let mut cam = camera.borrow_mut();
            cam.set_global_xfo(self.camera_xfo.clone());
            cam.set_target_position(self.camera_target);
            cam.set_focal_distance(self.camera_xfo.tr.distance(self.camera_target));
        }
        self.pose.activate(neutral_pose);
    }

    /// Animated activation: an orbiting camera transition and the pose
    /// interpolation, to be run in parallel by the animator.
    pub fn transition(
        &self,
        camera: &CameraRef,
        neutral_pose: Option<&Pose>,
    ) -> Vec<Box<dyn Animation>> {
        vec![
            Box::new(CameraLerp::new(camera, self.camera_xfo.clone(), self.camera_target)),
            Box::new(PoseLerp::new(self.pose.lerp_plan(neutral_pose))),
        ]
    }

    pub fn selection_set_links(&self) -> &[SelectionSetLink] {
        self.selection_sets.as_deref().unwrap_or_default()
    }

    pub fn attach_selection_set(&mut self, link: SelectionSetLink) {
        let links = self.selection_sets.get_or_insert_with(Vec::new);
        if !links.iter().any(|l| l.id == link.id) {
            links.push(link);
        }
    }

    /// Detaching the last link clears the list back to the absent state,
    /// keeping serialized views compact.
    pub fn detach_selection_set(&mut self, id: &SelectionSetId) {
        if let Some(links) = self.selection_sets.as_mut() {
            links.retain(|l| &l.id != id);
            if links.is_empty() {
                self.selection_sets = None;
            }
        }
    }

    /// Duplication support: camera fields are deep-copied, pose contents
    /// merged, selection-set links shared.
    pub fn copy_from(&mut self, other: &View) {
        self.camera_xfo = other.camera_xfo.clone();
        self.camera_target = other.camera_target;
        self.pose.copy_from(&other.pose);
        self.selection_sets = other.selection_sets.clone();
    }

    /// Items this view's pose marks invisible.
    pub fn hidden_parts(&self, scene: &SceneGraph) -> Vec<ItemRef> {
        self.pose.hidden_items(scene)
    }

    // /////////////////////////////////////////
    // Persistence

    pub fn save_json(&self) -> ViewJson {
        ViewJson {
            id: self.id.clone(),
            name: self.name.clone(),
            camera_xfo: (&self.camera_xfo).into(),
            camera_target: self.camera_target.into(),
            pose: self.pose.save_json(),
            selection_sets: self.selection_sets.clone(),
        }
    }

    pub fn load_json(&mut self, scene: &SceneGraph, json: &ViewJson) -> Result<()> {
        self.id = json.id.clone();
        self.name = json.name.clone();
        self.camera_xfo = json.camera_xfo.clone().into();
        self.camera_target = json.camera_target.clone().into();
        self.selection_sets = json.selection_sets.clone().filter(|links| !links.is_empty());
        self.pose.load_json(scene, &json.pose)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewJson {
    #[serde(default)]
    pub id: ViewId,
    pub name: String,
    pub camera_xfo: XfoData,
    pub camera_target: Vec3Data,
    pub pose: PoseJson,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_sets: Option<Vec<SelectionSetLink>>,
}
