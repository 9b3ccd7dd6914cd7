//! The application aggregate: owns the scene surface, the camera, the views
//! and selection sets, the command log and the animator, and routes every
//! logged parameter edit into the correct pose.
//!
//! Capture routing implements a two-layer override system with two flat
//! maps: the first time any view other than Initial touches a parameter,
//! its pre-edit value lands in the neutral pose (first write wins), while
//! the active view's pose always takes the post-edit value. Undoing back to
//! the pristine scene therefore works no matter how many views were visited
//! in between.

use crate::animation::{Animator, AnimationHandle};
use crate::camera::{Camera, CameraRef};
use crate::changes::{
    AttachSelectionSetChange, Change, ChangeContext, ChangeSummary, CreateSelectionSetChange,
    CreateViewChange, DeleteSelectionSetChange, DeleteViewChange, ParameterValueChange,
    RenameSelectionSetChange, RenameViewChange, SelectionXfoChange, SetSelectionVisibilityChange,
    UpdateSelectionSetChange, UpdateViewCameraChange,
};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::math::Xfo;
use crate::pose::Pose;
use crate::scene::{ItemRef, ParamRef, ParamValue, SceneGraph};
use crate::selection_set::SelectionSet;
use crate::undo::{ChangeEventKind, ChangeNotification, UndoRedoManager};
use crate::view::{SelectionSetLink, View, ViewId};
use glam::Vec3;
use std::rc::Rc;

/// Which view currently receives parameter-edit routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveView {
    /// No view active; edits go straight to the neutral pose.
    None,
    Initial,
    View(ViewId),
}

pub struct Editor {
    scene: SceneGraph,
    camera: CameraRef,
    config: EngineConfig,
    undo_redo: UndoRedoManager,
    animator: Animator,
    initial_view: View,
    views: Vec<View>,
    selection_sets: Vec<SelectionSet>,
    selection: Vec<ItemRef>,
    active_view: ActiveView,
    transition_handles: Vec<AnimationHandle>,
    asset_urls: Vec<String>,
}

impl Editor {
    pub fn new(config: EngineConfig) -> Self {
        let camera = Camera::new_ref();
        camera.borrow_mut().set_position_and_target(Vec3::new(2.0, 2.0, 2.0), Vec3::ZERO);
        let mut initial_view = View::new("Initial View");
        initial_view.set_camera_params(&camera.borrow());
        let undo_limit = config.undo_limit;
        let mut undo_redo = UndoRedoManager::new();
        undo_redo.set_undo_limit(undo_limit);
        Self {
            scene: SceneGraph::new(),
            camera,
            config,
            undo_redo,
            animator: Animator::new(),
            initial_view,
            views: Vec::new(),
            selection_sets: Vec::new(),
            selection: Vec::new(),
            active_view: ActiveView::None,
            transition_handles: Vec::new(),
            asset_urls: Vec::new(),
        }
    }

    // /////////////////////////////////////////
    // Accessors

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    pub fn camera(&self) -> CameraRef {
        Rc::clone(&self.camera)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn views(&self) -> &[View] {
        &self.views
    }

    pub fn view(&self, index: usize) -> Option<&View> {
        self.views.get(index)
    }

    pub fn initial_view(&self) -> &View {
        &self.initial_view
    }

    /// The neutral pose: the Initial View's pose, holding the original value
    /// of every parameter ever touched.
    pub fn neutral_pose(&self) -> &Pose {
        &self.initial_view.pose
    }

    pub fn selection_sets(&self) -> &[SelectionSet] {
        &self.selection_sets
    }

    pub fn active_view(&self) -> &ActiveView {
        &self.active_view
    }

    pub fn active_view_name(&self) -> Option<&str> {
        match &self.active_view {
            ActiveView::None => None,
            ActiveView::Initial => Some(self.initial_view.name.as_str()),
            ActiveView::View(id) => {
                self.views.iter().find(|v| v.id() == id).map(|v| v.name.as_str())
            }
        }
    }

    pub fn asset_urls(&self) -> &[String] {
        &self.asset_urls
    }

    /// Records the URL of an asset the host has loaded into the scene, so
    /// project saves can reference it.
    pub fn register_asset(&mut self, url: impl Into<String>) {
        self.asset_urls.push(url.into());
    }

    // /////////////////////////////////////////
    // Project lifecycle

    /// Clears everything back to an empty project.
    pub fn new_project(&mut self) {
        self.camera.borrow_mut().set_position_and_target(Vec3::new(2.0, 2.0, 2.0), Vec3::ZERO);
        self.scene.clear();
        self.views.clear();
        self.selection_sets.clear();
        self.selection.clear();
        self.asset_urls.clear();
        self.active_view = ActiveView::None;
        self.cancel_transitions();
        self.undo_redo.flush();
        let mut initial_view = View::new("Initial View");
        initial_view.set_camera_params(&self.camera.borrow());
        self.initial_view = initial_view;
    }

    /// Re-captures the Initial View's camera from the live camera, typically
    /// once assets finished loading and the host framed the model.
    pub fn capture_initial_view(&mut self) {
        self.initial_view.set_camera_params(&self.camera.borrow());
    }

    pub(crate) fn replace_scene(&mut self, scene: SceneGraph) {
        self.scene = scene;
    }

    pub(crate) fn replace_initial_view(&mut self, view: View) {
        self.initial_view = view;
    }

    pub(crate) fn push_loaded_view(&mut self, view: View) {
        self.views.push(view);
    }

    pub(crate) fn push_loaded_selection_set(&mut self, set: SelectionSet) {
        self.selection_sets.push(set);
    }

    // /////////////////////////////////////////
    // Selection

    pub fn selection(&self) -> &[ItemRef] {
        &self.selection
    }

    pub fn set_selection(&mut self, items: Vec<ItemRef>) {
        self.selection = items;
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    // /////////////////////////////////////////
    // Views

    /// Creates a view capturing the current camera, records the change and
    /// activates the new view.
    pub fn create_view(&mut self, name: Option<&str>) -> usize {
        let view_name = match name {
            Some(name) => name.to_string(),
            None => format!("View{}", self.views.len()),
        };
        let mut view = View::new(view_name);
        view.set_camera_params(&self.camera.borrow());
        self.views.push(view);
        let index = self.views.len() - 1;
        self.undo_redo.add_change(Change::CreateView(CreateViewChange::new(index)));
        self.pump();
        // A fresh view starts from the neutral state: activation replays the
        // neutral pose underneath its (empty) own pose.
        let _ = self.activate_view_instant(index);
        index
    }

    /// Duplicates a view: pose contents and selection-set links are copied,
    /// the camera is captured fresh from the live camera.
    pub fn duplicate_view(&mut self, from_index: usize) -> Result<usize> {
        let source = self
            .views
            .get(from_index)
            .ok_or(EngineError::InvalidIndex { index: from_index, len: self.views.len() })?;
        let name = format!("{}-duplicated", source.name);
        let mut view = View::new(name);
        view.copy_from(source);
        view.set_camera_params(&self.camera.borrow());
        self.views.push(view);
        let index = self.views.len() - 1;
        self.undo_redo.add_change(Change::CreateView(CreateViewChange::new(index)));
        self.pump();
        let _ = self.activate_view_instant(index);
        Ok(index)
    }

    pub fn delete_view(&mut self, index: usize) -> Result<()> {
        if index >= self.views.len() {
            return Err(EngineError::InvalidIndex { index, len: self.views.len() });
        }
        let view = self.views.remove(index);
        if self.active_view == ActiveView::View(view.id().clone()) {
            self.active_view = ActiveView::None;
        }
        self.undo_redo.add_change(Change::DeleteView(DeleteViewChange::new(index, view)));
        self.pump();
        Ok(())
    }

    pub fn rename_view(&mut self, index: usize, new_name: &str) -> Result<()> {
        let len = self.views.len();
        let view = self.views.get_mut(index).ok_or(EngineError::InvalidIndex { index, len })?;
        let change = RenameViewChange::new(
            view.id().clone(),
            view.name.clone(),
            new_name.to_string(),
        );
        view.name = new_name.to_string();
        self.undo_redo.add_change(Change::RenameView(change));
        self.pump();
        Ok(())
    }

    /// Animated activation: cancels any in-flight transition, then runs the
    /// camera orbit and the pose interpolation in parallel.
    pub fn activate_view(&mut self, index: usize) -> Result<()> {
        if index >= self.views.len() {
            return Err(EngineError::InvalidIndex { index, len: self.views.len() });
        }
        self.cancel_transitions();
        self.selection.clear();
        let animations =
            self.views[index].transition(&self.camera, Some(&self.initial_view.pose));
        for animation in animations {
            let handle =
                self.animator.spawn(animation, self.config.lerp_steps, self.config.lerp_interval);
            self.transition_handles.push(handle);
        }
        self.active_view = ActiveView::View(self.views[index].id().clone());
        Ok(())
    }

    /// Instant activation, no interpolation.
    pub fn activate_view_instant(&mut self, index: usize) -> Result<()> {
        if index >= self.views.len() {
            return Err(EngineError::InvalidIndex { index, len: self.views.len() });
        }
        self.cancel_transitions();
        self.selection.clear();
        self.views[index].activate(&self.camera, Some(&self.initial_view.pose));
        self.active_view = ActiveView::View(self.views[index].id().clone());
        Ok(())
    }

    /// Animated return to the untouched scene: every neutral-pose entry
    /// interpolates back to its original value.
    pub fn activate_initial_view(&mut self) {
        self.cancel_transitions();
        self.selection.clear();
        let animations = self.initial_view.transition(&self.camera, None);
        for animation in animations {
            let handle =
                self.animator.spawn(animation, self.config.lerp_steps, self.config.lerp_interval);
            self.transition_handles.push(handle);
        }
        self.active_view = ActiveView::Initial;
    }

    pub fn activate_initial_view_instant(&mut self) {
        self.cancel_transitions();
        self.selection.clear();
        self.initial_view.activate(&self.camera, None);
        self.active_view = ActiveView::Initial;
    }

    pub fn deactivate_view(&mut self) {
        self.selection.clear();
        self.active_view = ActiveView::None;
    }

    /// Stores the live camera into the active view as an undoable change.
    pub fn save_view_camera(&mut self) -> bool {
        let camera_xfo = self.camera.borrow().global_xfo();
        let camera_target = self.camera.borrow().target_position();
        let view = match &self.active_view {
            ActiveView::None => return false,
            ActiveView::Initial => &mut self.initial_view,
            ActiveView::View(id) => {
                let Some(view) = self.views.iter_mut().find(|v| *v.id() == *id) else {
                    return false;
                };
                view
            }
        };
        let change = UpdateViewCameraChange::new(
            view.id().clone(),
            view.camera_xfo().clone(),
            view.camera_target(),
            camera_xfo.clone(),
            camera_target,
        );
        view.set_camera_xfo(camera_xfo, camera_target);
        self.undo_redo.add_change(Change::UpdateViewCamera(change));
        self.pump();
        true
    }

    /// Items the active view's pose (or the neutral pose) marks invisible.
    pub fn hidden_parts(&self) -> Vec<ItemRef> {
        match &self.active_view {
            ActiveView::View(id) => self
                .views
                .iter()
                .find(|v| v.id() == id)
                .map(|v| v.hidden_parts(&self.scene))
                .unwrap_or_default(),
            _ => self.initial_view.hidden_parts(&self.scene),
        }
    }

    // /////////////////////////////////////////
    // Parameter editing (drag streams and single edits)

    /// Starts a manipulator drag over the current selection. Returns false
    /// when nothing is selected.
    pub fn begin_selection_drag(&mut self) -> bool {
        if self.selection.is_empty() {
            return false;
        }
        let change = SelectionXfoChange::new(self.selection.clone());
        self.undo_redo.add_change(Change::SelectionXfo(change));
        self.pump();
        true
    }

    /// Streams in-flight drag transforms, one per selected item.
    pub fn update_selection_drag(&mut self, xfos: &[Xfo]) {
        if let Some(Change::SelectionXfo(change)) = self.undo_redo.current_change_mut() {
            change.update(xfos);
            self.undo_redo.notify_updated();
            self.pump();
        }
    }

    /// Applies a single parameter edit as an undoable change.
    pub fn set_parameter_value(&mut self, param: &ParamRef, value: ParamValue) {
        let change = ParameterValueChange::new(Rc::clone(param), value);
        self.undo_redo.add_change(Change::ParameterValue(change));
        self.pump();
    }

    /// Streams further values into the current parameter edit (slider drag).
    pub fn update_parameter_value(&mut self, value: ParamValue) {
        if let Some(Change::ParameterValue(change)) = self.undo_redo.current_change_mut() {
            change.update(value);
            self.undo_redo.notify_updated();
            self.pump();
        }
    }

    /// Hides or shows the current selection through the pose layers.
    pub fn set_selection_visibility(&mut self, visible: bool) -> bool {
        if self.selection.is_empty() {
            return false;
        }
        // From the Initial View the edit is authoritative and broadcast into
        // every view's pose. With no active view (or a stale one) only the
        // neutral pose is written.
        let (view, propagate) = match &self.active_view {
            ActiveView::View(id) if self.views.iter().any(|v| v.id() == id) => {
                (Some(id.clone()), false)
            }
            ActiveView::Initial => (None, true),
            _ => (None, false),
        };
        let change =
            SetSelectionVisibilityChange::new(view, self.selection.clone(), visible, propagate);
        let mut ctx = ChangeContext {
            views: &mut self.views,
            initial_view: &mut self.initial_view,
            selection_sets: &mut self.selection_sets,
        };
        change.apply(&mut ctx, visible);
        self.undo_redo.add_change(Change::SetSelectionVisibility(change));
        self.pump();
        true
    }

    pub fn hide_selection(&mut self) -> bool {
        self.set_selection_visibility(false)
    }

    /// Shows everything the active pose currently hides.
    pub fn unhide_all(&mut self) -> bool {
        let hidden = self.hidden_parts();
        if hidden.is_empty() {
            return false;
        }
        let restore = std::mem::replace(&mut self.selection, hidden);
        let changed = self.set_selection_visibility(true);
        self.selection = restore;
        changed
    }

    // /////////////////////////////////////////
    // Selection sets

    /// Creates a selection set from the current selection. Returns `None`
    /// when nothing is selected.
    pub fn create_selection_set(&mut self, name: Option<&str>) -> Option<usize> {
        if self.selection.is_empty() {
            return None;
        }
        let set_name = match name {
            Some(name) => name.to_string(),
            None => format!("SelectionSet-{}", self.selection_sets.len()),
        };
        let set = SelectionSet::new(set_name, self.selection.clone());
        self.selection_sets.push(set);
        let index = self.selection_sets.len() - 1;
        self.undo_redo
            .add_change(Change::CreateSelectionSet(CreateSelectionSetChange::new(index)));
        self.pump();
        Some(index)
    }

    pub fn delete_selection_set(&mut self, index: usize) -> Result<()> {
        if index >= self.selection_sets.len() {
            return Err(EngineError::InvalidIndex { index, len: self.selection_sets.len() });
        }
        self.selection.clear();
        let set = self.selection_sets.remove(index);
        self.undo_redo
            .add_change(Change::DeleteSelectionSet(DeleteSelectionSetChange::new(index, set)));
        self.pump();
        Ok(())
    }

    pub fn rename_selection_set(&mut self, index: usize, new_name: &str) -> Result<()> {
        let len = self.selection_sets.len();
        let set =
            self.selection_sets.get_mut(index).ok_or(EngineError::InvalidIndex { index, len })?;
        let change = RenameSelectionSetChange::new(
            set.id().clone(),
            set.name.clone(),
            new_name.to_string(),
        );
        set.name = new_name.to_string();
        self.undo_redo.add_change(Change::RenameSelectionSet(change));
        self.pump();
        Ok(())
    }

    /// Replaces a set's contents with the current selection.
    pub fn update_selection_set(&mut self, index: usize) -> Result<()> {
        let selection = self.selection.clone();
        let len = self.selection_sets.len();
        let set =
            self.selection_sets.get_mut(index).ok_or(EngineError::InvalidIndex { index, len })?;
        let change = UpdateSelectionSetChange::new(
            set.id().clone(),
            set.items.clone(),
            selection.clone(),
        );
        set.items = selection;
        self.undo_redo.add_change(Change::UpdateSelectionSet(change));
        self.pump();
        Ok(())
    }

    /// Makes the set's items the current selection.
    pub fn activate_selection_set(&mut self, index: usize) -> Result<()> {
        let set = self
            .selection_sets
            .get(index)
            .ok_or(EngineError::InvalidIndex { index, len: self.selection_sets.len() })?;
        self.selection = set.items.clone();
        Ok(())
    }

    /// Links a set to the active view as an undoable change.
    pub fn attach_selection_set_to_active_view(&mut self, index: usize) -> Result<bool> {
        let set = self
            .selection_sets
            .get(index)
            .ok_or(EngineError::InvalidIndex { index, len: self.selection_sets.len() })?;
        let link = SelectionSetLink { id: set.id().clone(), name: set.name.clone() };
        let ActiveView::View(view_id) = self.active_view.clone() else {
            return Ok(false);
        };
        let Some(view) = self.views.iter_mut().find(|v| *v.id() == view_id) else {
            return Ok(false);
        };
        view.attach_selection_set(link.clone());
        self.undo_redo.add_change(Change::AttachSelectionSet(AttachSelectionSetChange::new(
            view_id, link, false,
        )));
        self.pump();
        Ok(true)
    }

    pub fn detach_selection_set_from_active_view(&mut self, index: usize) -> Result<bool> {
        let set = self
            .selection_sets
            .get(index)
            .ok_or(EngineError::InvalidIndex { index, len: self.selection_sets.len() })?;
        let link = SelectionSetLink { id: set.id().clone(), name: set.name.clone() };
        let ActiveView::View(view_id) = self.active_view.clone() else {
            return Ok(false);
        };
        let Some(view) = self.views.iter_mut().find(|v| *v.id() == view_id) else {
            return Ok(false);
        };
        view.detach_selection_set(&link.id);
        self.undo_redo.add_change(Change::AttachSelectionSet(AttachSelectionSetChange::new(
            view_id, link, true,
        )));
        self.pump();
        Ok(true)
    }

    // /////////////////////////////////////////
    // Undo / redo

    pub fn undo(&mut self) -> bool {
        let mut ctx = ChangeContext {
            views: &mut self.views,
            initial_view: &mut self.initial_view,
            selection_sets: &mut self.selection_sets,
        };
        let did = self.undo_redo.undo(&mut ctx);
        self.pump();
        did
    }

    pub fn redo(&mut self) -> bool {
        let mut ctx = ChangeContext {
            views: &mut self.views,
            initial_view: &mut self.initial_view,
            selection_sets: &mut self.selection_sets,
        };
        let did = self.undo_redo.redo(&mut ctx);
        self.pump();
        did
    }

    pub fn can_undo(&self) -> bool {
        self.undo_redo.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.undo_redo.can_redo()
    }

    pub fn set_undo_limit(&mut self, limit: Option<usize>) {
        self.config.undo_limit = limit;
        self.undo_redo.set_undo_limit(limit);
    }

    // /////////////////////////////////////////
    // Animation pumping

    /// Advances in-flight transitions; the host calls this from its frame
    /// loop with the elapsed seconds.
    pub fn update(&mut self, dt: f32) {
        self.animator.update(dt);
    }

    pub fn is_transitioning(&self) -> bool {
        !self.animator.is_idle()
    }

    fn cancel_transitions(&mut self) {
        for handle in self.transition_handles.drain(..) {
            handle.cancel();
        }
    }

    // /////////////////////////////////////////
    // Change-Log Adapter

    /// Drains the command log's notifications and routes captured edits into
    /// the correct poses. Called after every editor operation; hosts driving
    /// the log directly can call it themselves.
    pub fn pump(&mut self) {
        for note in self.undo_redo.take_notifications() {
            self.route_notification(note);
        }
    }

    fn route_notification(&mut self, note: ChangeNotification) {
        match note.kind {
            ChangeEventKind::Added => match note.summary {
                ChangeSummary::SelectionTransform { items, prev } => {
                    self.capture_transform_edit(&items, &prev);
                }
                ChangeSummary::ParameterEdit { param, prev } => {
                    self.capture_parameter_edit(&param, prev);
                }
                _ => {}
            },
            ChangeEventKind::Updated => match note.summary {
                ChangeSummary::SelectionTransform { items, .. } => {
                    self.recapture_into_active_view(&items);
                }
                ChangeSummary::ParameterEdit { param, .. } => {
                    if let Some(view) = self.active_regular_view_mut() {
                        let value = param.borrow().value();
                        view.pose.store_param_value(&param, value, false);
                    }
                }
                _ => {}
            },
            ChangeEventKind::Undone | ChangeEventKind::Redone => match note.summary {
                ChangeSummary::ViewCamera { view } => self.reactivate_after_history(Some(view)),
                ChangeSummary::ViewVisibility { view } => self.reactivate_after_history(view),
                _ => {}
            },
        }
    }

    /// A completed drag was logged: the post-edit transforms belong to the
    /// active view, the pre-edit transforms seed the neutral pose exactly
    /// once.
    fn capture_transform_edit(&mut self, items: &[ItemRef], prev: &[Xfo]) {
        let rules = self.config.capture.clone();
        if self.active_regular_view_mut().is_some() {
            for (item, prev_xfo) in items.iter().zip(prev) {
                let param = item.borrow().global_xfo_param();
                if !rules.allows(param.borrow().path().segments()) {
                    continue;
                }
                self.initial_view.pose.store_param_value(
                    &param,
                    ParamValue::Xfo(prev_xfo.clone()),
                    true,
                );
                let value = param.borrow().value();
                if let Some(view) = self.active_regular_view_mut() {
                    view.pose.store_param_value(&param, value, false);
                }
            }
        } else {
            for item in items {
                let param = item.borrow().global_xfo_param();
                if !rules.allows(param.borrow().path().segments()) {
                    continue;
                }
                let value = param.borrow().value();
                self.initial_view.pose.store_param_value(&param, value, false);
            }
        }
    }

    fn capture_parameter_edit(&mut self, param: &ParamRef, prev: ParamValue) {
        if !self.config.capture.allows(param.borrow().path().segments()) {
            return;
        }
        let value = param.borrow().value();
        if self.active_regular_view_mut().is_some() {
            self.initial_view.pose.store_param_value(param, prev, true);
            if let Some(view) = self.active_regular_view_mut() {
                view.pose.store_param_value(param, value, false);
            }
        } else {
            self.initial_view.pose.store_param_value(param, value, false);
        }
    }

    /// An in-flight drag keeps updating: only the active view's snapshot
    /// follows along. The neutral pose was seeded on the initial add and
    /// must not be touched again.
    fn recapture_into_active_view(&mut self, items: &[ItemRef]) {
        let rules = self.config.capture.clone();
        if let Some(view) = self.active_regular_view_mut() {
            for item in items {
                let param = item.borrow().global_xfo_param();
                if !rules.allows(param.borrow().path().segments()) {
                    continue;
                }
                let value = param.borrow().value();
                view.pose.store_param_value(&param, value, false);
            }
        }
    }

    /// The active view, unless it is the Initial View or has been deleted
    /// out from under an in-flight edit — both degrade to neutral routing.
    fn active_regular_view_mut(&mut self) -> Option<&mut View> {
        match &self.active_view {
            ActiveView::View(id) => {
                let id = id.clone();
                self.views.iter_mut().find(move |v| *v.id() == id)
            }
            _ => None,
        }
    }

    /// After an undo/redo restored a view's camera or visibility snapshot,
    /// re-activate that view (instantly) so the display matches the logical
    /// history position.
    fn reactivate_after_history(&mut self, view: Option<ViewId>) {
        self.cancel_transitions();
        match view {
            Some(id) => {
                if let Some(index) = self.views.iter().position(|v| *v.id() == id) {
                    self.views[index].activate(&self.camera, Some(&self.initial_view.pose));
                    self.active_view = ActiveView::View(id);
                } else if self.initial_view.id() == &id {
                    self.initial_view.activate(&self.camera, None);
                    self.active_view = ActiveView::Initial;
                }
            }
            None => {
                self.initial_view.activate(&self.camera, None);
                self.active_view = ActiveView::Initial;
            }
        }
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
