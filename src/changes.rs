//! Undoable commands. Structural edits (view and selection-set CRUD) and
//! parameter edits (manipulator drags, single-value changes) are recorded on
//! the command log as `Change` values; `undo`/`redo` replay them against a
//! `ChangeContext` borrowed from the editor, so no command ever holds an
//! aliased copy of editor state.

use crate::math::Xfo;
use crate::scene::{ItemRef, ParamRef, ParamValue};
use crate::selection_set::{SelectionSet, SelectionSetId};
use crate::view::{SelectionSetLink, View, ViewId};
use glam::Vec3;

/// Mutable editor state a command replays against.
pub struct ChangeContext<'a> {
    pub views: &'a mut Vec<View>,
    pub initial_view: &'a mut View,
    pub selection_sets: &'a mut Vec<SelectionSet>,
}

impl<'a> ChangeContext<'a> {
    fn view_mut(&mut self, id: &ViewId) -> Option<&mut View> {
        if self.initial_view.id() == id {
            return Some(self.initial_view);
        }
        self.views.iter_mut().find(|v| v.id() == id)
    }

    fn selection_set_mut(&mut self, id: &SelectionSetId) -> Option<&mut SelectionSet> {
        self.selection_sets.iter_mut().find(|s| s.id() == id)
    }
}

/// Routing-relevant digest of a change, carried by log notifications. The
/// Change-Log Adapter never inspects commands directly.
#[derive(Clone)]
pub enum ChangeSummary {
    /// A manipulator drag over a set of items. `prev` holds the pre-edit
    /// transforms, in item order.
    SelectionTransform { items: Vec<ItemRef>, prev: Vec<Xfo> },
    /// A single parameter edit with its pre-edit value.
    ParameterEdit { param: ParamRef, prev: ParamValue },
    /// A view's stored camera changed.
    ViewCamera { view: ViewId },
    /// A view's visibility snapshot changed. `None` means the Initial View.
    ViewVisibility { view: Option<ViewId> },
    /// Structural edit with no capture-routing consequences.
    Structural,
}

#[derive(Debug)]
pub enum Change {
    SelectionXfo(SelectionXfoChange),
    ParameterValue(ParameterValueChange),
    CreateView(CreateViewChange),
    DeleteView(DeleteViewChange),
    RenameView(RenameViewChange),
    UpdateViewCamera(UpdateViewCameraChange),
    AttachSelectionSet(AttachSelectionSetChange),
    SetSelectionVisibility(SetSelectionVisibilityChange),
    CreateSelectionSet(CreateSelectionSetChange),
    DeleteSelectionSet(DeleteSelectionSetChange),
    RenameSelectionSet(RenameSelectionSetChange),
    UpdateSelectionSet(UpdateSelectionSetChange),
}

impl Change {
    pub fn name(&self) -> &'static str {
        match self {
            Change::SelectionXfo(_) => "SelectionXfo",
            Change::ParameterValue(_) => "ParameterValue",
            Change::CreateView(_) => "CreateView",
            Change::DeleteView(_) => "DeleteView",
            Change::RenameView(_) => "RenameView",
            Change::UpdateViewCamera(_) => "UpdateViewCamera",
            Change::AttachSelectionSet(_) => "AttachSelectionSet",
            Change::SetSelectionVisibility(_) => "SetSelectionVisibility",
            Change::CreateSelectionSet(_) => "CreateSelectionSet",
            Change::DeleteSelectionSet(_) => "DeleteSelectionSet",
            Change::RenameSelectionSet(_) => "RenameSelectionSet",
            Change::UpdateSelectionSet(_) => "UpdateSelectionSet",
        }
    }

    pub fn undo(&mut self, ctx: &mut ChangeContext) {
        match self {
            Change::SelectionXfo(c) => c.apply(&c.prev.clone()),
            Change::ParameterValue(c) => c.param.borrow_mut().set_value(c.prev.clone()),
            Change::CreateView(c) => c.remove(ctx),
            Change::DeleteView(c) => c.restore(ctx),
            Change::RenameView(c) => c.apply(ctx, true),
            Change::UpdateViewCamera(c) => c.apply(ctx, true),
            Change::AttachSelectionSet(c) => c.apply(ctx, true),
            Change::SetSelectionVisibility(c) => {
                let visible = !c.visible;
                c.apply(ctx, visible);
            }
            Change::CreateSelectionSet(c) => c.remove(ctx),
            Change::DeleteSelectionSet(c) => c.restore(ctx),
            Change::RenameSelectionSet(c) => c.apply(ctx, true),
            Change::UpdateSelectionSet(c) => c.apply(ctx, true),
        }
    }

    pub fn redo(&mut self, ctx: &mut ChangeContext) {
        match self {
            Change::SelectionXfo(c) => c.apply(&c.next.clone()),
            Change::ParameterValue(c) => c.param.borrow_mut().set_value(c.next.clone()),
            Change::CreateView(c) => c.restore(ctx),
            Change::DeleteView(c) => c.remove(ctx),
            Change::RenameView(c) => c.apply(ctx, false),
            Change::UpdateViewCamera(c) => c.apply(ctx, false),
            Change::AttachSelectionSet(c) => c.apply(ctx, false),
            Change::SetSelectionVisibility(c) => {
                let visible = c.visible;
                c.apply(ctx, visible);
            }
            Change::CreateSelectionSet(c) => c.restore(ctx),
            Change::DeleteSelectionSet(c) => c.remove(ctx),
            Change::RenameSelectionSet(c) => c.apply(ctx, false),
            Change::UpdateSelectionSet(c) => c.apply(ctx, false),
        }
    }

    pub fn summary(&self) -> ChangeSummary {
        match self {
            Change::SelectionXfo(c) => ChangeSummary::SelectionTransform {
                items: c.items.clone(),
                prev: c.prev.clone(),
            },
            Change::ParameterValue(c) => ChangeSummary::ParameterEdit {
                param: c.param.clone(),
                prev: c.prev.clone(),
            },
            Change::UpdateViewCamera(c) => ChangeSummary::ViewCamera { view: c.view.clone() },
            Change::SetSelectionVisibility(c) => {
                ChangeSummary::ViewVisibility { view: c.view.clone() }
            }
            _ => ChangeSummary::Structural,
        }
    }
}

// /////////////////////////////////////////
// Parameter edits

/// A 3D-manipulator drag over the current selection. Created when the drag
/// starts; `update` re-applies the in-flight transforms while the pointer
/// moves.
#[derive(Debug)]
pub struct SelectionXfoChange {
    pub items: Vec<ItemRef>,
    pub prev: Vec<Xfo>,
    pub next: Vec<Xfo>,
}

impl SelectionXfoChange {
    pub fn new(items: Vec<ItemRef>) -> Self {
        let prev: Vec<Xfo> = items.iter().map(|item| item.borrow().global_xfo()).collect();
        let next = prev.clone();
        Self { items, prev, next }
    }

    pub fn update(&mut self, xfos: &[Xfo]) {
        self.next = xfos.to_vec();
        self.apply(&self.next.clone());
    }

    fn apply(&self, xfos: &[Xfo]) {
        for (item, xfo) in self.items.iter().zip(xfos) {
            item.borrow().set_global_xfo(xfo.clone());
        }
    }
}

/// A single parameter's value edit. Captures the pre-edit value and applies
/// the new one on construction.
#[derive(Debug)]
pub struct ParameterValueChange {
    pub param: ParamRef,
    pub prev: ParamValue,
    pub next: ParamValue,
}

impl ParameterValueChange {
    pub fn new(param: ParamRef, next: ParamValue) -> Self {
        let prev = param.borrow().value();
        param.borrow_mut().set_value(next.clone());
        Self { param, prev, next }
    }

    pub fn update(&mut self, next: ParamValue) {
        self.param.borrow_mut().set_value(next.clone());
        self.next = next;
    }
}

// /////////////////////////////////////////
// View commands

#[derive(Debug)]
pub struct CreateViewChange {
    index: usize,
    stash: Option<View>,
}

impl CreateViewChange {
    /// Recorded after the editor pushed the new view at `index`.
    pub fn new(index: usize) -> Self {
        Self { index, stash: None }
    }

    fn remove(&mut self, ctx: &mut ChangeContext) {
        if self.index < ctx.views.len() {
            self.stash = Some(ctx.views.remove(self.index));
        }
    }

    fn restore(&mut self, ctx: &mut ChangeContext) {
        if let Some(view) = self.stash.take() {
            let index = self.index.min(ctx.views.len());
            ctx.views.insert(index, view);
        }
    }
}

#[derive(Debug)]
pub struct DeleteViewChange {
    index: usize,
    stash: Option<View>,
}

impl DeleteViewChange {
    /// Takes ownership of the removed view so undo can restore it at its
    /// original index with the same id.
    pub fn new(index: usize, view: View) -> Self {
        Self { index, stash: Some(view) }
    }

    fn remove(&mut self, ctx: &mut ChangeContext) {
        if self.index < ctx.views.len() {
            self.stash = Some(ctx.views.remove(self.index));
        }
    }

    fn restore(&mut self, ctx: &mut ChangeContext) {
        if let Some(view) = self.stash.take() {
            let index = self.index.min(ctx.views.len());
            ctx.views.insert(index, view);
        }
    }
}

#[derive(Debug)]
pub struct RenameViewChange {
    view: ViewId,
    prev_name: String,
    new_name: String,
}

impl RenameViewChange {
    pub fn new(view: ViewId, prev_name: String, new_name: String) -> Self {
        Self { view, prev_name, new_name }
    }

    fn apply(&self, ctx: &mut ChangeContext, backwards: bool) {
        let name = if backwards { &self.prev_name } else { &self.new_name };
        if let Some(view) = ctx.view_mut(&self.view) {
            view.name = name.clone();
        }
    }
}

#[derive(Debug)]
pub struct UpdateViewCameraChange {
    view: ViewId,
    prev_xfo: Xfo,
    prev_target: Vec3,
    next_xfo: Xfo,
    next_target: Vec3,
}

impl UpdateViewCameraChange {
    pub fn new(
        view: ViewId,
        prev_xfo: Xfo,
        prev_target: Vec3,
        next_xfo: Xfo,
        next_target: Vec3,
    ) -> Self {
        Self { view, prev_xfo, prev_target, next_xfo, next_target }
    }

    fn apply(&self, ctx: &mut ChangeContext, backwards: bool) {
        let (xfo, target) = if backwards {
            (self.prev_xfo.clone(), self.prev_target)
        } else {
            (self.next_xfo.clone(), self.next_target)
        };
        if let Some(view) = ctx.view_mut(&self.view) {
            view.set_camera_xfo(xfo, target);
        }
    }
}

#[derive(Debug)]
pub struct AttachSelectionSetChange {
    view: ViewId,
    link: SelectionSetLink,
    detach: bool,
}

impl AttachSelectionSetChange {
    pub fn new(view: ViewId, link: SelectionSetLink, detach: bool) -> Self {
        Self { view, link, detach }
    }

    fn apply(&self, ctx: &mut ChangeContext, backwards: bool) {
        let Some(view) = ctx.view_mut(&self.view) else {
            return;
        };
        // Undoing an attach detaches; undoing a detach re-attaches.
        if self.detach != backwards {
            view.detach_selection_set(&self.link.id);
        } else {
            view.attach_selection_set(self.link.clone());
        }
    }
}

/// Visibility edit captured through the pose layers. Raised from a regular
/// view it seeds the neutral pose first-write-wins with the opposite state;
/// raised from the Initial View it also propagates to every view's pose.
/// With no active view only the neutral pose is written.
#[derive(Debug)]
pub struct SetSelectionVisibilityChange {
    /// `None` targets the neutral pose directly.
    view: Option<ViewId>,
    items: Vec<ItemRef>,
    visible: bool,
    propagate_to_all: bool,
}

impl SetSelectionVisibilityChange {
    pub fn new(
        view: Option<ViewId>,
        items: Vec<ItemRef>,
        visible: bool,
        propagate_to_all: bool,
    ) -> Self {
        Self { view, items, visible, propagate_to_all }
    }

    pub fn apply(&self, ctx: &mut ChangeContext, visible: bool) {
        for item in &self.items {
            let param = item.borrow().visible_param();
            match &self.view {
                Some(id) => {
                    ctx.initial_view.pose.store_param_value(
                        &param,
                        ParamValue::Bool(!visible),
                        true,
                    );
                    // The view may have been deleted since; the neutral
                    // capture above still holds the restore value.
                    if let Some(view) = ctx.view_mut(id) {
                        view.pose.store_param_value(&param, ParamValue::Bool(visible), false);
                    }
                }
                None => {
                    ctx.initial_view.pose.store_param_value(
                        &param,
                        ParamValue::Bool(visible),
                        false,
                    );
                }
            }
            if self.propagate_to_all {
                for view in ctx.views.iter_mut() {
                    view.pose.store_param_value(&param, ParamValue::Bool(visible), false);
                }
            }
            param.borrow_mut().set_value(ParamValue::Bool(visible));
        }
    }
}

// /////////////////////////////////////////
// Selection-set commands

#[derive(Debug)]
pub struct CreateSelectionSetChange {
    index: usize,
    stash: Option<SelectionSet>,
}

impl CreateSelectionSetChange {
    pub fn new(index: usize) -> Self {
        Self { index, stash: None }
    }

    fn remove(&mut self, ctx: &mut ChangeContext) {
        if self.index < ctx.selection_sets.len() {
            self.stash = Some(ctx.selection_sets.remove(self.index));
        }
    }

    fn restore(&mut self, ctx: &mut ChangeContext) {
        if let Some(set) = self.stash.take() {
            let index = self.index.min(ctx.selection_sets.len());
            ctx.selection_sets.insert(index, set);
        }
    }
}

#[derive(Debug)]
pub struct DeleteSelectionSetChange {
    index: usize,
    stash: Option<SelectionSet>,
}

impl DeleteSelectionSetChange {
    pub fn new(index: usize, set: SelectionSet) -> Self {
        Self { index, stash: Some(set) }
    }

    fn remove(&mut self, ctx: &mut ChangeContext) {
        if self.index < ctx.selection_sets.len() {
            self.stash = Some(ctx.selection_sets.remove(self.index));
        }
    }

    fn restore(&mut self, ctx: &mut ChangeContext) {
        if let Some(set) = self.stash.take() {
            let index = self.index.min(ctx.selection_sets.len());
            ctx.selection_sets.insert(index, set);
        }
    }
}

#[derive(Debug)]
pub struct RenameSelectionSetChange {
    set: SelectionSetId,
    prev_name: String,
    new_name: String,
}

impl RenameSelectionSetChange {
    pub fn new(set: SelectionSetId, prev_name: String, new_name: String) -> Self {
        Self { set, prev_name, new_name }
    }

    fn apply(&self, ctx: &mut ChangeContext, backwards: bool) {
        let name = if backwards { &self.prev_name } else { &self.new_name };
        if let Some(set) = ctx.selection_set_mut(&self.set) {
            set.name = name.clone();
        }
    }
}

#[derive(Debug)]
pub struct UpdateSelectionSetChange {
    set: SelectionSetId,
    prev_items: Vec<ItemRef>,
    next_items: Vec<ItemRef>,
}

impl UpdateSelectionSetChange {
    pub fn new(set: SelectionSetId, prev_items: Vec<ItemRef>, next_items: Vec<ItemRef>) -> Self {
        Self { set, prev_items, next_items }
    }

    fn apply(&self, ctx: &mut ChangeContext, backwards: bool) {
        let items = if backwards { &self.prev_items } else { &self.next_items };
        if let Some(set) = ctx.selection_set_mut(&self.set) {
            set.items = items.clone();
        }
    }
}
