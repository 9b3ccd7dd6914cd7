//! Explicitly constructed command log. The editor owns one instance and
//! passes it by reference; there is no process-wide singleton. Every
//! structural or parameter edit lands here, and the log's notification queue
//! is the only channel the Change-Log Adapter listens on.

use crate::changes::{Change, ChangeContext, ChangeSummary};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEventKind {
    Added,
    Updated,
    Undone,
    Redone,
}

pub struct ChangeNotification {
    pub kind: ChangeEventKind,
    pub summary: ChangeSummary,
}

#[derive(Default)]
pub struct UndoRedoManager {
    undo_stack: Vec<Change>,
    redo_stack: Vec<Change>,
    notifications: VecDeque<ChangeNotification>,
    undo_limit: Option<usize>,
}

impl UndoRedoManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the undo depth. The oldest entries beyond the cap are dropped,
    /// so undo simply stops at the limit.
    pub fn set_undo_limit(&mut self, limit: Option<usize>) {
        self.undo_limit = limit;
        self.trim_to_limit();
    }

    fn trim_to_limit(&mut self) {
        if let Some(limit) = self.undo_limit {
            while self.undo_stack.len() > limit {
                self.undo_stack.remove(0);
            }
        }
    }

    /// Records an already-applied change and announces it.
    pub fn add_change(&mut self, change: Change) {
        self.redo_stack.clear();
        self.notifications
            .push_back(ChangeNotification { kind: ChangeEventKind::Added, summary: change.summary() });
        self.undo_stack.push(change);
        self.trim_to_limit();
    }

    /// The change most recently added, for in-flight updates (drag streams).
    pub fn current_change_mut(&mut self) -> Option<&mut Change> {
        self.undo_stack.last_mut()
    }

    /// Announces that the current change was updated in place.
    pub fn notify_updated(&mut self) {
        if let Some(change) = self.undo_stack.last() {
            self.notifications.push_back(ChangeNotification {
                kind: ChangeEventKind::Updated,
                summary: change.summary(),
            });
        }
    }

    pub fn undo(&mut self, ctx: &mut ChangeContext) -> bool {
        let Some(mut change) = self.undo_stack.pop() else {
            return false;
        };
        log::debug!("undo {}", change.name());
        change.undo(ctx);
        self.notifications
            .push_back(ChangeNotification { kind: ChangeEventKind::Undone, summary: change.summary() });
        self.redo_stack.push(change);
        true
    }

    pub fn redo(&mut self, ctx: &mut ChangeContext) -> bool {
        let Some(mut change) = self.redo_stack.pop() else {
            return false;
        };
        log::debug!("redo {}", change.name());
        change.redo(ctx);
        self.notifications
            .push_back(ChangeNotification { kind: ChangeEventKind::Redone, summary: change.summary() });
        self.undo_stack.push(change);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn take_notifications(&mut self) -> Vec<ChangeNotification> {
        self.notifications.drain(..).collect()
    }

    /// Drops all history, e.g. when starting a new project.
    pub fn flush(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.notifications.clear();
    }
}
