//! Drag-and-drop primitives.
//!
//! The machine is deliberately small: idle until a task is picked up,
//! dragging until the pointer is released. Reordering uses array-move
//! semantics (remove then insert, index-based) so that several drag-over
//! events inside one drag compound correctly; the indexes shift under the
//! dragged task as it moves.

use serde::{Deserialize, Serialize};

/// What the dragged task is currently over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "camelCase")]
pub enum DropTarget {
    /// Another task card; the dragged task takes its status and position.
    Task(String),
    /// A status column; the dragged task takes its status, order unchanged.
    Column(String),
}

/// Drag machine state. Columns are not drag subjects, so there is only one
/// dragging variant. The last applied target is remembered so that a
/// repeated drag-over event for the same target does not move the card
/// again (the drop handler re-applies its target before ending the drag).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        task_id: String,
        last_target: Option<DropTarget>,
    },
}

/// The mutations to persist when a drag ends: one status update for the
/// dragged task and the full resulting order. The server order field is the
/// authoritative store, so both are written in the same flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragEffects {
    pub task_id: String,
    pub status: String,
    pub order: Vec<String>,
}

/// Remove the element at `from` and re-insert it at `to`.
/// Out-of-range indexes are ignored.
pub fn array_move<T>(items: &mut Vec<T>, from: usize, to: usize) {
    if from >= items.len() || to >= items.len() {
        return;
    }
    let item = items.remove(from);
    items.insert(to, item);
}
