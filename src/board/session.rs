//! Per-user board sessions.
//!
//! A [`BoardState`] is the working copy of one user's board: the reconciled
//! card sequence plus the in-flight drag state. Cards created on the board
//! start as [`Persistence::Draft`] and stay entirely session-local until
//! saved; only then does an upsert payload leave the session. The registry
//! keyed by user id lives behind a mutex, same shape as the connection
//! handle in the db layer.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::board::dnd::{array_move, DragEffects, DragState, DropTarget};
use crate::board::order::reconcile;
use crate::types::{new_task_id, Task, TaskUpsert};

/// Whether a card exists in the store yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persistence {
    Draft,
    Persisted,
}

#[derive(Debug, Clone)]
pub struct BoardCard {
    pub task: Task,
    pub persistence: Persistence,
}

#[derive(Debug, Default)]
pub struct BoardState {
    cards: Vec<BoardCard>,
    drag: DragState,
}

impl BoardState {
    /// Build a session from the server's order field and task rows.
    /// Reconciliation drops stale ids and prepends unordered tasks.
    pub fn from_server(task_order: Option<&[String]>, tasks: &[Task]) -> Self {
        let cards = reconcile(task_order, tasks)
            .into_iter()
            .map(|task| BoardCard {
                task,
                persistence: Persistence::Persisted,
            })
            .collect();
        Self {
            cards,
            drag: DragState::Idle,
        }
    }

    pub fn get(&self, task_id: &str) -> Option<&Task> {
        self.cards
            .iter()
            .find(|c| c.task.id == task_id)
            .map(|c| &c.task)
    }

    pub fn is_draft(&self, task_id: &str) -> bool {
        self.cards
            .iter()
            .any(|c| c.task.id == task_id && c.persistence == Persistence::Draft)
    }

    /// Cards in one status column, in board order.
    pub fn column(&self, status: &str) -> Vec<&Task> {
        self.cards
            .iter()
            .filter(|c| c.task.status == status)
            .map(|c| &c.task)
            .collect()
    }

    /// The full id sequence, the shape stored in the user's order field.
    pub fn order_ids(&self) -> Vec<String> {
        self.cards.iter().map(|c| c.task.id.clone()).collect()
    }

    fn index_of(&self, task_id: &str) -> Option<usize> {
        self.cards.iter().position(|c| c.task.id == task_id)
    }

    /// Add an untitled draft card at the bottom of a column. The card gets a
    /// fresh id up front so later edits and the eventual save address it.
    pub fn create_draft(&mut self, status: &str, user_id: &str) -> &Task {
        let now = chrono::Utc::now().timestamp_millis();
        let task = Task {
            id: new_task_id(),
            title: String::new(),
            status: status.to_string(),
            priority: None,
            description: None,
            due_date: None,
            total_time: 0.0,
            created_by_id: user_id.to_string(),
            parent_id: None,
            initial: true,
            created_at: now,
            updated_at: now,
        };
        self.cards.push(BoardCard {
            task,
            persistence: Persistence::Draft,
        });
        &self.cards.last().unwrap().task
    }

    /// Session-local title edit. Unknown ids are ignored.
    pub fn rename(&mut self, task_id: &str, title: &str) -> bool {
        match self.cards.iter_mut().find(|c| c.task.id == task_id) {
            Some(card) => {
                card.task.title = title.to_string();
                true
            }
            None => false,
        }
    }

    /// Prepare a card for persistence: the draft flag comes off, the card is
    /// marked persisted, and the upsert payload is handed back for the store.
    pub fn save_payload(&mut self, task_id: &str) -> Option<TaskUpsert> {
        let card = self.cards.iter_mut().find(|c| c.task.id == task_id)?;
        card.task.initial = false;
        card.persistence = Persistence::Persisted;
        Some(TaskUpsert {
            id: card.task.id.clone(),
            title: card.task.title.clone(),
            status: card.task.status.clone(),
            created_by_id: card.task.created_by_id.clone(),
            initial: false,
            total_time: card.task.total_time,
            parent_id: card.task.parent_id.clone(),
        })
    }

    /// Drop a card from the session. Draft cards vanish without any store
    /// traffic; persisted cards still need a delete against the store.
    pub fn remove(&mut self, task_id: &str) -> bool {
        if let DragState::Dragging { task_id: active, .. } = &self.drag {
            if active == task_id {
                self.drag = DragState::Idle;
            }
        }
        match self.index_of(task_id) {
            Some(idx) => {
                self.cards.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Begin a drag. Ids that are not task cards (column drops, stale
    /// elements) are ignored and the machine stays idle.
    pub fn drag_start(&mut self, task_id: &str) {
        if self.index_of(task_id).is_some() {
            self.drag = DragState::Dragging {
                task_id: task_id.to_string(),
                last_target: None,
            };
        }
    }

    /// Move the dragged card under the pointer. Over another task the card
    /// adopts that task's status and slides to its index; over a column it
    /// adopts the column status and keeps its position. Re-applying the
    /// target the card is already on is a no-op, so the drop handler can
    /// pass its target again without moving the card twice.
    pub fn drag_over(&mut self, target: &DropTarget) {
        let DragState::Dragging { task_id, last_target } = &self.drag else {
            return;
        };
        if last_target.as_ref() == Some(target) {
            return;
        }
        let Some(active_idx) = self.index_of(task_id) else {
            return;
        };
        match target {
            DropTarget::Task(over_id) => {
                if over_id == task_id {
                    return;
                }
                let Some(over_idx) = self.index_of(over_id) else {
                    return;
                };
                self.cards[active_idx].task.status = self.cards[over_idx].task.status.clone();
                array_move(&mut self.cards, active_idx, over_idx);
            }
            DropTarget::Column(status) => {
                self.cards[active_idx].task.status = status.clone();
            }
        }
        if let DragState::Dragging { last_target, .. } = &mut self.drag {
            *last_target = Some(target.clone());
        }
    }

    /// Finish the drag and report what to persist: the dragged task's final
    /// status and the full resulting order. Returns `None` when no drag was
    /// in flight.
    pub fn drag_end(&mut self) -> Option<DragEffects> {
        let drag = std::mem::take(&mut self.drag);
        let DragState::Dragging { task_id, .. } = drag else {
            return None;
        };
        let status = self.get(&task_id)?.status.clone();
        Some(DragEffects {
            task_id,
            status,
            order: self.order_ids(),
        })
    }
}

/// Registry of live board sessions, one per user.
#[derive(Debug, Default)]
pub struct BoardSessions {
    inner: Mutex<HashMap<String, BoardState>>,
}

impl BoardSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` against the user's session, seeding one if none exists.
    pub fn with_state<R>(
        &self,
        user_id: &str,
        seed: impl FnOnce() -> BoardState,
        f: impl FnOnce(&mut BoardState) -> R,
    ) -> R {
        let mut sessions = self.inner.lock().unwrap();
        let state = sessions
            .entry(user_id.to_string())
            .or_insert_with(seed);
        f(state)
    }

    /// Replace the user's session with a freshly reconciled one.
    pub fn replace(&self, user_id: &str, state: BoardState) {
        self.inner
            .lock()
            .unwrap()
            .insert(user_id.to_string(), state);
    }

    /// Drop the user's session so the next access reloads from the store.
    pub fn invalidate(&self, user_id: &str) {
        self.inner.lock().unwrap().remove(user_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, status: &str) -> Task {
        Task {
            id: id.to_string(),
            title: format!("task {id}"),
            status: status.to_string(),
            priority: None,
            description: None,
            due_date: None,
            total_time: 0.0,
            created_by_id: "u1".to_string(),
            parent_id: None,
            initial: false,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn board() -> BoardState {
        let tasks = vec![task("a", "todo"), task("b", "todo"), task("c", "test")];
        let order = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        BoardState::from_server(Some(&order), &tasks)
    }

    #[test]
    fn drag_over_task_takes_status_and_position() {
        let mut state = board();
        state.drag_start("a");
        state.drag_over(&DropTarget::Task("c".to_string()));
        let effects = state.drag_end().unwrap();
        assert_eq!(effects.task_id, "a");
        assert_eq!(effects.status, "test");
        // array-move semantics: a is removed, then re-inserted at c's index
        assert_eq!(effects.order, vec!["b", "c", "a"]);
        // a and c are now adjacent in the same column
        let col: Vec<_> = state.column("test").iter().map(|t| t.id.clone()).collect();
        assert_eq!(col, vec!["c", "a"]);
    }

    #[test]
    fn drag_over_column_changes_status_only() {
        let mut state = board();
        state.drag_start("a");
        state.drag_over(&DropTarget::Column("complete".to_string()));
        let effects = state.drag_end().unwrap();
        assert_eq!(effects.status, "complete");
        assert_eq!(effects.order, vec!["a", "b", "c"]);
    }

    #[test]
    fn drag_over_self_is_noop() {
        let mut state = board();
        state.drag_start("b");
        state.drag_over(&DropTarget::Task("b".to_string()));
        let effects = state.drag_end().unwrap();
        assert_eq!(effects.status, "todo");
        assert_eq!(effects.order, vec!["a", "b", "c"]);
    }

    #[test]
    fn repeated_drag_over_same_target_moves_once() {
        let mut state = board();
        state.drag_start("a");
        state.drag_over(&DropTarget::Task("c".to_string()));
        let after_first = state.order_ids();
        // the drop handler re-posts its final target before ending the drag
        state.drag_over(&DropTarget::Task("c".to_string()));
        assert_eq!(state.order_ids(), after_first);

        let effects = state.drag_end().unwrap();
        assert_eq!(effects.order, after_first);
        assert_eq!(effects.status, "test");
    }

    #[test]
    fn drag_start_unknown_id_stays_idle() {
        let mut state = board();
        state.drag_start("nope");
        state.drag_over(&DropTarget::Column("test".to_string()));
        assert!(state.drag_end().is_none());
        assert_eq!(state.order_ids(), vec!["a", "b", "c"]);
    }

    #[test]
    fn drag_end_without_drag_is_none() {
        let mut state = board();
        assert!(state.drag_end().is_none());
    }

    #[test]
    fn multiple_drag_over_events_compound() {
        let mut state = board();
        state.drag_start("b");
        // over c: [a,c,b], status "test"; then over a: [b,a,c], status "todo"
        state.drag_over(&DropTarget::Task("c".to_string()));
        state.drag_over(&DropTarget::Task("a".to_string()));
        let effects = state.drag_end().unwrap();
        assert_eq!(effects.status, "todo");
        assert_eq!(effects.order, vec!["b", "a", "c"]);
    }

    #[test]
    fn removing_dragged_card_resets_machine() {
        let mut state = board();
        state.drag_start("a");
        assert!(state.remove("a"));
        assert!(state.drag_end().is_none());
    }

    #[test]
    fn draft_lifecycle() {
        let mut state = board();
        let id = state.create_draft("todo", "u1").id.clone();
        assert!(state.is_draft(&id));
        assert!(state.get(&id).unwrap().initial);
        assert_eq!(state.order_ids().last(), Some(&id));

        state.rename(&id, "write report");
        let payload = state.save_payload(&id).unwrap();
        assert_eq!(payload.title, "write report");
        assert!(!payload.initial);
        assert!(!state.is_draft(&id));
        assert!(!state.get(&id).unwrap().initial);
    }

    #[test]
    fn rename_unknown_id_is_noop() {
        let mut state = board();
        assert!(!state.rename("nope", "x"));
        assert!(state.save_payload("nope").is_none());
    }

    #[test]
    fn sessions_seed_once_and_invalidate() {
        let sessions = BoardSessions::new();
        let n = sessions.with_state("u1", board, |s| s.order_ids().len());
        assert_eq!(n, 3);
        // seed closure must not run again for a live session
        let n = sessions.with_state("u1", BoardState::default, |s| s.order_ids().len());
        assert_eq!(n, 3);
        sessions.invalidate("u1");
        let n = sessions.with_state("u1", BoardState::default, |s| s.order_ids().len());
        assert_eq!(n, 0);
    }
}
