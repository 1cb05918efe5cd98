//! Task order reconciliation.
//!
//! The board renders from two independent server signals: the unordered set
//! of top-level tasks and the user's persisted order list. The order list is
//! a permutation-with-gaps: it may hold stale ids (tasks since deleted) and
//! miss fresh ones (tasks created since the order was last saved). This
//! module merges the two into the display sequence, recomputing from scratch
//! whenever either input changes.

use crate::types::Task;
use std::collections::HashMap;

/// Merge a persisted order list with the current task set into the display
/// sequence:
///
/// 1. Ids in `task_order` with a matching task map to that task, keeping
///    the order's relative sequence.
/// 2. Ids with no matching task are dropped.
/// 3. Tasks absent from `task_order` are prepended, in their query order.
/// 4. An absent `task_order` yields an empty sequence, not all tasks.
pub fn reconcile(task_order: Option<&[String]>, tasks: &[Task]) -> Vec<Task> {
    let Some(order) = task_order else {
        return Vec::new();
    };

    let by_id: HashMap<&str, &Task> = tasks.iter().map(|t| (t.id.as_str(), t)).collect();

    let ordered = order
        .iter()
        .filter_map(|id| by_id.get(id.as_str()).map(|t| (*t).clone()));

    let fresh = tasks
        .iter()
        .filter(|t| !order.iter().any(|id| id == &t.id))
        .cloned();

    fresh.chain(ordered).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str) -> Task {
        Task {
            id: id.to_string(),
            title: format!("task {}", id),
            status: "todo".to_string(),
            priority: None,
            description: None,
            due_date: None,
            total_time: 0.0,
            created_by_id: "user-1".to_string(),
            parent_id: None,
            initial: false,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn ids(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.id.as_str()).collect()
    }

    fn order(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn preserves_relative_sequence_of_known_ids() {
        let tasks = vec![task("c"), task("a"), task("b")];
        let out = reconcile(Some(&order(&["a", "b", "c"])), &tasks);
        assert_eq!(ids(&out), vec!["a", "b", "c"]);
    }

    #[test]
    fn drops_stale_ids() {
        let tasks = vec![task("b")];
        let out = reconcile(Some(&order(&["a", "b"])), &tasks);
        assert_eq!(ids(&out), vec!["b"]);
    }

    #[test]
    fn prepends_tasks_missing_from_order_in_query_order() {
        let tasks = vec![task("x"), task("y"), task("a")];
        let out = reconcile(Some(&order(&["a"])), &tasks);
        assert_eq!(ids(&out), vec!["x", "y", "a"]);
    }

    #[test]
    fn deleted_and_new_combined() {
        // order [a,b,c], server set {b,c,d}: a was deleted, d is new
        let tasks = vec![task("b"), task("c"), task("d")];
        let out = reconcile(Some(&order(&["a", "b", "c"])), &tasks);
        assert_eq!(ids(&out), vec!["d", "b", "c"]);
    }

    #[test]
    fn absent_order_yields_empty_sequence() {
        let tasks = vec![task("a"), task("b")];
        let out = reconcile(None, &tasks);
        assert!(out.is_empty());
    }

    #[test]
    fn output_never_contains_ids_absent_from_task_set() {
        let tasks = vec![task("a")];
        let out = reconcile(Some(&order(&["ghost", "a", "phantom"])), &tasks);
        assert_eq!(ids(&out), vec!["a"]);
    }

    #[test]
    fn empty_order_with_tasks_prepends_everything() {
        let tasks = vec![task("a"), task("b")];
        let out = reconcile(Some(&[]), &tasks);
        assert_eq!(ids(&out), vec!["a", "b"]);
    }
}
