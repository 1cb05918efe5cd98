//! Integration tests for the RPC procedures.
//!
//! Handlers are plain async functions over extractor values, so these tests
//! call them directly against an in-memory database and assert on the JSON
//! they return and the rows they leave behind.

use axum::extract::{FromRequestParts, Query, State};
use axum::http::Request;
use axum::Json;
use taskboard::db::Database;
use taskboard::error::ErrorCode;
use taskboard::rpc::{tasks, users, AppState, Identity, IDENTITY_HEADER};
use taskboard::types::{new_task_id, TaskUpsert};

fn setup_state() -> AppState {
    AppState::new(Database::open_in_memory().expect("Failed to create in-memory database"))
}

fn identity(user: &str) -> Identity {
    Identity(user.to_string())
}

fn upsert_payload(user: &str, title: &str, status: &str) -> TaskUpsert {
    TaskUpsert {
        id: new_task_id(),
        title: title.to_string(),
        status: status.to_string(),
        created_by_id: user.to_string(),
        initial: false,
        total_time: 0.0,
        parent_id: None,
    }
}

mod identity_tests {
    use super::*;

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let req = Request::builder().uri("/rpc/getUsersTasks").body(()).unwrap();
        let (mut parts, _) = req.into_parts();

        let err = Identity::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn blank_header_is_unauthorized() {
        let req = Request::builder()
            .uri("/rpc/getUsersTasks")
            .header(IDENTITY_HEADER, "   ")
            .body(())
            .unwrap();
        let (mut parts, _) = req.into_parts();

        assert!(Identity::from_request_parts(&mut parts, &()).await.is_err());
    }

    #[tokio::test]
    async fn header_value_becomes_identity() {
        let req = Request::builder()
            .uri("/rpc/getUsersTasks")
            .header(IDENTITY_HEADER, "user-42")
            .body(())
            .unwrap();
        let (mut parts, _) = req.into_parts();

        let Identity(user_id) = Identity::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(user_id, "user-42");
    }
}

mod user_procedure_tests {
    use super::*;

    #[tokio::test]
    async fn auth_callback_creates_user_once() {
        let state = setup_state();

        let Json(body) = users::auth_callback(State(state.clone()), identity("u1"))
            .await
            .unwrap();
        assert_eq!(body["success"], true);

        // second call is a no-op, not an error
        users::auth_callback(State(state.clone()), identity("u1"))
            .await
            .unwrap();
        assert!(!state.db.ensure_user("u1").unwrap());
    }

    #[tokio::test]
    async fn task_order_roundtrip() {
        let state = setup_state();
        users::auth_callback(State(state.clone()), identity("u1"))
            .await
            .unwrap();

        let Json(order) = users::get_task_order(State(state.clone()), identity("u1"))
            .await
            .unwrap();
        assert_eq!(order, None);

        users::update_task_order(
            State(state.clone()),
            identity("u1"),
            Json(users::UpdateTaskOrderInput {
                sort_order: vec!["a".into(), "b".into()],
            }),
        )
        .await
        .unwrap();

        let Json(order) = users::get_task_order(State(state.clone()), identity("u1"))
            .await
            .unwrap();
        assert_eq!(order, Some(vec!["a".to_string(), "b".to_string()]));
    }
}

mod task_procedure_tests {
    use super::*;

    #[tokio::test]
    async fn upsert_takes_ownership_from_identity() {
        let state = setup_state();

        let mut payload = upsert_payload("spoofed-user", "mine", "todo");
        let id = payload.id.clone();
        payload.created_by_id = "spoofed-user".to_string();

        tasks::upsert_task(State(state.clone()), identity("u1"), Json(payload))
            .await
            .unwrap();

        let task = state.db.get_task(&id).unwrap().unwrap();
        assert_eq!(task.created_by_id, "u1");
    }

    #[tokio::test]
    async fn upsert_rejects_blank_id() {
        let state = setup_state();
        let mut payload = upsert_payload("u1", "t", "todo");
        payload.id = "  ".to_string();

        let err = tasks::upsert_task(State(state.clone()), identity("u1"), Json(payload))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingRequiredField);
        assert_eq!(err.field.as_deref(), Some("id"));
    }

    #[tokio::test]
    async fn get_users_tasks_is_scoped_to_caller() {
        let state = setup_state();

        tasks::upsert_task(
            State(state.clone()),
            identity("u1"),
            Json(upsert_payload("u1", "mine", "todo")),
        )
        .await
        .unwrap();
        tasks::upsert_task(
            State(state.clone()),
            identity("u2"),
            Json(upsert_payload("u2", "theirs", "todo")),
        )
        .await
        .unwrap();

        let Json(mine) = tasks::get_users_tasks(State(state.clone()), identity("u1"))
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].title, "mine");
    }

    #[tokio::test]
    async fn get_sub_tasks_by_parent() {
        let state = setup_state();

        let parent = upsert_payload("u1", "parent", "todo");
        let parent_id = parent.id.clone();
        tasks::upsert_task(State(state.clone()), identity("u1"), Json(parent))
            .await
            .unwrap();

        let mut child = upsert_payload("u1", "child", "todo");
        child.parent_id = Some(parent_id.clone());
        tasks::upsert_task(State(state.clone()), identity("u1"), Json(child))
            .await
            .unwrap();

        let Json(subs) = tasks::get_sub_tasks(
            State(state.clone()),
            identity("u1"),
            Query(tasks::SubTasksQuery {
                task_id: parent_id.clone(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].title, "child");
    }

    #[tokio::test]
    async fn field_mutations_succeed_for_unknown_ids() {
        let state = setup_state();

        let Json(body) = tasks::update_title(
            State(state.clone()),
            identity("u1"),
            Json(serde_json::from_value(serde_json::json!({
                "taskId": "nope",
                "title": "x"
            })).unwrap()),
        )
        .await
        .unwrap();
        assert_eq!(body["success"], true);

        let Json(body) = tasks::delete_task(
            State(state.clone()),
            identity("u1"),
            Json(serde_json::from_value(serde_json::json!({ "id": "nope" })).unwrap()),
        )
        .await
        .unwrap();
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn update_due_date_rejects_unrepresentable_values() {
        let state = setup_state();

        let err = tasks::update_due_date(
            State(state.clone()),
            identity("u1"),
            Json(serde_json::from_value(serde_json::json!({
                "taskId": "t",
                "dueDate": i64::MAX
            })).unwrap()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFieldValue);
        assert_eq!(err.field.as_deref(), Some("dueDate"));
    }

    #[tokio::test]
    async fn update_due_date_stores_milliseconds_verbatim() {
        let state = setup_state();

        let payload = upsert_payload("u1", "t", "todo");
        let id = payload.id.clone();
        tasks::upsert_task(State(state.clone()), identity("u1"), Json(payload))
            .await
            .unwrap();

        tasks::update_due_date(
            State(state.clone()),
            identity("u1"),
            Json(serde_json::from_value(serde_json::json!({
                "taskId": id,
                "dueDate": 1772323200000i64
            })).unwrap()),
        )
        .await
        .unwrap();

        let task = state.db.get_task(&id).unwrap().unwrap();
        assert_eq!(task.due_date, Some(1772323200000));
    }

    #[tokio::test]
    async fn update_total_time_rejects_negative_values() {
        let state = setup_state();

        let err = tasks::update_total_time(
            State(state.clone()),
            identity("u1"),
            Json(serde_json::from_value(serde_json::json!({
                "taskId": "t",
                "totalTime": -5.0
            })).unwrap()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFieldValue);
    }

    #[tokio::test]
    async fn delete_task_removes_subtree_and_order_entry() {
        let state = setup_state();

        let parent = upsert_payload("u1", "parent", "todo");
        let parent_id = parent.id.clone();
        tasks::upsert_task(State(state.clone()), identity("u1"), Json(parent))
            .await
            .unwrap();

        let mut child = upsert_payload("u1", "child", "todo");
        child.parent_id = Some(parent_id.clone());
        let child_id = child.id.clone();
        tasks::upsert_task(State(state.clone()), identity("u1"), Json(child))
            .await
            .unwrap();

        users::update_task_order(
            State(state.clone()),
            identity("u1"),
            Json(users::UpdateTaskOrderInput {
                sort_order: vec![parent_id.clone()],
            }),
        )
        .await
        .unwrap();

        tasks::delete_task(
            State(state.clone()),
            identity("u1"),
            Json(serde_json::from_value(serde_json::json!({ "id": parent_id })).unwrap()),
        )
        .await
        .unwrap();

        assert!(state.db.get_task(&parent_id).unwrap().is_none());
        assert!(state.db.get_task(&child_id).unwrap().is_none());
        assert_eq!(state.db.get_task_order("u1").unwrap(), Some(vec![]));
    }
}
