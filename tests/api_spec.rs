use std::time::Duration;

use axum::http::StatusCode;
use axum_test::TestServer;
use intent_backend::api::{create_router, ListResponse};
use intent_backend::db::Database;
use intent_backend::models::*;
use serde_json::json;
use uuid::Uuid;

fn setup() -> TestServer {
    let db = Database::open_memory().expect("Failed to create database");
    db.migrate().expect("Failed to migrate");
    let app = create_router(db, Duration::from_secs(5));
    TestServer::new(app).expect("Failed to create test server")
}

async fn create_intent(server: &TestServer, statement: &str, collaborators: &[&str]) -> Intent {
    server
        .post("/api/intents")
        .json(&json!({
            "statement": statement,
            "context": "Quarterly planning",
            "expectedOutcome": "Something shipped",
            "collaborators": collaborators,
        }))
        .await
        .json::<Intent>()
}

async fn create_goal(server: &TestServer, title: &str) -> Goal {
    server
        .post("/api/goals")
        .json(&json!({
            "title": title,
            "clarityStatement": "Clear enough",
        }))
        .await
        .json::<Goal>()
}

mod health {
    use super::*;

    #[tokio::test]
    async fn reports_ok() {
        let server = setup();
        let response = server.get("/healthz").await;
        response.assert_status_ok();
        assert_eq!(response.text(), "ok");
    }
}

mod intents {
    use super::*;

    #[tokio::test]
    async fn create_returns_201_with_normalized_collaborators() {
        let server = setup();

        let response = server
            .post("/api/intents")
            .json(&json!({
                "statement": "  Ship search  ",
                "context": "Users cannot find things",
                "expectedOutcome": "Search in prod",
                "collaborators": ["Jamie", "JAMIE", " Ana "],
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: serde_json::Value = response.json();
        assert_eq!(body["statement"], "Ship search");
        assert_eq!(body["expectedOutcome"], "Search in prod");
        assert_eq!(body["collaborators"], json!(["Jamie", "Ana"]));
        assert!(body["createdAt"].is_string());
        assert!(body["id"].is_string());
    }

    #[tokio::test]
    async fn create_rejects_blank_required_fields() {
        let server = setup();

        let response = server
            .post("/api/intents")
            .json(&json!({
                "statement": "Ship",
                "context": "   ",
                "expectedOutcome": "Done",
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.text(), "context is required");
    }

    #[tokio::test]
    async fn get_returns_the_created_intent() {
        let server = setup();
        let created = create_intent(&server, "Fetch me", &["Ana"]).await;

        let response = server.get(&format!("/api/intents/{}", created.id)).await;

        response.assert_status_ok();
        assert_eq!(response.json::<Intent>(), created);
    }

    #[tokio::test]
    async fn get_unknown_id_is_404() {
        let server = setup();
        let response = server.get(&format!("/api/intents/{}", Uuid::new_v4())).await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.text(), "Intent not found");
    }

    #[tokio::test]
    async fn malformed_id_is_400() {
        let server = setup();
        let response = server.get("/api/intents/not-a-uuid").await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_replaces_fields() {
        let server = setup();
        let created = create_intent(&server, "Draft", &["Ana"]).await;

        let response = server
            .put(&format!("/api/intents/{}", created.id))
            .json(&json!({
                "statement": "Final",
                "context": "Reworked",
                "expectedOutcome": "Better",
                "collaborators": ["Lee"],
            }))
            .await;

        response.assert_status_ok();
        let updated: Intent = response.json();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.statement, "Final");
        assert_eq!(updated.collaborators, vec!["Lee"]);
    }

    #[tokio::test]
    async fn update_unknown_id_is_404() {
        let server = setup();

        let response = server
            .put(&format!("/api/intents/{}", Uuid::new_v4()))
            .json(&json!({
                "statement": "Ghost",
                "context": "None",
                "expectedOutcome": "Nothing",
            }))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_then_delete_again_is_404() {
        let server = setup();
        let created = create_intent(&server, "Temporary", &[]).await;

        server
            .delete(&format!("/api/intents/{}", created.id))
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server
            .delete(&format!("/api/intents/{}", created.id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_filters_by_collaborator_and_reports_pagination() {
        let server = setup();
        create_intent(&server, "one", &["Ana"]).await;
        create_intent(&server, "two", &["Jamie"]).await;
        create_intent(&server, "three", &["Ana", "Jamie"]).await;

        let response = server
            .get("/api/intents")
            .add_query_param("collaborator", "ana")
            .await;

        response.assert_status_ok();
        let body: ListResponse<Intent> = response.json();
        let statements: Vec<_> = body.items.iter().map(|i| i.statement.as_str()).collect();
        assert_eq!(statements, vec!["three", "one"]);
        assert_eq!(body.pagination.page, 1);
        assert_eq!(body.pagination.page_size, 20);
        assert_eq!(body.pagination.total_items, 2);
        assert_eq!(body.pagination.total_pages, 1);
    }

    #[tokio::test]
    async fn list_pages_with_page_and_page_size() {
        let server = setup();
        for i in 0..5 {
            create_intent(&server, &format!("intent {i}"), &[]).await;
        }

        let response = server
            .get("/api/intents")
            .add_query_param("page", "2")
            .add_query_param("pageSize", "2")
            .await;

        response.assert_status_ok();
        let body: ListResponse<Intent> = response.json();
        let statements: Vec<_> = body.items.iter().map(|i| i.statement.as_str()).collect();
        assert_eq!(statements, vec!["intent 2", "intent 1"]);
        assert_eq!(body.pagination.total_items, 5);
        assert_eq!(body.pagination.total_pages, 3);
    }

    #[tokio::test]
    async fn list_with_huge_page_number_is_empty() {
        let server = setup();
        create_intent(&server, "only", &[]).await;

        let response = server
            .get("/api/intents")
            .add_query_param("page", "9223372036854775807")
            .await;

        response.assert_status_ok();
        let body: ListResponse<Intent> = response.json();
        assert!(body.items.is_empty());
        assert_eq!(body.pagination.total_items, 1);
    }

    #[tokio::test]
    async fn list_rejects_malformed_dates() {
        let server = setup();

        let response = server
            .get("/api/intents")
            .add_query_param("createdAfter", "last tuesday")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.text(), "createdAfter must be RFC3339 timestamp");
    }

    #[tokio::test]
    async fn list_applies_date_bounds() {
        let server = setup();
        create_intent(&server, "old", &[]).await;
        let newer = create_intent(&server, "new", &[]).await;

        let response = server
            .get("/api/intents")
            .add_query_param("createdAfter", newer.created_at.to_rfc3339())
            .await;

        response.assert_status_ok();
        let body: ListResponse<Intent> = response.json();
        assert_eq!(body.items, vec![newer]);
    }
}

mod goals {
    use super::*;

    #[tokio::test]
    async fn create_returns_201_with_every_tag_set() {
        let server = setup();

        let response = server
            .post("/api/goals")
            .json(&json!({
                "title": "Launch",
                "clarityStatement": "Ship v1 to design partners",
                "guardrails": ["No data loss", "no DATA loss"],
                "decisionRights": ["PM owns scope"],
                "constraints": ["Budget"],
                "successCriteria": ["Five partners live"],
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let goal: Goal = response.json();
        assert_eq!(goal.guardrails, vec!["No data loss"]);
        assert_eq!(goal.decision_rights, vec!["PM owns scope"]);
        assert_eq!(goal.constraints, vec!["Budget"]);
        assert_eq!(goal.success_criteria, vec!["Five partners live"]);
        assert_eq!(goal.created_at, goal.updated_at);
    }

    #[tokio::test]
    async fn create_requires_title_and_clarity_statement() {
        let server = setup();

        let response = server
            .post("/api/goals")
            .json(&json!({ "title": "", "clarityStatement": "Something" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.text(), "title is required");

        let response = server
            .post("/api/goals")
            .json(&json!({ "title": "Launch", "clarityStatement": " " }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.text(), "clarityStatement is required");
    }

    #[tokio::test]
    async fn update_restamps_updated_at() {
        let server = setup();
        let created = create_goal(&server, "Launch").await;

        let response = server
            .put(&format!("/api/goals/{}", created.id))
            .json(&json!({
                "title": "Launch v2",
                "clarityStatement": "Ship v2",
                "constraints": ["Q4"],
            }))
            .await;

        response.assert_status_ok();
        let updated: Goal = response.json();
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(updated.constraints, vec!["Q4"]);
    }

    #[tokio::test]
    async fn get_and_delete_unknown_ids_are_404() {
        let server = setup();
        let id = Uuid::new_v4();

        server
            .get(&format!("/api/goals/{id}"))
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .delete(&format!("/api/goals/{id}"))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_searches_and_pages() {
        let server = setup();
        for i in 0..12 {
            create_goal(&server, &format!("goal {i}")).await;
        }

        let response = server
            .get("/api/goals")
            .add_query_param("page", "2")
            .add_query_param("pageSize", "5")
            .await;
        response.assert_status_ok();
        let body: ListResponse<Goal> = response.json();
        let titles: Vec<_> = body.items.iter().map(|g| g.title.as_str()).collect();
        assert_eq!(titles, vec!["goal 6", "goal 5", "goal 4", "goal 3", "goal 2"]);
        assert_eq!(body.pagination.total_items, 12);
        assert_eq!(body.pagination.total_pages, 3);

        let response = server
            .get("/api/goals")
            .add_query_param("q", "GOAL 1")
            .await;
        let body: ListResponse<Goal> = response.json();
        let titles: Vec<_> = body.items.iter().map(|g| g.title.as_str()).collect();
        assert_eq!(titles, vec!["goal 11", "goal 10", "goal 1"]);
    }
}
