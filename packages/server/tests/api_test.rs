//! HTTP API Integration Tests
//!
//! Drives the router in-process with `tower::ServiceExt::oneshot`; no socket
//! is opened.

#[cfg(test)]
mod api_tests {
    use anyhow::Result;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use http_body_util::BodyExt;
    use navtree_core::db::MemoryStore;
    use navtree_core::services::{ChannelAuditSink, TreeOperation, TreeService};
    use navtree_core::TreeConfig;
    use navtree_server::{create_router, AppState};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tokio::time::{timeout, Duration};
    use tower::ServiceExt;

    fn create_app() -> Result<(Router, TreeService)> {
        let service = TreeService::new(Arc::new(MemoryStore::new()), TreeConfig::default())?;
        Ok((create_router(AppState::new(service.clone())), service))
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&json)?)
            }
            None => Body::empty(),
        };

        let response = app.clone().oneshot(builder.body(body)?).await?;
        let status = response.status();
        let bytes = response.into_body().collect().await?.to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, value))
    }

    async fn create(app: &Router, parent: Value, kind: &str, label: &str) -> Result<Value> {
        let (status, node) = send(
            app,
            "POST",
            "/api/nodes",
            Some(json!({
                "parentId": parent,
                "kind": kind,
                "label": label,
                "labelZh": format!("{}-中文", label),
            })),
        )
        .await?;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", node);
        Ok(node)
    }

    fn id(node: &Value) -> String {
        node["id"].as_str().unwrap_or_default().to_string()
    }

    #[tokio::test]
    async fn test_health() -> Result<()> {
        let (app, _) = create_app()?;
        let (status, body) = send(&app, "GET", "/api/health", None).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        Ok(())
    }

    #[tokio::test]
    async fn test_create_and_fetch_tree() -> Result<()> {
        let (app, _) = create_app()?;
        let folder = create(&app, json!("root"), "folder", "Billing").await?;
        let module = create(&app, json!(id(&folder)), "module", "Invoices").await?;

        assert_eq!(folder["parentId"], Value::Null);
        assert_eq!(folder["key"], "billing");
        assert_eq!(module["sortOrder"], 0);
        assert_eq!(module["status"], "draft");

        let (status, tree) = send(&app, "GET", "/api/tree", None).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(tree[0]["id"], folder["id"]);
        assert_eq!(tree[0]["children"][0]["id"], module["id"]);
        assert_eq!(tree[0]["children"][0]["children"], json!([]));
        Ok(())
    }

    #[tokio::test]
    async fn test_move_scenario_over_http() -> Result<()> {
        let (app, _) = create_app()?;
        let f1 = create(&app, Value::Null, "folder", "F1").await?;
        let m1 = create(&app, json!(id(&f1)), "module", "M1").await?;
        let m2 = create(&app, json!(id(&f1)), "module", "M2").await?;

        let (status, body) = send(
            &app,
            "POST",
            "/api/tree/move",
            Some(json!({
                "id": id(&m1),
                "targetParentId": id(&f1),
                "position": "after",
                "anchorSiblingId": id(&m2),
            })),
        )
        .await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let (_, m1) = send(&app, "GET", &format!("/api/nodes/{}", id(&m1)), None).await?;
        let (_, m2) = send(&app, "GET", &format!("/api/nodes/{}", id(&m2)), None).await?;
        assert_eq!(m2["sortOrder"], 0);
        assert_eq!(m1["sortOrder"], 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_reorder_over_http() -> Result<()> {
        let (app, _) = create_app()?;
        let f1 = create(&app, Value::Null, "folder", "F1").await?;
        let m1 = create(&app, json!(id(&f1)), "module", "M1").await?;
        let m2 = create(&app, json!(id(&f1)), "module", "M2").await?;

        let (status, _) = send(
            &app,
            "POST",
            "/api/tree/reorder",
            Some(json!({"parentId": id(&f1), "orderedIds": [id(&m2), id(&m1)]})),
        )
        .await?;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &app,
            "POST",
            "/api/tree/reorder",
            Some(json!({"parentId": id(&f1), "orderedIds": [id(&m2)]})),
        )
        .await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_REQUEST");
        Ok(())
    }

    #[tokio::test]
    async fn test_cycle_is_conflict_and_tree_unchanged() -> Result<()> {
        let (app, _) = create_app()?;
        let a = create(&app, Value::Null, "folder", "A").await?;
        let b = create(&app, json!(id(&a)), "folder", "B").await?;
        let (_, before) = send(&app, "GET", "/api/tree", None).await?;

        let (status, body) = send(
            &app,
            "POST",
            "/api/tree/move",
            Some(json!({"id": id(&a), "targetParentId": id(&b), "position": "into"})),
        )
        .await?;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CYCLE_DETECTED");

        let (_, after) = send(&app, "GET", "/api/tree", None).await?;
        assert_eq!(before, after);
        Ok(())
    }

    #[tokio::test]
    async fn test_error_statuses() -> Result<()> {
        let (app, _) = create_app()?;
        let module = create(&app, Value::Null, "module", "Leaf").await?;

        let (status, body) = send(&app, "GET", "/api/nodes/missing", None).await?;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NODE_NOT_FOUND");

        let (status, body) = send(
            &app,
            "POST",
            "/api/nodes",
            Some(json!({"parentId": id(&module), "kind": "module", "label": "x", "labelZh": "x"})),
        )
        .await?;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "INVALID_PARENT");

        let (status, body) = send(
            &app,
            "POST",
            "/api/nodes",
            Some(json!({"parentId": null, "kind": "module", "label": " ", "labelZh": "x"})),
        )
        .await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, body) = send(
            &app,
            "POST",
            "/api/nodes",
            Some(json!({"kind": "widget", "label": "x", "labelZh": "x"})),
        )
        .await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        Ok(())
    }

    #[tokio::test]
    async fn test_patch_and_cascade_delete() -> Result<()> {
        let (app, _) = create_app()?;
        let folder = create(&app, Value::Null, "folder", "Docs").await?;
        let child = create(&app, json!(id(&folder)), "module", "Intro").await?;

        let (status, updated) = send(
            &app,
            "PATCH",
            &format!("/api/nodes/{}", id(&child)),
            Some(json!({"label": "Overview", "status": "ready", "description": null})),
        )
        .await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["label"], "Overview");
        assert_eq!(updated["status"], "ready");
        assert_eq!(updated["key"], "intro");

        let (status, result) =
            send(&app, "DELETE", &format!("/api/nodes/{}", id(&folder)), None).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(result["deletedIds"], json!([id(&folder), id(&child)]));

        let (status, _) = send(&app, "GET", &format!("/api/nodes/{}", id(&child)), None).await?;
        assert_eq!(status, StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn test_drop_resolves_intent() -> Result<()> {
        let (app, _) = create_app()?;
        let target = create(&app, Value::Null, "folder", "Target").await?;
        let dragged = create(&app, Value::Null, "module", "Dragged").await?;

        let (status, body) = send(
            &app,
            "POST",
            "/api/tree/drop",
            Some(json!({
                "draggedId": id(&dragged),
                "targetId": id(&target),
                "offsetY": 50.0,
                "rowHeight": 100.0,
            })),
        )
        .await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["intent"], "into");

        let (_, node) = send(&app, "GET", &format!("/api/nodes/{}", id(&dragged)), None).await?;
        assert_eq!(node["parentId"], target["id"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_sort_root_children() -> Result<()> {
        let (app, _) = create_app()?;
        let zeta = create(&app, Value::Null, "folder", "zeta").await?;
        let alpha = create(&app, Value::Null, "folder", "Alpha").await?;

        let (status, body) = send(&app, "POST", "/api/tree/root/sort", None).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["id"], alpha["id"]);
        assert_eq!(body[1]["id"], zeta["id"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_validate_endpoint() -> Result<()> {
        let (app, _) = create_app()?;
        create(&app, Value::Null, "folder", "Clean").await?;

        let (status, body) = send(&app, "GET", "/api/tree/validate", None).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid"], true);
        assert_eq!(body["violations"], json!([]));
        Ok(())
    }

    #[tokio::test]
    async fn test_actor_headers_reach_audit() -> Result<()> {
        let (sink, mut records) = ChannelAuditSink::new();
        let service = TreeService::new(Arc::new(MemoryStore::new()), TreeConfig::default())?
            .with_audit_sink(Arc::new(sink));
        let app = create_router(AppState::new(service));

        let request = Request::builder()
            .method("POST")
            .uri("/api/nodes")
            .header("content-type", "application/json")
            .header("x-actor-id", "u-42")
            .header("x-actor-name", "Lin")
            .body(Body::from(
                json!({"kind": "folder", "label": "Audited", "labelZh": "审计"}).to_string(),
            ))?;
        let response = app.oneshot(request).await?;
        assert_eq!(response.status(), StatusCode::CREATED);

        let record = timeout(Duration::from_secs(1), records.recv())
            .await?
            .expect("audit record should be sent");
        assert_eq!(record.actor_id, "u-42");
        assert_eq!(record.actor_name, "Lin");
        assert_eq!(record.operation, TreeOperation::AddNode);
        Ok(())
    }
}
