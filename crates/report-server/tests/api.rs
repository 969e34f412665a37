//! HTTP API tests against a server on an ephemeral port.
//!
//! The server runs without a primary store, on a local snapshot in a
//! temporary directory.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use uuid::Uuid;

use report_server::{AppState, ServerConfig, routes};
use report_store::{FileKeyValueStore, LocalReports, ReportStore};

struct TestServer {
    base: String,
    http: Client,
    _dir: tempfile::TempDir,
}

impl TestServer {
    async fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let local = LocalReports::new(Arc::new(FileKeyValueStore::new(dir.path())), "cl-blocks");
        let state = AppState::new(ReportStore::local_only(local), ServerConfig::default());
        let app = routes::build_router(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://{addr}"),
            http: Client::new(),
            _dir: dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let response = self.http.get(self.url(path)).send().await.unwrap();
        let status = response.status();
        (status, response.json().await.unwrap())
    }

    async fn post(&self, path: &str, body: Value) -> Value {
        let response = self.http.post(self.url(path)).json(&body).send().await.unwrap();
        assert!(response.status().is_success(), "POST {path}: {}", response.status());
        response.json().await.unwrap()
    }

    async fn put_as(&self, client: Uuid, path: &str, body: Value) -> Value {
        let response = self
            .http
            .put(self.url(path))
            .header("x-client-id", client.to_string())
            .json(&body)
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success(), "PUT {path}: {}", response.status());
        response.json().await.unwrap()
    }

    async fn report(&self, id: &str) -> Value {
        let (status, body) = self.get(&format!("/reports/{id}")).await;
        assert_eq!(status, StatusCode::OK);
        body
    }
}

fn block_ids(report: &Value) -> Vec<String> {
    report["blocks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn health_reports_local_only_mode() {
    let server = TestServer::start().await;
    let (status, body) = server.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "primary": false}));
}

#[tokio::test]
async fn init_creates_samples_once() {
    let server = TestServer::start().await;

    let first = server.post("/reports/init", json!({})).await;
    assert_eq!(first["created"].as_array().unwrap().len(), 4);
    let second = server.post("/reports/init", json!({})).await;
    assert!(second["created"].as_array().unwrap().is_empty());

    let (_, list) = server.get("/reports").await;
    assert_eq!(list["reports"].as_array().unwrap().len(), 4);
    assert_eq!(list["groups"]["myReports"].as_array().unwrap().len(), 3);
    assert_eq!(list["groups"]["sharedWithMe"][0]["id"], "shared-1");
}

#[tokio::test]
async fn missing_report_is_a_json_404() {
    let server = TestServer::start().await;
    let (status, body) = server.get("/reports/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn block_operations_persist() {
    let server = TestServer::start().await;
    let writer = Uuid::new_v4();
    server
        .put_as(
            writer,
            "/reports/r1",
            json!({"id": "r1", "title": "Weekly", "blocks": [
                {"id": "a", "type": "text", "content": "intro"}
            ]}),
        )
        .await;

    let inserted = server
        .post("/reports/r1/blocks", json!({"kind": "table", "index": 1}))
        .await;
    assert_eq!(inserted["applied"], true);
    let table_id = inserted["created"][0].as_str().unwrap().to_string();

    let report = server.report("r1").await;
    let table = &report["blocks"][1];
    let width = table["data"]["headers"].as_array().unwrap().len();
    assert!(width >= 2);
    assert!(
        table["data"]["rows"]
            .as_array()
            .unwrap()
            .iter()
            .all(|row| row.as_array().unwrap().len() == width)
    );

    let converted = server
        .post(&format!("/reports/r1/blocks/{table_id}/convert"), json!({"to": "bar"}))
        .await;
    assert_eq!(converted["applied"], true);
    let report = server.report("r1").await;
    assert_eq!(report["blocks"][1]["type"], "chart");
    assert_eq!(report["blocks"][1]["chartType"], "bar");

    let split = server
        .put_as(
            writer,
            "/reports/r1/blocks/a",
            json!({"id": "a", "type": "text", "content": "---"}),
        )
        .await;
    assert_eq!(split["created"].as_array().unwrap().len(), 2);
    let report = server.report("r1").await;
    assert_eq!(report["blocks"][0]["content"], "");
    assert_eq!(report["blocks"][1]["type"], "separator");
    assert_eq!(report["blocks"].as_array().unwrap().len(), 4);

    let moved = server
        .post("/reports/r1/blocks/move", json!({"from": 3, "to": 0}))
        .await;
    assert_eq!(moved["applied"], true);
    assert_eq!(block_ids(&server.report("r1").await)[0], table_id);

    let response = server
        .http
        .delete(server.url(&format!("/reports/r1/blocks/{table_id}")))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    assert!(!block_ids(&server.report("r1").await).contains(&table_id));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_inserts_are_all_persisted() {
    let server = Arc::new(TestServer::start().await);
    server
        .put_as(Uuid::new_v4(), "/reports/r1", json!({"id": "r1", "title": "Busy"}))
        .await;

    let inserts: Vec<_> = (0..12)
        .map(|_| {
            let server = Arc::clone(&server);
            tokio::spawn(async move {
                server
                    .post("/reports/r1/blocks", json!({"kind": "text"}))
                    .await
            })
        })
        .collect();

    let mut created = Vec::new();
    for insert in inserts {
        let response = insert.await.unwrap();
        assert_eq!(response["applied"], true);
        created.push(response["created"][0].as_str().unwrap().to_string());
    }

    let persisted = block_ids(&server.report("r1").await);
    assert_eq!(persisted.len(), 12);
    for id in &created {
        assert!(persisted.contains(id), "block {id} was lost");
    }
}

#[tokio::test]
async fn read_only_reports_are_not_mutated() {
    let server = TestServer::start().await;
    server.post("/reports/init", json!({})).await;
    let before = server.report("shared-1").await;

    let inserted = server
        .post("/reports/shared-1/blocks", json!({"kind": "text"}))
        .await;
    assert_eq!(inserted, json!({"applied": false}));

    let response = server
        .http
        .delete(server.url("/reports/shared-1/blocks/1"))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["applied"], false);

    assert_eq!(server.report("shared-1").await["blocks"], before["blocks"]);
}

#[tokio::test]
async fn projection_filters_without_changing_the_report() {
    let server = TestServer::start().await;
    server
        .put_as(
            Uuid::new_v4(),
            "/reports/r1",
            json!({
                "id": "r1",
                "filters": {"timePeriod": "Last 4 weeks", "selectedDimensions": ["Jan"]},
                "blocks": [{
                    "id": "t", "type": "table", "title": "Revenue by time",
                    "data": {"headers": ["Time", "Revenue"], "rows": [["Jan", "1"], ["Feb", "2"]]}
                }]
            }),
        )
        .await;

    let (_, projected) = server.get("/reports/r1?projected=true").await;
    assert_eq!(projected["blocks"][0]["data"]["rows"], json!([["Jan", "1"]]));

    let stored = server.report("r1").await;
    assert_eq!(stored["blocks"][0]["data"]["rows"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn outline_lists_headings() {
    let server = TestServer::start().await;
    server
        .put_as(
            Uuid::new_v4(),
            "/reports/r1",
            json!({"id": "r1", "blocks": [
                {"id": "a", "type": "text", "content": "<h1>Summary</h1>"},
                {"id": "b", "type": "text", "content": "plain"},
                {"id": "c", "type": "text", "content": "<h2>Details</h2>"}
            ]}),
        )
        .await;

    let (_, outline) = server.get("/reports/r1/outline").await;
    let texts: Vec<&str> = outline
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, vec!["Summary", "Details"]);
}

#[tokio::test]
async fn events_skip_the_listeners_own_writes() {
    let server = TestServer::start().await;
    let me = Uuid::new_v4();
    let other = Uuid::new_v4();
    server
        .put_as(me, "/reports/r1", json!({"id": "r1", "title": "v1"}))
        .await;

    let mut events = server
        .http
        .get(server.url(&format!("/reports/r1/events?client={me}")))
        .send()
        .await
        .unwrap();
    assert_eq!(events.status(), StatusCode::OK);

    server
        .put_as(me, "/reports/r1", json!({"id": "r1", "title": "mine"}))
        .await;
    server
        .put_as(other, "/reports/r1", json!({"id": "r1", "title": "theirs"}))
        .await;

    let received = tokio::time::timeout(Duration::from_secs(5), async {
        let mut buffer = String::new();
        while let Some(chunk) = events.chunk().await.unwrap() {
            buffer.push_str(&String::from_utf8_lossy(&chunk));
            if buffer.contains("event: report") && buffer.contains("\n\n") {
                return buffer;
            }
        }
        buffer
    })
    .await
    .unwrap();

    assert!(received.contains("theirs"));
    assert!(!received.contains("mine"));
}
