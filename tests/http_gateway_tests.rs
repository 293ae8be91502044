// Runs HttpEntityGateway against an axum stub of the REST backend.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use rstest::{fixture, rstest};
use sales_groups::modules::groups::adapters::outbound::gateway::{EntityGateway, GatewayError};
use sales_groups::modules::groups::adapters::outbound::gateway_http::HttpEntityGateway;
use sales_groups::modules::groups::core::directory::UserRole;
use sales_groups::modules::groups::core::group::MemberStatus;
use sales_groups::modules::groups::core::patch::{NewGroup, TeamPayload, create_payload};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
struct Received {
    method: &'static str,
    path: String,
    query: HashMap<String, String>,
    body: Option<Value>,
}

type Log = Arc<Mutex<Vec<Received>>>;

fn record(log: &Log, method: &'static str, path: String, query: HashMap<String, String>, body: Option<Value>) {
    log.lock().unwrap().push(Received {
        method,
        path,
        query,
        body,
    });
}

async fn list_teams(State(log): State<Log>, Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    record(&log, "GET", "/teams".into(), query, None);
    Json(json!({
        "content": [{
            "id": "team-a",
            "name": "Equipe A",
            "code": "equipe-a",
            "description": null,
            "monthlyQuota": 10000.0,
            "managerId": "u-1",
            "active": true,
            "sellers": ["s-1", "s-2"],
            "region": "north"
        }],
        "totalElements": 1
    }))
}

async fn list_users(State(log): State<Log>, Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    record(&log, "GET", "/users".into(), query, None);
    Json(json!([
        { "id": "u-1", "fullName": "Marta Manager", "groups": [{ "name": "Gerentes" }] },
        { "id": "u-2", "name": "Sergio Seller", "role": "SELLER" }
    ]))
}

async fn list_sellers(State(log): State<Log>, Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    record(&log, "GET", "/sellers".into(), query, None);
    Json(json!([
        { "id": "s-1", "name": "Ana", "monthlySales": 1800.0, "status": "active" },
        { "id": "s-2", "name": "Bruno", "sales": 1200.0, "status": "on-leave" }
    ]))
}

async fn create_team(State(log): State<Log>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    record(&log, "POST", "/teams".into(), HashMap::new(), Some(body.clone()));
    let mut created = body;
    created["id"] = json!("team-new");
    (StatusCode::CREATED, Json(created))
}

async fn update_team(
    State(log): State<Log>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    record(&log, "PUT", format!("/teams/{id}"), HashMap::new(), Some(body.clone()));
    match id.as_str() {
        "missing" => StatusCode::NOT_FOUND.into_response(),
        "broken" => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        "silent" => StatusCode::NO_CONTENT.into_response(),
        _ => {
            let mut updated = body;
            updated["id"] = json!(id);
            Json(updated).into_response()
        }
    }
}

async fn delete_team(State(log): State<Log>, Path(id): Path<String>) -> StatusCode {
    record(&log, "DELETE", format!("/teams/{id}"), HashMap::new(), None);
    if id == "missing" {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::NO_CONTENT
    }
}

struct Stub {
    gateway: HttpEntityGateway,
    log: Log,
}

impl Stub {
    fn received(&self) -> Vec<Received> {
        self.log.lock().unwrap().clone()
    }
}

#[fixture]
async fn stub() -> Stub {
    let log: Log = Arc::default();
    let app = Router::new()
        .route("/api/teams", get(list_teams).post(create_team))
        .route("/api/teams/{id}", put(update_team).delete(delete_team))
        .route("/api/users", get(list_users))
        .route("/api/sellers", get(list_sellers))
        .with_state(log.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let gateway =
        HttpEntityGateway::new(&format!("http://{addr}/api/"), 500, Duration::from_secs(5)).unwrap();
    Stub { gateway, log }
}

fn payload_for(id: &str) -> TeamPayload {
    let mut payload = create_payload(&NewGroup::named("Equipe A").monthly_quota(10_000.0)).unwrap();
    payload.sellers = vec!["s-1".into(), "s-3".into()];
    payload.extra.insert("region".into(), json!(id));
    payload
}

#[rstest]
#[tokio::test]
async fn it_should_read_all_three_collections_with_one_large_page(#[future] stub: Stub) {
    let stub = stub.await;

    let teams = stub.gateway.list_teams().await.unwrap();
    let users = stub.gateway.list_users().await.unwrap();
    let sellers = stub.gateway.list_sellers().await.unwrap();

    assert_eq!(teams.len(), 1);
    assert_eq!(teams[0].sellers, vec!["s-1", "s-2"]);
    assert_eq!(teams[0].extra.get("region"), Some(&json!("north")));
    assert_eq!(users[0].name, "Marta Manager");
    assert_eq!(users[0].role, UserRole::Manager);
    assert_eq!(users[1].role, UserRole::Seller);
    assert_eq!(sellers[1].sales, 1200.0);
    assert_eq!(sellers[1].status, MemberStatus::OnLeave);

    for received in stub.received() {
        assert_eq!(received.query.get("page").map(String::as_str), Some("0"));
        assert_eq!(received.query.get("size").map(String::as_str), Some("500"));
    }
}

#[rstest]
#[tokio::test]
async fn it_should_post_a_new_team_with_camel_case_fields(#[future] stub: Stub) {
    let stub = stub.await;
    let payload = create_payload(&NewGroup::named("Equipe Norte").monthly_quota(1000.0)).unwrap();

    let created = stub.gateway.create_team(&payload).await.unwrap();

    assert_eq!(created.id, "team-new");
    assert_eq!(created.code, "equipe-norte");
    let body = stub.received()[0].body.clone().unwrap();
    assert_eq!(body["code"], json!("equipe-norte"));
    assert_eq!(body["monthlyQuota"], json!(1000.0));
    assert_eq!(body["managerId"], json!(null));
    assert_eq!(body["sellers"], json!([]));
}

#[rstest]
#[tokio::test]
async fn it_should_put_the_complete_membership_list(#[future] stub: Stub) {
    let stub = stub.await;

    let updated = stub.gateway.update_team("team-a", &payload_for("team-a")).await.unwrap();

    assert_eq!(updated.id, "team-a");
    assert_eq!(updated.sellers, vec!["s-1", "s-3"]);
    let received = &stub.received()[0];
    assert_eq!(received.path, "/teams/team-a");
    assert_eq!(received.body.as_ref().unwrap()["sellers"], json!(["s-1", "s-3"]));
    assert_eq!(received.body.as_ref().unwrap()["region"], json!("team-a"));
}

#[rstest]
#[tokio::test]
async fn it_should_fall_back_to_the_payload_when_an_update_has_no_body(#[future] stub: Stub) {
    let stub = stub.await;

    let updated = stub.gateway.update_team("silent", &payload_for("silent")).await.unwrap();

    assert_eq!(updated.id, "silent");
    assert_eq!(updated.name, "Equipe A");
    assert_eq!(updated.sellers, vec!["s-1", "s-3"]);
}

#[rstest]
#[tokio::test]
async fn it_should_map_error_statuses(#[future] stub: Stub) {
    let stub = stub.await;

    let missing = stub.gateway.update_team("missing", &payload_for("missing")).await;
    let broken = stub.gateway.update_team("broken", &payload_for("broken")).await;

    assert!(matches!(missing, Err(GatewayError::NotFound(_))));
    match broken {
        Err(GatewayError::Status { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[rstest]
#[tokio::test]
async fn it_should_delete_teams(#[future] stub: Stub) {
    let stub = stub.await;

    stub.gateway.delete_team("team-a").await.unwrap();
    let missing = stub.gateway.delete_team("missing").await;

    assert!(matches!(missing, Err(GatewayError::NotFound(_))));
    let methods: Vec<&str> = stub.received().iter().map(|r| r.method).collect();
    assert_eq!(methods, vec!["DELETE", "DELETE"]);
}

#[rstest]
#[tokio::test]
async fn it_should_report_an_unreachable_backend_as_an_http_error() {
    let gateway =
        HttpEntityGateway::new("http://127.0.0.1:1/api", 10, Duration::from_millis(500)).unwrap();

    let result = gateway.list_teams().await;

    assert!(matches!(result, Err(GatewayError::Http(_))));
}
