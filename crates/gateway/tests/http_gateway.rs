use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use gateway::{Credentials, GatewayError, HttpGateway, LearningApi};
use learn_core::model::{
    DifficultyLevel, LoginRequest, NewTopic, Percent, ProgressUpdate, TopicId, UserId,
};
use serde_json::{Value, json};

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == "Bearer good-token")
}

async fn list_topics(headers: HeaderMap) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"msg": "Token has expired"})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({"topics": [{
            "id": 1,
            "title": "Rust ownership",
            "description": "",
            "difficulty_level": "intermediate",
            "created_at": "2024-05-01T10:20:30.123456",
            "progress": {"completion_percentage": 50.0, "quiz_score": 80.0, "time_spent": 10}
        }]})),
    )
}

async fn create_topic() -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": "Error creating topic: model unavailable"})),
    )
}

async fn get_topic(Path(id): Path<String>) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("no topic {id}"))
}

async fn login() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": "Invalid username or password"})),
    )
}

async fn update_progress(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body.get("topic_id").is_none() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Topic ID is required"})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({"message": "Progress updated successfully"})),
    )
}

async fn get_progress(Path(user): Path<String>) -> Json<Value> {
    Json(json!({"progress": [{
        "topic_id": 1,
        "topic_title": format!("owned by {user}"),
        "completion_percentage": 50.0,
        "quiz_score": 80.0,
        "time_spent": 10,
        "last_accessed": "2024-05-01T10:20:30"
    }]}))
}

async fn spawn_server() -> String {
    let app = Router::new()
        .route("/api/topics", get(list_topics).post(create_topic))
        .route("/api/topics/{id}", get(get_topic))
        .route("/api/auth/login", post(login))
        .route("/api/progress/update", post(update_progress))
        .route("/api/progress/{user}", get(get_progress));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve test app");
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn attaches_bearer_token_and_unwraps_envelope() {
    let base = spawn_server().await;
    let gateway = HttpGateway::new(&base, Credentials::with_token("good-token")).unwrap();

    let topics = gateway.list_topics().await.expect("list topics");

    assert_eq!(topics.len(), 1);
    assert_eq!(topics[0].title, "Rust ownership");
    assert_eq!(topics[0].difficulty_level, DifficultyLevel::Intermediate);
    assert_eq!(topics[0].completion(), Some(Percent::new(50.0).unwrap()));
}

#[tokio::test]
async fn unauthorized_discards_credential_and_signals_expiry() {
    let base = spawn_server().await;
    let credentials = Credentials::with_token("stale-token");
    let gateway = HttpGateway::new(&base, credentials.clone()).unwrap();

    let err = gateway.list_topics().await.unwrap_err();

    assert!(matches!(err, GatewayError::AuthExpired));
    assert!(!credentials.is_present());
}

#[tokio::test]
async fn server_error_message_becomes_remote_error() {
    let base = spawn_server().await;
    let gateway = HttpGateway::new(&base, Credentials::new()).unwrap();

    let err = gateway
        .create_topic(&NewTopic::new("Rust ownership", DifficultyLevel::Intermediate))
        .await
        .unwrap_err();

    match err {
        GatewayError::Remote(remote) => {
            assert_eq!(remote.status, Some(500));
            assert_eq!(
                remote.message.as_deref(),
                Some("Error creating topic: model unavailable")
            );
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn non_json_error_body_has_no_message() {
    let base = spawn_server().await;
    let gateway = HttpGateway::new(&base, Credentials::new()).unwrap();

    let err = gateway.get_topic(&TopicId::from(99)).await.unwrap_err();

    match err {
        GatewayError::Remote(remote) => {
            assert_eq!(remote.status, Some(404));
            assert_eq!(remote.message, None);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn failed_login_is_reported_without_touching_credentials() {
    let base = spawn_server().await;
    let credentials = Credentials::with_token("previous");
    let gateway = HttpGateway::new(&base, credentials.clone()).unwrap();

    let err = gateway
        .login(&LoginRequest {
            username: "ada".into(),
            password: "wrong".into(),
        })
        .await
        .unwrap_err();

    match err {
        GatewayError::Remote(remote) => {
            assert_eq!(remote.message.as_deref(), Some("Invalid username or password"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(credentials.token().as_deref(), Some("previous"));
}

#[tokio::test]
async fn progress_update_echoes_the_accepted_update() {
    let base = spawn_server().await;
    let gateway = HttpGateway::new(&base, Credentials::new()).unwrap();
    let update = ProgressUpdate::for_topic(TopicId::from(1)).completion(Percent::FULL);

    let accepted = gateway.update_progress(&update).await.expect("update");

    assert_eq!(accepted, update);
}

#[tokio::test]
async fn progress_is_fetched_per_user() {
    let base = spawn_server().await;
    let gateway = HttpGateway::new(&base, Credentials::new()).unwrap();

    let records = gateway.get_progress(&UserId::from(7)).await.expect("progress");

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].topic_title.as_deref(), Some("owned by 7"));
    assert_eq!(records[0].time_spent, 10);
}

#[tokio::test]
async fn unreachable_server_is_a_remote_error_without_message() {
    let gateway = HttpGateway::new("http://127.0.0.1:9", Credentials::new()).unwrap();

    let err = gateway.list_topics().await.unwrap_err();

    match err {
        GatewayError::Remote(remote) => assert_eq!(remote.message, None),
        other => panic!("unexpected error: {other:?}"),
    }
}
