use std::sync::Arc;

use ta_grader::error::ServiceError;
use ta_grader::relay::{router, RelayState, GENERATE_PATH};
use ta_grader::services::gateway::{ModelGateway, RelayErrorBody, RelayGateway, ScriptedGateway};
use ta_grader::{grade_all, ClassSession, RubricTable, Submission};

/// 在随机端口上启动中转服务，返回生成接口地址
async fn spawn_relay(state: RelayState) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    format!("http://{}{}", addr, GENERATE_PATH)
}

async fn error_body(response: reqwest::Response) -> String {
    response.json::<RelayErrorBody>().await.unwrap().error
}

#[tokio::test]
async fn forwards_prompt_and_returns_text() {
    let upstream = Arc::new(ScriptedGateway::new("fallback").reply_when("hello", "Content: (4) good"));
    let url = spawn_relay(RelayState::new(upstream.clone())).await;

    let client = RelayGateway::with_url(url, 5).unwrap();
    let text = client.generate("hello there").await.unwrap();

    assert_eq!(text, "Content: (4) good");
    assert_eq!(upstream.calls(), 1);
}

#[tokio::test]
async fn upstream_error_keeps_status_and_message() {
    let upstream = Arc::new(ScriptedGateway::new("unused").fail_when(
        "hello",
        ServiceError::Upstream {
            status: 503,
            message: "Model is loading".to_string(),
        },
    ));
    let url = spawn_relay(RelayState::new(upstream)).await;

    let err = RelayGateway::with_url(url, 5)
        .unwrap()
        .generate("hello")
        .await
        .unwrap_err();

    match err {
        ServiceError::Upstream { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "Model is loading");
        }
        other => panic!("意外的错误: {:?}", other),
    }
}

#[tokio::test]
async fn bad_prompt_is_rejected_with_400() {
    let upstream = Arc::new(ScriptedGateway::new("unused"));
    let url = spawn_relay(RelayState::new(upstream.clone())).await;
    let http = reqwest::Client::new();

    let response = http
        .post(&url)
        .json(&serde_json::json!({ "prompt": 42 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(error_body(response).await, "Missing or invalid prompt");

    let err = RelayGateway::with_url(url, 5)
        .unwrap()
        .generate("")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));

    assert_eq!(upstream.calls(), 0);
}

#[tokio::test]
async fn invalid_json_is_rejected_with_400() {
    let url = spawn_relay(RelayState::new(Arc::new(ScriptedGateway::new("unused")))).await;

    let response = reqwest::Client::new()
        .post(&url)
        .header("Content-Type", "application/json")
        .body("{oops")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(error_body(response).await, "Invalid JSON body");
}

#[tokio::test]
async fn missing_token_is_a_server_configuration_error() {
    let url = spawn_relay(RelayState::unconfigured()).await;

    let err = RelayGateway::with_url(url, 5)
        .unwrap()
        .generate("hello")
        .await
        .unwrap_err();

    match err {
        ServiceError::Upstream { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "Server configuration error: HF_ACCESS_TOKEN missing");
        }
        other => panic!("意外的错误: {:?}", other),
    }
}

#[tokio::test]
async fn other_methods_get_405() {
    let url = spawn_relay(RelayState::new(Arc::new(ScriptedGateway::new("unused")))).await;

    let response = reqwest::Client::new().get(&url).send().await.unwrap();

    assert_eq!(response.status().as_u16(), 405);
    assert_eq!(error_body(response).await, "Method not allowed");
}

#[tokio::test]
async fn batch_grading_through_the_relay() {
    let upstream = Arc::new(
        ScriptedGateway::new("Content: (2) weak; \"\"\"Thin argument.\"\"\"; pretty confident")
            .fail_when(
                "essay by bob",
                ServiceError::Upstream {
                    status: 429,
                    message: "Rate limit reached".to_string(),
                },
            ),
    );
    let url = spawn_relay(RelayState::new(upstream)).await;
    let gateway = Arc::new(RelayGateway::with_url(url, 5).unwrap());

    let session = ClassSession::new("ENG 200", RubricTable::parse("Content\n(5) strong").unwrap());
    let outcome = grade_all(
        &session,
        gateway,
        vec![
            Submission::new("alice.txt", "essay by alice"),
            Submission::new("bob.txt", "essay by bob"),
        ],
        2,
    )
    .await;

    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.summary.entries[0].submission_id, "alice.txt");
    assert_eq!(outcome.summary.entries[0].score, "2");
    assert_eq!(outcome.pending[0].submission_id, "bob.txt");
    assert!(outcome.pending[0].reason.contains("Rate limit reached"));
}
