use anyhow::Result;
use httpmock::prelude::*;
use pokedex_backend::config::toml_config::TomlConfig;
use pokedex_backend::domain::ports::RecognitionConfig;
use pokedex_backend::{build_router, AppState, GeminiClient, RecognitionEngine};
use std::net::SocketAddr;
use std::time::Duration;

/// 端到端識別流程測試：真實 HTTP 伺服器 + mock 的 Gemini 端點

fn test_config(endpoint: &str) -> TomlConfig {
    TomlConfig::from_toml_str(&format!(
        r#"
[server]
max_upload_mb = 8

[recognition]
endpoint = "{}"
api_key = "test-key"
timeout_seconds = 5
retry_delay_seconds = 0
"#,
        endpoint
    ))
    .unwrap()
}

async fn spawn_app(config: TomlConfig) -> Result<SocketAddr> {
    let client = GeminiClient::new(&config);
    let engine = RecognitionEngine::with_retry_policy(
        client,
        config.retry_attempts(),
        Duration::from_secs(config.retry_delay_seconds()),
    );
    let router = build_router(AppState::new(engine), config.max_upload_bytes());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(addr)
}

async fn post_picture(addr: SocketAddr, bytes: Vec<u8>) -> Result<reqwest::Response> {
    let part = reqwest::multipart::Part::bytes(bytes)
        .file_name("mon.jpg")
        .mime_str("image/jpeg")?;
    let form = reqwest::multipart::Form::new().part("mon", part);
    let response = reqwest::Client::new()
        .post(format!("http://{}/pokedex", addr))
        .multipart(form)
        .send()
        .await?;
    Ok(response)
}

fn gemini_reply(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{"content": {"parts": [{"text": text}]}}]
    })
}

fn uploaded_file(uri: &str) -> serde_json::Value {
    serde_json::json!({"file": {"uri": uri, "mimeType": "image/jpeg"}})
}

#[tokio::test]
async fn test_valid_reply_round_trips_unchanged() -> Result<()> {
    let server = MockServer::start();

    let upload_mock = server.mock(|when, then| {
        when.method(POST).path("/upload/v1beta/files");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(uploaded_file("https://files.example/v1beta/files/abc"));
    });
    let generate_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1beta/models/gemini-2.0-flash:generateContent");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(gemini_reply(r#"[{"name":"pikachu","dexNumber":"25"}]"#));
    });

    let addr = spawn_app(test_config(&server.base_url())).await?;
    let response = post_picture(addr, b"fake-jpeg".to_vec()).await?;

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(
        body,
        serde_json::json!({"success": true, "message": [{"name": "pikachu", "dexNumber": "25"}]})
    );

    // 第一次就成功，不應該有重試
    upload_mock.assert_hits(1);
    generate_mock.assert_hits(1);
    Ok(())
}

#[tokio::test]
async fn test_unusable_replies_exhaust_the_attempt_budget() -> Result<()> {
    let server = MockServer::start();

    let upload_mock = server.mock(|when, then| {
        when.method(POST).path("/upload/v1beta/files");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(uploaded_file("https://files.example/v1beta/files/abc"));
    });
    let generate_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1beta/models/gemini-2.0-flash:generateContent");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(gemini_reply("the model rambled instead of answering"));
    });

    let addr = spawn_app(test_config(&server.base_url())).await?;
    let response = post_picture(addr, b"fake-jpeg".to_vec()).await?;

    assert_eq!(response.status().as_u16(), 500);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(
        body,
        serde_json::json!({
            "success": false,
            "message": "Failed to identify Pokémon after multiple attempts"
        })
    );

    // 每次嘗試都重新上傳再生成，總共三次
    upload_mock.assert_hits(3);
    generate_mock.assert_hits(3);
    Ok(())
}

#[tokio::test]
async fn test_provider_outage_consumes_attempts_without_generating() -> Result<()> {
    let server = MockServer::start();

    let upload_mock = server.mock(|when, then| {
        when.method(POST).path("/upload/v1beta/files");
        then.status(500);
    });
    let generate_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1beta/models/gemini-2.0-flash:generateContent");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(gemini_reply("[]"));
    });

    let addr = spawn_app(test_config(&server.base_url())).await?;
    let response = post_picture(addr, b"fake-jpeg".to_vec()).await?;

    assert_eq!(response.status().as_u16(), 500);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["success"], false);
    assert_eq!(
        body["message"],
        "Failed to identify Pokémon after multiple attempts"
    );

    upload_mock.assert_hits(3);
    generate_mock.assert_hits(0);
    Ok(())
}

#[tokio::test]
async fn test_sentinel_reply_is_a_normal_success() -> Result<()> {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST).path("/upload/v1beta/files");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(uploaded_file("https://files.example/v1beta/files/abc"));
    });
    let generate_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1beta/models/gemini-2.0-flash:generateContent");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(gemini_reply(
                r#"[{"name":"undefined","dexNumber":"undefined"}]"#,
            ));
    });

    let addr = spawn_app(test_config(&server.base_url())).await?;
    let response = post_picture(addr, b"fake-jpeg".to_vec()).await?;

    // 「查無此寶可夢」哨兵值也算有效回應，交給客戶端處理
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(
        body,
        serde_json::json!({
            "success": true,
            "message": [{"name": "undefined", "dexNumber": "undefined"}]
        })
    );
    generate_mock.assert_hits(1);
    Ok(())
}

#[tokio::test]
async fn test_multiple_candidates_keep_their_order() -> Result<()> {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST).path("/upload/v1beta/files");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(uploaded_file("https://files.example/v1beta/files/abc"));
    });
    server.mock(|when, then| {
        when.method(POST)
            .path("/v1beta/models/gemini-2.0-flash:generateContent");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(gemini_reply(
                r#"[{"name":"vaporeon","dexNumber":"134"},{"name":"lapras","dexNumber":"131"}]"#,
            ));
    });

    let addr = spawn_app(test_config(&server.base_url())).await?;
    let response = post_picture(addr, b"fake-jpeg".to_vec()).await?;

    let body: serde_json::Value = response.json().await?;
    assert_eq!(
        body["message"],
        serde_json::json!([
            {"name": "vaporeon", "dexNumber": "134"},
            {"name": "lapras", "dexNumber": "131"}
        ])
    );
    Ok(())
}

/// 十個並發請求，每個都要拿到自己那張圖的結果
#[tokio::test]
async fn test_concurrent_requests_keep_replies_separate() -> Result<()> {
    let server = MockServer::start();

    for i in 0..10 {
        let capture = format!("capture-{}", i);
        let uri = format!("https://files.example/v1beta/files/mon-{}", i);
        server.mock(|when, then| {
            when.method(POST)
                .path("/upload/v1beta/files")
                .body(capture.as_str());
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(uploaded_file(&uri));
        });
        server.mock(|when, then| {
            when.method(POST)
                .path("/v1beta/models/gemini-2.0-flash:generateContent")
                .body_contains(format!("files/mon-{}", i));
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(gemini_reply(&format!(
                    r#"[{{"name":"mon-{}","dexNumber":"{}"}}]"#,
                    i, i
                )));
        });
    }

    let addr = spawn_app(test_config(&server.base_url())).await?;

    let mut handles = Vec::new();
    for i in 0..10 {
        handles.push(tokio::spawn(async move {
            let response = post_picture(addr, format!("capture-{}", i).into_bytes()).await?;
            let body: serde_json::Value = response.json().await?;
            anyhow::Ok((i, body))
        }));
    }

    for handle in handles {
        let (i, body) = handle.await??;
        assert_eq!(body["success"], true);
        assert_eq!(body["message"][0]["name"], format!("mon-{}", i));
        assert_eq!(body["message"][0]["dexNumber"], i.to_string());
    }

    println!("✅ 10 concurrent captures resolved without cross-talk");
    Ok(())
}
