//! Ollama client tests against a mock HTTP server.

use knowpilot_core::LlmError;
use knowpilot_llm::{GenerationOptions, GenerationProvider, OllamaGenerationProvider};
use mockito::Matcher;
use serde_json::json;
use std::io::Write;
use std::time::Duration;

fn ndjson(fragments: &[(&str, bool)]) -> String {
    fragments
        .iter()
        .map(|(text, done)| json!({ "response": text, "done": done }).to_string() + "\n")
        .collect()
}

#[tokio::test]
async fn test_generate_streams_and_trims_response() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/generate")
        .match_body(Matcher::PartialJson(json!({
            "model": "llama3.2",
            "prompt": "Explain fog",
            "max_tokens": 200,
            "stream": true,
            "options": { "num_predict": 200 }
        })))
        .with_status(200)
        .with_header("content-type", "application/x-ndjson")
        .with_body(ndjson(&[
            ("  Question: What is fog?", false),
            ("\nAnswer: A cloud at ground level.  ", false),
            ("", true),
        ]))
        .create_async()
        .await;

    let provider = OllamaGenerationProvider::new(server.url(), "llama3.2");
    let text = provider
        .generate("Explain fog", &GenerationOptions::new(0.1, 200))
        .await
        .unwrap();

    assert_eq!(text, "Question: What is fog?\nAnswer: A cloud at ground level.");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_generate_uses_model_override() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/generate")
        .match_body(Matcher::PartialJson(json!({ "model": "mistral" })))
        .with_status(200)
        .with_body(ndjson(&[("ok", true)]))
        .create_async()
        .await;

    let provider = OllamaGenerationProvider::new(server.url(), "llama3.2");
    let options = GenerationOptions::default().with_model("mistral");
    assert_eq!(provider.generate("p", &options).await.unwrap(), "ok");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_generate_stops_at_done_fragment() {
    let mut server = mockito::Server::new_async().await;
    let body = ndjson(&[("first", false), (" last", true)]) + "this is not json\n";
    server
        .mock("POST", "/api/generate")
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let provider = OllamaGenerationProvider::new(server.url(), "llama3.2");
    let text = provider
        .generate("p", &GenerationOptions::default())
        .await
        .unwrap();
    assert_eq!(text, "first last");
}

#[tokio::test]
async fn test_generate_maps_error_status() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/generate")
        .with_status(500)
        .with_body("model crashed")
        .create_async()
        .await;

    let provider = OllamaGenerationProvider::new(server.url(), "llama3.2");
    let err = provider
        .generate("p", &GenerationOptions::default())
        .await
        .unwrap_err();

    match err {
        LlmError::RequestFailed {
            provider,
            status,
            message,
        } => {
            assert_eq!(provider, "ollama");
            assert_eq!(status, 500);
            assert_eq!(message, "model crashed");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_generate_rejects_malformed_fragment() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/generate")
        .with_status(200)
        .with_body("{\"response\":\"partial\"\n")
        .create_async()
        .await;

    let provider = OllamaGenerationProvider::new(server.url(), "llama3.2");
    let err = provider
        .generate("p", &GenerationOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::InvalidResponse { .. }));
}

#[tokio::test]
async fn test_generate_connection_failure_has_status_zero() {
    let provider = OllamaGenerationProvider::new("http://127.0.0.1:1", "llama3.2")
        .with_timeout(Duration::from_secs(5));
    let err = provider
        .generate("p", &GenerationOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::RequestFailed { status: 0, .. }));
}

#[tokio::test]
async fn test_generate_times_out_on_slow_stream() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/generate")
        .with_status(200)
        .with_chunked_body(|w| {
            w.write_all(b"{\"response\":\"slow\",\"done\":false}\n")?;
            std::thread::sleep(Duration::from_secs(2));
            w.write_all(b"{\"response\":\"\",\"done\":true}\n")
        })
        .create_async()
        .await;

    let provider = OllamaGenerationProvider::new(server.url(), "llama3.2")
        .with_timeout(Duration::from_millis(300));
    let err = provider
        .generate("p", &GenerationOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::Timeout { .. }));
}

#[tokio::test]
async fn test_check_model_available() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/tags")
        .with_status(200)
        .with_body(r#"{"models":[{"name":"llama3.2:latest"},{"name":"nomic-embed-text"}]}"#)
        .create_async()
        .await;

    let present = OllamaGenerationProvider::new(server.url(), "llama3.2");
    assert!(present.check_model_available().await.unwrap());

    let missing = OllamaGenerationProvider::new(server.url(), "mistral");
    assert!(!missing.check_model_available().await.unwrap());
}
