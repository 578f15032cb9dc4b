use assert_cmd::Command;
use modstack_relay::api::webhook::compute_signature;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: &str = "modstack_wp_0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

/// Binary with an isolated config dir and no ambient ModStack settings
fn cli(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("modstack-cli").expect("binary builds");
    cmd.env_remove("MODSTACK_API_URL")
        .env("MODSTACK_API_KEY", KEY)
        .arg("--config-dir")
        .arg(config_dir.path());
    cmd
}

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("test-connection"))
        .stdout(predicate::str::contains("embed"))
        .stdout(predicate::str::contains("webhook"));
}

#[test]
fn test_embed_url_for_chat_widget() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args(["embed", "url", "--kind", "chat", "--id", "bot-1"])
        .args(["--origin", "https://site.example"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("https://api.modstack.ai/embed/chat?"))
        .stdout(predicate::str::contains("modbot_id=bot-1"))
        .stdout(predicate::str::contains("embedded=true"));
}

#[test]
fn test_embed_url_respects_api_url_flag() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args(["embed", "url", "--kind", "form", "--id", "f-2"])
        .args(["--api-url", "http://localhost:4000"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("http://localhost:4000/"))
        .stdout(predicate::str::contains("f-2"));
}

#[test]
fn test_embed_preview_requires_id() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args(["embed", "preview", "--kind", "chat", "--id", ""])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Modbot ID is required"));
}

#[test]
fn test_embed_preview_open_posts_to_api_origin() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args(["embed", "preview", "--kind", "chat", "--id", "bot-1", "--open"])
        .args(["--title", "Help Desk"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Help Desk"))
        .stdout(predicate::str::contains("widget_opened"))
        .stdout(predicate::str::contains("-> https://api.modstack.ai"))
        .stdout(predicate::str::contains("*").not());
}

#[test]
fn test_embed_preview_inline_form_height() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args(["embed", "preview", "--kind", "form", "--id", "f-1", "--height", "700px"])
        .assert()
        .success()
        .stdout(predicate::str::contains("height=700px"))
        .stdout(predicate::str::contains("ToggleButton").not());
}

#[test]
fn test_config_set_then_show() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args(["config", "set", "--timeout", "15", "--chatbot", "bot-7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 setting(s) updated"));

    assert!(dir.path().join("config.toml").exists());

    cli(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Current Configuration:"))
        .stdout(predicate::str::contains("15"))
        .stdout(predicate::str::contains("bot-7"))
        .stdout(predicate::str::contains(KEY).not());
}

#[test]
fn test_config_set_without_options_fails() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args(["config", "set"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nothing to set"));
}

#[test]
fn test_webhook_verify_valid_and_tampered() {
    let dir = TempDir::new().unwrap();
    let body = br#"{"event":"ticket.created","data":{"id":"t-1"}}"#;
    let payload = dir.path().join("payload.json");
    std::fs::write(&payload, body).unwrap();
    let signature = compute_signature(body, KEY).expect("signature");

    cli(&dir)
        .args(["webhook", "verify", "--signature", &signature])
        .arg("--payload")
        .arg(&payload)
        .assert()
        .success()
        .stdout(predicate::str::contains("Signature valid"));

    let tampered = signature.replace("sha256=", "sha256=00");
    cli(&dir)
        .args(["webhook", "verify", "--signature", &tampered])
        .arg("--payload")
        .arg(&payload)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Signature does not match"));
}

#[test]
fn test_webhook_verify_signed_non_json_is_rejected() {
    let dir = TempDir::new().unwrap();
    let body = b"definitely not json";
    let payload = dir.path().join("payload.txt");
    std::fs::write(&payload, body).unwrap();
    let signature = compute_signature(body, KEY).expect("signature");

    cli(&dir)
        .args(["webhook", "verify", "--signature", &signature])
        .arg("--payload")
        .arg(&payload)
        .assert()
        .failure()
        .stdout(predicate::str::contains("400 Invalid JSON"));
}

#[test]
fn test_embed_global_requires_configured_chatbot() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args(["embed", "global"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No chatbot configured"));

    // a chatbot alone is not enough while the widget is disabled
    cli(&dir)
        .args(["config", "set", "--chatbot", "bot-7"])
        .assert()
        .success();
    cli(&dir)
        .args(["embed", "global"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No chatbot configured"));
}

#[test]
fn test_embed_global_installs_from_saved_settings() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args(["config", "set", "--widget-enabled", "true", "--chatbot", "bot-7"])
        .args(["--theme", "dark", "--position", "top-left", "--title", "Ask Us"])
        .assert()
        .success();

    cli(&dir)
        .args(["embed", "global", "--origin", "https://site.example", "--open"])
        .assert()
        .success()
        .stdout(predicate::str::contains("modbot_id=bot-7"))
        .stdout(predicate::str::contains("theme=dark"))
        .stdout(predicate::str::contains("position=top-left"))
        .stdout(predicate::str::contains("\"Ask Us\""))
        .stdout(predicate::str::contains("widget_opened"));
}

#[test]
fn test_connection_with_malformed_key_fails_locally() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args(["test-connection", "--api-key", "bad"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Connection failed"));
}

#[test]
fn test_ticket_rejects_malformed_field() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args(["ticket", "--form", "f-1", "--field", "no-equals-sign"])
        .args(["--api-url", "http://127.0.0.1:9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("key=value"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_chatbots_against_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/modbots"))
        .and(header("x-api-key", KEY))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"id": "1", "name": "Helper"}])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args(["list", "chatbots", "--api-url", &server.uri()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 1 modbots"))
        .stdout(predicate::str::contains("Helper"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_chat_prints_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"reply": "Happy to help"})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args(["chat", "--chatbot", "bot-1", "--message", "hello"])
        .args(["--api-url", &server.uri()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Happy to help"));
}
