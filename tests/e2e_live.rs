use std::time::Duration;

use llm_starter_kit::{ClaudeClient, Config, MessageOptions, OpenAiClient, Operation, retry};

fn live_config() -> Config {
    Config::load(None).expect("load config")
}

#[test]
#[ignore]
fn test_anthropic_simple_response() {
    let config = live_config();
    if config.anthropic_api_key.is_none() {
        return;
    }

    let client = ClaudeClient::new(&config).expect("create client");
    let response = client
        .send_message("respond with only the word HELLO")
        .expect("should get response");

    assert!(
        response.to_uppercase().contains("HELLO"),
        "expected HELLO in response, got: {}",
        response
    );
}

#[test]
#[ignore]
fn test_openai_simple_response() {
    let config = live_config();
    if config.openai_api_key.is_none() {
        return;
    }

    let client = OpenAiClient::new(&config).expect("create client");
    let response = client
        .send_message_with(
            "respond with only the word HELLO",
            &MessageOptions::default().model("gpt-4o-mini").max_tokens(16),
        )
        .expect("should get response");

    assert!(
        response.to_uppercase().contains("HELLO"),
        "expected HELLO in response, got: {}",
        response
    );
}

#[test]
#[ignore]
fn test_rate_limited_retrying_burst() {
    let config = live_config();
    if config.anthropic_api_key.is_none() {
        return;
    }

    let client = ClaudeClient::new(&config).expect("create client");
    let limiter = llm_starter_kit::RateLimiter::new(2, Duration::from_secs(5)).expect("limiter");
    let mut send = retry(3, Duration::from_secs(2))
        .expect("policy")
        .wrap(limiter.wrap(|message: String| client.send_message(&message)));

    for i in 1..=3 {
        let response = send
            .invoke(format!("Count to {i}, digits only"))
            .expect("should get response");
        assert!(
            response.contains(&i.to_string()),
            "expected {} in response, got: {}",
            i,
            response
        );
    }
}

#[test]
#[ignore]
fn test_invalid_key_is_an_error_not_a_reply() {
    let config = Config {
        anthropic_api_key: Some("sk-ant-invalid".to_string()),
        ..Config::default()
    };

    let client = ClaudeClient::new(&config).expect("create client");
    let err = client.send_message("hello").unwrap_err();
    assert!(!err.is_transient(), "unexpected transient error: {}", err);
}
