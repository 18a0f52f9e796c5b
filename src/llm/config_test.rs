use super::*;

/// # Safety
/// Only called from `from_env_cases`; env mutation stays inside that one test
/// so parallel tests cannot race on it.
unsafe fn clear_llm_env() {
    unsafe {
        std::env::remove_var("LLM_API_KEY_ENV");
        std::env::remove_var("LLM_MODEL");
        std::env::remove_var("LLM_BASE_URL");
        std::env::remove_var("LLM_MAX_TOKENS");
        std::env::remove_var("LLM_TEMPERATURE");
        std::env::remove_var("LLM_SYSTEM_PROMPT");
        std::env::remove_var("LLM_REQUEST_TIMEOUT_SECS");
        std::env::remove_var("LLM_CONNECT_TIMEOUT_SECS");
        std::env::remove_var("OPENAI_API_KEY");
        std::env::remove_var("TEST_CHAT_KEY");
    }
}

// All env-mutating cases run inside one test so they cannot race each other.
#[test]
fn from_env_cases() {
    unsafe {
        clear_llm_env();
        std::env::set_var("OPENAI_API_KEY", "sk-default");
    }
    let cfg = LlmConfig::from_env().unwrap();
    assert_eq!(cfg.api_key, "sk-default");
    assert_eq!(cfg.model, DEFAULT_MODEL);
    assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
    assert_eq!(cfg.max_tokens, 150);
    assert!((cfg.temperature - 0.7).abs() < f32::EPSILON);
    assert_eq!(cfg.system_prompt, DEFAULT_SYSTEM_PROMPT);
    assert_eq!(
        cfg.timeouts,
        LlmTimeouts { request_secs: DEFAULT_LLM_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_LLM_CONNECT_TIMEOUT_SECS }
    );

    unsafe {
        clear_llm_env();
        std::env::set_var("LLM_API_KEY_ENV", "TEST_CHAT_KEY");
        std::env::set_var("TEST_CHAT_KEY", "secret");
        std::env::set_var("LLM_MODEL", "gpt-4o-mini");
        std::env::set_var("LLM_BASE_URL", "https://example.test/v1/");
        std::env::set_var("LLM_MAX_TOKENS", "64");
        std::env::set_var("LLM_TEMPERATURE", "0.2");
        std::env::set_var("LLM_SYSTEM_PROMPT", "be brief");
        std::env::set_var("LLM_REQUEST_TIMEOUT_SECS", "42");
        std::env::set_var("LLM_CONNECT_TIMEOUT_SECS", "7");
    }
    let cfg = LlmConfig::from_env().unwrap();
    assert_eq!(cfg.api_key, "secret");
    assert_eq!(cfg.model, "gpt-4o-mini");
    assert_eq!(cfg.base_url, "https://example.test/v1");
    assert_eq!(cfg.max_tokens, 64);
    assert_eq!(cfg.system_prompt, "be brief");
    assert_eq!(cfg.timeouts, LlmTimeouts { request_secs: 42, connect_secs: 7 });

    unsafe {
        clear_llm_env();
    }
    let err = LlmConfig::from_env().unwrap_err().to_string();
    assert!(err.contains("OPENAI_API_KEY"), "{err}");

    unsafe {
        std::env::set_var("OPENAI_API_KEY", "   ");
    }
    assert!(matches!(LlmConfig::from_env(), Err(LlmError::MissingApiKey { .. })));

    unsafe {
        std::env::set_var("OPENAI_API_KEY", "sk-default");
        std::env::set_var("LLM_TEMPERATURE", "9.5");
    }
    let err = LlmConfig::from_env().unwrap_err().to_string();
    assert!(err.contains("LLM_TEMPERATURE"), "{err}");

    unsafe { clear_llm_env() };
}
