//! Provider and model administration through the admin gate.

mod common;

use common::Harness;
use studio_auth::{AuthError, parse_capabilities, parse_provider};
use studio_core::{
    ApiKey, LlmModelCapability, LlmModelConfig, LlmProviderConfig, LlmProviderType, Role,
};

fn provider_config(provider: LlmProviderType) -> LlmProviderConfig {
    LlmProviderConfig {
        provider,
        base_url: "  https://api.example.com/v1  ".to_string(),
        api_key: ApiKey::new("  sk-test  "),
        timeout_seconds: 30,
    }
}

fn model_config(provider: LlmProviderType, upstream_model: &str) -> LlmModelConfig {
    LlmModelConfig {
        provider,
        capabilities: vec![LlmModelCapability::Text],
        upstream_model: upstream_model.to_string(),
    }
}

#[tokio::test]
async fn test_every_operation_requires_admin() {
    let h = Harness::with_defaults();
    let user = h.session_with_role("u-user", Role::User).await;

    assert!(matches!(
        h.llm.list_provider_configs(&user).await,
        Err(AuthError::Forbidden)
    ));
    assert!(matches!(
        h.llm
            .upsert_provider_config(&user, provider_config(LlmProviderType::Dashscope))
            .await,
        Err(AuthError::Forbidden)
    ));
    assert!(matches!(
        h.llm
            .delete_provider_config(&user, LlmProviderType::Dashscope)
            .await,
        Err(AuthError::Forbidden)
    ));
    assert!(matches!(
        h.llm.list_models(&user).await,
        Err(AuthError::Forbidden)
    ));
    assert!(matches!(
        h.llm
            .upsert_model(&user, model_config(LlmProviderType::Dashscope, "qwen"))
            .await,
        Err(AuthError::Forbidden)
    ));
    assert!(matches!(
        h.llm.delete_model(&user, "m-1").await,
        Err(AuthError::Forbidden)
    ));

    assert_eq!(h.admin.writes(), 0);
}

#[tokio::test]
async fn test_authorization_precedes_validation() {
    let h = Harness::with_defaults();
    let user = h.session_with_role("u-user", Role::User).await;

    assert!(matches!(
        h.llm
            .upsert_model(&user, model_config(LlmProviderType::Dashscope, "  "))
            .await,
        Err(AuthError::Forbidden)
    ));
    assert!(matches!(
        h.llm.delete_model(&user, "").await,
        Err(AuthError::Forbidden)
    ));
}

#[tokio::test]
async fn test_upsert_provider_config_trims_inputs() {
    let h = Harness::with_defaults();
    let admin = h.session_with_role("u-admin", Role::Admin).await;

    h.llm
        .upsert_provider_config(&admin, provider_config(LlmProviderType::OpenRouter))
        .await
        .unwrap();

    let configs = h.llm.list_provider_configs(&admin).await.unwrap();
    assert_eq!(configs.len(), 1);
    assert_eq!(configs[0].base_url, "https://api.example.com/v1");
    assert!(configs[0].api_key_present);
    assert_eq!(
        h.admin.last_api_key.lock().unwrap().as_deref(),
        Some("sk-test")
    );
}

#[tokio::test]
async fn test_model_requires_configured_provider() {
    let h = Harness::with_defaults();

    for role in [Role::Admin, Role::SuperAdmin] {
        let session = h.session_with_role("actor", role).await;
        let result = h
            .llm
            .upsert_model(&session, model_config(LlmProviderType::Dashscope, "qwen-max"))
            .await;
        assert!(matches!(
            result,
            Err(AuthError::ProviderNotConfigured(LlmProviderType::Dashscope))
        ));
    }
    assert_eq!(h.admin.writes(), 0);
}

#[tokio::test]
async fn test_model_lifecycle() {
    let h = Harness::with_defaults();
    let admin = h.session_with_role("u-admin", Role::Admin).await;

    h.llm
        .upsert_provider_config(&admin, provider_config(LlmProviderType::Dashscope))
        .await
        .unwrap();

    let id = h
        .llm
        .upsert_model(&admin, model_config(LlmProviderType::Dashscope, "  qwen-max "))
        .await
        .unwrap();
    assert_eq!(id, "dashscope:qwen-max");

    h.llm
        .upsert_model(&admin, model_config(LlmProviderType::Dashscope, "qwen-turbo"))
        .await
        .unwrap();
    h.llm
        .upsert_model(&admin, model_config(LlmProviderType::Dashscope, "deepseek"))
        .await
        .unwrap();

    let ids: Vec<String> = h
        .llm
        .list_models(&admin)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.id)
        .collect();
    assert_eq!(
        ids,
        vec![
            "dashscope:deepseek",
            "dashscope:qwen-max",
            "dashscope:qwen-turbo"
        ]
    );

    h.llm
        .delete_model(&admin, "  dashscope:qwen-max  ")
        .await
        .unwrap();
    assert_eq!(h.llm.list_models(&admin).await.unwrap().len(), 2);

    // Once the provider is gone, new models are refused again.
    h.llm
        .delete_provider_config(&admin, LlmProviderType::Dashscope)
        .await
        .unwrap();
    assert!(matches!(
        h.llm
            .upsert_model(&admin, model_config(LlmProviderType::Dashscope, "qwen-max"))
            .await,
        Err(AuthError::ProviderNotConfigured(_))
    ));
}

#[tokio::test]
async fn test_model_input_validation() {
    let h = Harness::with_defaults();
    let admin = h.session_with_role("u-admin", Role::Admin).await;

    assert!(matches!(
        h.llm
            .upsert_model(&admin, model_config(LlmProviderType::OpenRouter, " \t "))
            .await,
        Err(AuthError::InvalidUpstreamModel)
    ));
    assert!(matches!(
        h.llm.delete_model(&admin, "   ").await,
        Err(AuthError::InvalidModelId)
    ));
    assert_eq!(h.admin.writes(), 0);
}

#[tokio::test]
async fn test_provider_listing_is_sorted() {
    let h = Harness::with_defaults();
    let admin = h.session_with_role("u-admin", Role::Admin).await;

    for provider in [LlmProviderType::OpenRouter, LlmProviderType::Dashscope] {
        h.llm
            .upsert_provider_config(&admin, provider_config(provider))
            .await
            .unwrap();
    }

    let providers: Vec<LlmProviderType> = h
        .llm
        .list_provider_configs(&admin)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.provider)
        .collect();
    assert_eq!(
        providers,
        vec![LlmProviderType::Dashscope, LlmProviderType::OpenRouter]
    );
}

#[test]
fn test_parsing_caller_input() {
    assert_eq!(
        parse_provider("provider-dashscope").unwrap(),
        LlmProviderType::Dashscope
    );
    assert!(matches!(
        parse_provider(""),
        Err(AuthError::InvalidProvider)
    ));
    assert!(matches!(
        parse_capabilities(["text", "holograms"]),
        Err(AuthError::InvalidCapability(_))
    ));
}
