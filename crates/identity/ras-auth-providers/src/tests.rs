//! End-to-end provider tests against mock user-info servers.

#[cfg(test)]
mod integration_tests {
    use crate::{
        AuthProvider, AuthProviderError, ErrorKind, GiteaProvider, MailcowProvider, OAuth2Token,
        OidcProvider, ProviderConfig, UsernamePolicy, fetch_auth_user_until_cancelled,
        provider_by_name,
    };
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter("ras_auth_providers=debug")
            .try_init();
    }

    fn token() -> OAuth2Token {
        OAuth2Token::new("tok1").with_refresh_token("ref1")
    }

    fn alice_profile(active: i64) -> serde_json::Value {
        json!({
            "success": true,
            "username": "alice@example.com",
            "id": "42",
            "email": "alice@example.com",
            "full_name": "Alice A",
            "active": active
        })
    }

    async fn mock_profile(server: &MockServer, route: &str, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(route))
            .and(header("Authorization", "Bearer tok1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(server)
            .await;
    }

    fn mailcow_for(server: &MockServer) -> MailcowProvider {
        MailcowProvider::from_config(&MailcowProvider::config_for_host(&server.uri()))
    }

    #[tokio::test]
    async fn test_mailcow_active_user() {
        init_tracing();
        let server = MockServer::start().await;
        mock_profile(&server, "/oauth/profile", alice_profile(1)).await;

        let user = mailcow_for(&server)
            .fetch_auth_user(&token())
            .await
            .unwrap();

        assert_eq!(user.id, "42");
        assert_eq!(user.name.as_deref(), Some("Alice A"));
        assert_eq!(user.username.as_deref(), Some("alice"));
        assert_eq!(user.email.as_deref(), Some("alice@example.com"));
        assert_eq!(user.access_token, "tok1");
        assert_eq!(user.refresh_token.as_deref(), Some("ref1"));
        assert_eq!(user.avatar_url, None);
        assert_eq!(serde_json::Value::Object(user.raw_user), alice_profile(1));
    }

    #[tokio::test]
    async fn test_mailcow_inactive_user() {
        init_tracing();
        let server = MockServer::start().await;
        mock_profile(&server, "/oauth/profile", alice_profile(0)).await;

        let err = mailcow_for(&server)
            .fetch_auth_user(&token())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InactiveAccount);
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_mailcow_any_non_sentinel_activity_is_inactive() {
        for active in [json!(2), json!(-1), json!(null)] {
            let server = MockServer::start().await;
            let mut profile = alice_profile(1);
            profile["active"] = active.clone();
            mock_profile(&server, "/oauth/profile", profile).await;

            let err = mailcow_for(&server)
                .fetch_auth_user(&token())
                .await
                .unwrap_err();

            assert_eq!(err.kind(), ErrorKind::InactiveAccount, "active = {}", active);
        }
    }

    #[tokio::test]
    async fn test_mailcow_null_fields_are_zero_values() {
        let server = MockServer::start().await;
        let mut profile = alice_profile(1);
        profile["modified"] = json!(null);
        profile["created"] = json!(null);
        profile["displayName"] = json!(null);
        profile["identifier"] = json!(null);
        profile["full_name"] = json!(null);
        mock_profile(&server, "/oauth/profile", profile).await;

        let user = mailcow_for(&server)
            .fetch_auth_user(&token())
            .await
            .unwrap();

        assert_eq!(user.id, "42");
        assert_eq!(user.username.as_deref(), Some("alice"));
        assert_eq!(user.name, None);
        assert!(user.raw_user["modified"].is_null());
    }

    #[tokio::test]
    async fn test_mailcow_missing_active_field_is_inactive() {
        let server = MockServer::start().await;
        mock_profile(&server, "/oauth/profile", json!({"id": "42", "username": "bob"})).await;

        let err = mailcow_for(&server)
            .fetch_auth_user(&token())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AuthProviderError::InactiveAccount { provider } if provider == "mailcow"
        ));
    }

    #[tokio::test]
    async fn test_mailcow_username_without_at_is_unchanged() {
        let server = MockServer::start().await;
        let mut profile = alice_profile(1);
        profile["username"] = json!("alice.a");
        mock_profile(&server, "/oauth/profile", profile).await;

        let user = mailcow_for(&server)
            .fetch_auth_user(&token())
            .await
            .unwrap();

        assert_eq!(user.username.as_deref(), Some("alice.a"));
    }

    #[tokio::test]
    async fn test_mailcow_username_policy_can_be_disabled() {
        let server = MockServer::start().await;
        mock_profile(&server, "/oauth/profile", alice_profile(1)).await;

        let user = mailcow_for(&server)
            .with_username_policy(UsernamePolicy::Verbatim)
            .fetch_auth_user(&token())
            .await
            .unwrap();

        assert_eq!(user.username.as_deref(), Some("alice@example.com"));
    }

    #[tokio::test]
    async fn test_mailcow_keeps_unknown_fields_in_raw_user() {
        let server = MockServer::start().await;
        let mut profile = alice_profile(1);
        profile["quota"] = json!({"bytes": 1024, "messages": 3});
        profile["tags"] = json!(["staff", "admin"]);
        mock_profile(&server, "/oauth/profile", profile.clone()).await;

        let user = mailcow_for(&server)
            .fetch_auth_user(&token())
            .await
            .unwrap();

        assert_eq!(user.raw_user.len(), 8);
        assert_eq!(user.raw_user["quota"]["bytes"], 1024);
        assert_eq!(serde_json::Value::Object(user.raw_user), profile);
    }

    #[tokio::test]
    async fn test_mailcow_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oauth/profile"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
            .mount(&server)
            .await;

        let err = mailcow_for(&server)
            .fetch_auth_user(&token())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MalformedPayload);
    }

    #[tokio::test]
    async fn test_mailcow_empty_id_is_malformed() {
        let server = MockServer::start().await;
        let mut profile = alice_profile(1);
        profile["id"] = json!("");
        mock_profile(&server, "/oauth/profile", profile).await;

        let err = mailcow_for(&server)
            .fetch_auth_user(&token())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MalformedPayload);
    }

    #[tokio::test]
    async fn test_mailcow_transport_error_is_propagated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oauth/profile"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = mailcow_for(&server)
            .fetch_auth_user(&token())
            .await
            .unwrap_err();

        assert!(matches!(err, AuthProviderError::Transport { status: Some(503), .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_token_expiry_is_copied() {
        let server = MockServer::start().await;
        mock_profile(&server, "/oauth/profile", alice_profile(1)).await;
        let expiry = Utc.with_ymd_and_hms(2031, 5, 6, 7, 8, 9).unwrap();

        let user = mailcow_for(&server)
            .fetch_auth_user(&token().with_expiry(expiry))
            .await
            .unwrap();

        assert_eq!(user.expiry, Some(expiry));
    }

    #[tokio::test]
    async fn test_gitea_user() {
        init_tracing();
        let server = MockServer::start().await;
        mock_profile(
            &server,
            "/api/v1/user",
            json!({
                "id": 1001,
                "login": "alice@corp",
                "full_name": "Alice A",
                "email": "alice@example.com",
                "avatar_url": "https://gitea.example.com/avatars/1001",
                "active": true,
                "prohibit_login": false,
                "is_admin": true
            }),
        )
        .await;

        let provider = GiteaProvider::from_config(
            &ProviderConfig::default().with_user_info_url(format!("{}/api/v1/user", server.uri())),
        );
        let user = provider.fetch_auth_user(&token()).await.unwrap();

        assert_eq!(user.id, "1001");
        // Gitea does not opt into the email-local-part rule.
        assert_eq!(user.username.as_deref(), Some("alice@corp"));
        assert_eq!(
            user.avatar_url.as_deref(),
            Some("https://gitea.example.com/avatars/1001")
        );
        assert_eq!(user.raw_user["is_admin"], true);
    }

    #[tokio::test]
    async fn test_gitea_prohibited_login_is_inactive() {
        let server = MockServer::start().await;
        mock_profile(
            &server,
            "/api/v1/user",
            json!({"id": 7, "login": "mallory", "prohibit_login": true}),
        )
        .await;

        let provider = GiteaProvider::from_config(
            &ProviderConfig::default().with_user_info_url(format!("{}/api/v1/user", server.uri())),
        );
        let err = provider.fetch_auth_user(&token()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InactiveAccount);
    }

    #[tokio::test]
    async fn test_oidc_user_email_requires_verification() {
        let server = MockServer::start().await;
        mock_profile(
            &server,
            "/userinfo",
            json!({
                "sub": "abc-123",
                "name": "Alice A",
                "preferred_username": "alice@example.com",
                "email": "alice@example.com",
                "email_verified": false
            }),
        )
        .await;

        let provider = OidcProvider::from_config(
            &ProviderConfig::default().with_user_info_url(format!("{}/userinfo", server.uri())),
        );
        let user = provider.fetch_auth_user(&token()).await.unwrap();

        assert_eq!(user.id, "abc-123");
        assert_eq!(user.username.as_deref(), Some("alice@example.com"));
        assert_eq!(user.email, None);
        assert_eq!(user.raw_user["email"], "alice@example.com");
    }

    #[tokio::test]
    async fn test_oidc_verified_email() {
        let server = MockServer::start().await;
        mock_profile(
            &server,
            "/userinfo",
            json!({"sub": "abc-123", "email": "alice@example.com", "email_verified": true}),
        )
        .await;

        let provider = OidcProvider::from_config(
            &ProviderConfig::default().with_user_info_url(format!("{}/userinfo", server.uri())),
        );
        let user = provider.fetch_auth_user(&token()).await.unwrap();

        assert_eq!(user.email.as_deref(), Some("alice@example.com"));
        assert_eq!(user.name, None);
    }

    #[tokio::test]
    async fn test_oidc_string_verification_flag() {
        let server = MockServer::start().await;
        mock_profile(
            &server,
            "/userinfo",
            json!({
                "sub": "abc-123",
                "name": null,
                "email": "alice@example.com",
                "email_verified": "true"
            }),
        )
        .await;

        let provider = OidcProvider::from_config(
            &ProviderConfig::default().with_user_info_url(format!("{}/userinfo", server.uri())),
        );
        let user = provider.fetch_auth_user(&token()).await.unwrap();

        assert_eq!(user.email.as_deref(), Some("alice@example.com"));
        assert_eq!(user.name, None);
    }

    #[tokio::test]
    async fn test_oidc_missing_sub_is_malformed() {
        let server = MockServer::start().await;
        mock_profile(&server, "/userinfo", json!({"name": "Nobody"})).await;

        let provider = OidcProvider::from_config(
            &ProviderConfig::default().with_user_info_url(format!("{}/userinfo", server.uri())),
        );
        let err = provider.fetch_auth_user(&token()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MalformedPayload);
    }

    #[tokio::test]
    async fn test_injected_http_client_is_used() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oauth/profile"))
            .and(header("User-Agent", "host-app/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(alice_profile(1)))
            .expect(1)
            .mount(&server)
            .await;

        let http_client = reqwest::Client::builder()
            .user_agent("host-app/1.0")
            .build()
            .unwrap();
        let user = mailcow_for(&server)
            .with_http_client(http_client)
            .fetch_auth_user(&token())
            .await
            .unwrap();

        assert_eq!(user.id, "42");
    }

    #[tokio::test]
    async fn test_concurrent_fetches_share_one_provider() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oauth/profile"))
            .respond_with(ResponseTemplate::new(200).set_body_json(alice_profile(1)))
            .expect(10)
            .mount(&server)
            .await;

        let provider = provider_by_name(
            "mailcow",
            &MailcowProvider::config_for_host(&server.uri()),
        )
        .unwrap();

        let mut handles = vec![];
        for i in 0..10 {
            let provider: Arc<dyn AuthProvider> = provider.clone();
            handles.push(tokio::spawn(async move {
                let token = OAuth2Token::new(format!("tok-{}", i));
                provider.fetch_auth_user(&token).await
            }));
        }

        for (i, handle) in handles.into_iter().enumerate() {
            let user = handle.await.unwrap().unwrap();
            assert_eq!(user.id, "42");
            assert_eq!(user.access_token, format!("tok-{}", i));
        }
    }

    #[tokio::test]
    async fn test_cancellation_stops_slow_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oauth/profile"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(alice_profile(1))
                    .set_delay(Duration::from_secs(30)),
            )
            .mount(&server)
            .await;

        let provider = mailcow_for(&server);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let err = fetch_auth_user_until_cancelled(&provider, &token(), &cancel)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Cancelled);
    }

    #[tokio::test]
    async fn test_uncancelled_fetch_completes() {
        let server = MockServer::start().await;
        mock_profile(&server, "/oauth/profile", alice_profile(1)).await;

        let provider = mailcow_for(&server);
        let user = fetch_auth_user_until_cancelled(&provider, &token(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(user.username.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_already_cancelled_token_skips_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(alice_profile(1)))
            .expect(0)
            .mount(&server)
            .await;

        let provider = mailcow_for(&server);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = fetch_auth_user_until_cancelled(&provider, &token(), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, AuthProviderError::Cancelled));
    }
}
