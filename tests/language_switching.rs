//! Language switching races and source precedence

use api_client::LanguageOption;
use newsdesk::{
    FetcherConfig, LanguageSource, Newsdesk, NewsdeskConfig, RetryPolicy, SessionHandle,
};
use serde_json::json;
use std::time::Duration;
use storage::keys;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn desk(server: &MockServer, session: SessionHandle) -> Newsdesk {
    let config = NewsdeskConfig::new(server.uri())
        .with_fetcher(FetcherConfig::new(server.uri()).with_retry(RetryPolicy::none()))
        .warm_up_news(false);
    Newsdesk::new(config, session).unwrap()
}

fn option(id: &str, code: &str, name: &str) -> LanguageOption {
    LanguageOption {
        id: id.to_string(),
        code: code.to_string(),
        name: name.to_string(),
        native_name: None,
    }
}

async fn mount_news(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/news"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;
}

async fn wait_idle(desk: &Newsdesk) {
    let mut prefs = desk.preferences().subscribe();
    tokio::time::timeout(Duration::from_secs(5), prefs.wait_for(|s| !s.refreshing))
        .await
        .unwrap()
        .unwrap();
}

/// A refresh started before a language change must not overwrite it
#[tokio::test]
async fn test_slow_refresh_does_not_revert_change() {
    let server = MockServer::start().await;
    mount_news(&server).await;
    Mock::given(method("GET"))
        .and(path("/preferences"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"languageId": "te"}))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/preferences"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"languageId": "hi"})))
        .mount(&server)
        .await;

    let desk = desk(&server, SessionHandle::signed_in("token", None));
    assert!(desk.preferences().spawn_refresh());

    let changed = desk.change_language(&option("hi", "hi", "Hindi")).await.unwrap();
    assert_eq!(changed.map(|l| l.code).as_deref(), Some("hi"));

    wait_idle(&desk).await;
    assert_eq!(desk.preferences().language_id().as_deref(), Some("hi"));

    let cached = desk.store().get(keys::PREFERENCES).await.unwrap().unwrap();
    assert!(cached.contains("\"hi\""));
}

/// Two rapid changes send one write; the second is skipped
#[tokio::test]
async fn test_concurrent_changes_are_single_flight() {
    let server = MockServer::start().await;
    mount_news(&server).await;
    Mock::given(method("PATCH"))
        .and(path("/preferences"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"languageId": "ta"}))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let desk = desk(&server, SessionHandle::signed_in("token", None));
    let tamil = option("ta", "ta", "Tamil");
    let kannada = option("kn", "kn", "Kannada");

    let (first, second) = tokio::join!(desk.change_language(&tamil), desk.change_language(&kannada));
    let first = first.unwrap();
    let second = second.unwrap();

    assert!(first.is_some());
    assert!(second.is_none());
    assert_eq!(desk.preferences().language_id().as_deref(), Some("ta"));
}

/// A change made while the catalog is still loading refreshes the news
/// list for the new language's code
#[tokio::test]
async fn test_change_before_catalog_loads_refreshes_news() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/languages"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"id": 2, "code": "te", "name": "Telugu"}]))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/preferences"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"languageId": 2})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/news"))
        .and(query_param("language", "te"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 7, "title": "fresh"}])))
        .expect(1)
        .mount(&server)
        .await;

    let desk = desk(&server, SessionHandle::signed_in("token", None));
    desk.store().set("news_cache:te", r#"[{"id":"1","title":"stale"}]"#).await.unwrap();
    assert!(desk.languages().spawn_refresh());

    let language = desk.change_language(&option("2", "te", "Telugu")).await.unwrap().unwrap();
    assert!(desk.languages().snapshot().refreshing);

    assert_eq!(language.code, "te");
    assert_eq!(language.source, LanguageSource::Session);
    assert_eq!(desk.news().load("te", None).await.unwrap()[0].title, "fresh");
}

/// Session language wins, unusable values fall through to the next source
#[tokio::test]
async fn test_source_precedence() {
    let server = MockServer::start().await;
    let session = SessionHandle::signed_in("token", Some("mr".to_string()));
    let desk = desk(&server, session.clone());
    desk.store()
        .set(keys::SELECTED_LANGUAGE, r#"{"id":"5","code":"kn","name":"Kannada"}"#)
        .await
        .unwrap();
    desk.store().set(keys::LANGUAGE_LOCAL, r#"{"code":"bn"}"#).await.unwrap();

    let resolved = desk.resolver().resolve_effective_language().await;
    assert_eq!(resolved.code, "mr");
    assert_eq!(resolved.source, LanguageSource::Session);

    session.set_language_id(Some("   ".to_string()));
    let resolved = desk.resolver().resolve_effective_language().await;
    assert_eq!(resolved.code, "kn");
    assert_eq!(resolved.id.as_deref(), Some("5"));
    assert_eq!(resolved.source, LanguageSource::SelectedLanguage);

    desk.store().set(keys::SELECTED_LANGUAGE, "{not json").await.unwrap();
    let resolved = desk.resolver().resolve_effective_language().await;
    assert_eq!(resolved.code, "bn");
    assert_eq!(resolved.source, LanguageSource::LegacyLocal);

    desk.store().remove(keys::LANGUAGE_LOCAL).await.unwrap();
    let resolved = desk.resolver().resolve_effective_language().await;
    assert_eq!(resolved.code, "en");
    assert_eq!(resolved.source, LanguageSource::Default);
}

/// Signing out while a news warmup is in flight leaves nothing cached
#[tokio::test]
async fn test_sign_out_during_warmup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/news"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"id": 1, "title": "late"}]))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    let desk = desk(&server, SessionHandle::signed_in("token", None));
    assert!(desk.news().warm_up("te", None));
    desk.sign_out().await;

    tokio::time::timeout(Duration::from_secs(5), async {
        while desk.news().is_warming("te", None) {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .unwrap();

    assert!(desk.news().cached("te", None).await.is_none());
    assert!(!desk.session().is_signed_in());
}
