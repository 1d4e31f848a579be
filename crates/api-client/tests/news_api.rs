//! Integration tests for the typed API against a mock backend

use api_client::{
    MembershipDraft, MembershipStatus, MembershipStatusUpdate, NewsApi, PreferencePatch,
    ProfilePatch,
};
use networking::{FetcherConfig, HttpFetcher, RetryPolicy, SessionHandle};
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api(server: &MockServer) -> NewsApi {
    let config = FetcherConfig::new(server.uri()).with_retry(RetryPolicy::none());
    let session = SessionHandle::signed_in("token-1", None);
    let fetcher = HttpFetcher::new(config, Arc::new(session)).unwrap();
    NewsApi::new(Arc::new(fetcher))
}

#[tokio::test]
async fn test_languages() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/languages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": 1, "code": "en", "name": "English"},
            {"id": 2, "code": "te", "name": "Telugu", "nativeName": "తెలుగు"}
        ])))
        .mount(&server)
        .await;

    let languages = api(&server).languages().await.unwrap();
    assert_eq!(languages.len(), 2);
    assert_eq!(languages[1].id, "2");
    assert_eq!(languages[1].code, "te");
}

#[tokio::test]
async fn test_patch_preferences() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/preferences"))
        .and(header("Authorization", "Bearer token-1"))
        .and(body_json(serde_json::json!({"languageId": "2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "languageId": 2,
            "updatedAt": "2024-05-01T08:30:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let prefs = api(&server).patch_preferences(&PreferencePatch::language("2")).await.unwrap();
    assert_eq!(prefs.language_id.as_deref(), Some("2"));
    assert!(prefs.updated_at.is_some());
}

#[tokio::test]
async fn test_news_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/news"))
        .and(query_param("language", "te"))
        .and(query_param("category", "sports"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{"id": 10, "title": "Match report", "category": "sports", "languageCode": "te"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let articles = api(&server).news("te", Some("sports")).await.unwrap();
    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].title, "Match report");
}

#[tokio::test]
async fn test_membership_workflow() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/memberships"))
        .and(body_json(serde_json::json!({"fullName": "Lakshmi", "phone": "9000000000"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "id": 7, "fullName": "Lakshmi", "phone": "9000000000", "status": "pending"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/admin/memberships/7/status"))
        .and(body_json(serde_json::json!({"status": "approved", "remarks": "welcome"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 7, "fullName": "Lakshmi", "status": "approved", "remarks": "welcome"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = api(&server);
    let draft = MembershipDraft {
        full_name: "Lakshmi".to_string(),
        phone: "9000000000".to_string(),
        email: None,
        address: None,
        membership_type: None,
    };
    let created = api.create_membership(&draft).await.unwrap();
    assert_eq!(created.status, MembershipStatus::Pending);

    let update = MembershipStatusUpdate {
        status: MembershipStatus::Approved,
        remarks: Some("welcome".to_string()),
    };
    let approved = api.set_membership_status(&created.id, &update).await.unwrap();
    assert_eq!(approved.status, MembershipStatus::Approved);
}

#[tokio::test]
async fn test_upload_then_patch_profile() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/media/upload"))
        .and(header("Content-Type", "image/jpeg"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "url": "https://cdn.example.com/u/1.jpg", "mediaId": 55
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/profile"))
        .and(body_json(serde_json::json!({"photoUrl": "https://cdn.example.com/u/1.jpg"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "u1", "photoUrl": "https://cdn.example.com/u/1.jpg"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = api(&server);
    let upload = api.upload_media("image/jpeg", vec![0xff, 0xd8, 0xff]).await.unwrap();
    assert_eq!(upload.media_id, "55");

    let profile = api.patch_profile(&ProfilePatch::photo(upload.url.clone())).await.unwrap();
    assert_eq!(profile.photo_url.as_deref(), Some("https://cdn.example.com/u/1.jpg"));
}
