use contentful_sync::{Connector, ConnectorConfig, ConnectorError};
use serde_json::json;
use std::sync::Arc;
use testing::{ContentfulFixture, role_json};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

fn connector(fixture: &ContentfulFixture, page_size: u32) -> Connector {
    let config = ConnectorConfig::builder()
        .api_token("test-token")
        .organization_id(fixture.organization_id())
        .base_url(fixture.uri())
        .page_size(page_size)
        .build()
        .unwrap();
    Connector::new(&config).unwrap()
}

fn roles() -> Vec<serde_json::Value> {
    vec![
        role_json("r1", "Editor", Some("sp1")),
        role_json("r2", "Translator", Some("sp1")),
        role_json("r3", "Author", Some("sp2")),
        role_json("r4", "Reviewer", None),
    ]
}

#[tokio::test]
async fn test_concurrent_lookups_fill_space_once() {
    let fixture = ContentfulFixture::start().await;
    fixture
        .mount_pages_once(&fixture.organization_path("/roles"), roles(), 2)
        .await;

    let connector = connector(&fixture, 2);
    let cache = Arc::clone(connector.role_cache());
    let cancel = CancellationToken::new();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let cache = Arc::clone(&cache);
        let cancel = cancel.clone();
        handles.push(tokio::spawn(async move {
            cache.resolve_name(&cancel, "sp1", "r2").await
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), "Translator");
    }
    assert!(cache.is_filled("sp1"));
    assert!(!cache.is_filled("sp2"));
}

#[tokio::test]
async fn test_lookups_resolve_both_directions() {
    let fixture = ContentfulFixture::start().await;
    fixture
        .mount_pages(&fixture.organization_path("/roles"), roles(), 10)
        .await;

    let connector = connector(&fixture, 10);
    let cache = connector.role_cache();
    let cancel = CancellationToken::new();

    assert_eq!(cache.resolve_id(&cancel, "sp1", "Editor").await.unwrap(), "r1");
    assert_eq!(cache.resolve_name(&cancel, "sp1", "r4").await.unwrap(), "Reviewer");

    let err = cache.resolve_id(&cancel, "sp1", "Author").await.unwrap_err();
    assert!(matches!(
        err,
        ConnectorError::RoleNotFound { ref space_id, ref role } if space_id == "sp1" && role == "Author"
    ));
    assert_eq!(cache.resolve_id(&cancel, "sp2", "Author").await.unwrap(), "r3");
}

#[tokio::test]
async fn test_admin_is_never_a_cached_role() {
    let fixture = ContentfulFixture::start().await;
    fixture
        .mount_pages(&fixture.organization_path("/roles"), roles(), 10)
        .await;

    let connector = connector(&fixture, 10);
    let err = connector
        .role_cache()
        .resolve_id(&CancellationToken::new(), "sp1", "admin")
        .await
        .unwrap_err();
    assert!(matches!(err, ConnectorError::RoleNotFound { .. }));
}

#[tokio::test]
async fn test_duplicate_role_names_keep_first() {
    let fixture = ContentfulFixture::start().await;
    let roles = vec![
        role_json("r1", "Editor", Some("sp1")),
        role_json("r9", "Editor", Some("sp1")),
    ];
    fixture
        .mount_pages(&fixture.organization_path("/roles"), roles, 10)
        .await;

    let connector = connector(&fixture, 10);
    let cancel = CancellationToken::new();
    let cache = connector.role_cache();

    assert_eq!(cache.resolve_id(&cancel, "sp1", "Editor").await.unwrap(), "r1");
    assert_eq!(cache.resolve_name(&cancel, "sp1", "r9").await.unwrap(), "Editor");
}

#[tokio::test]
async fn test_failed_fill_is_retried() {
    let fixture = ContentfulFixture::start().await;
    let roles_path = fixture.organization_path("/roles");
    Mock::given(method("GET"))
        .and(path(roles_path.as_str()))
        .and(query_param("skip", "0"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "boom"})))
        .up_to_n_times(1)
        .expect(1)
        .mount(fixture.server())
        .await;
    fixture.mount_pages(&roles_path, roles(), 10).await;

    let connector = connector(&fixture, 10);
    let cancel = CancellationToken::new();
    let cache = connector.role_cache();

    let err = cache.resolve_name(&cancel, "sp1", "r1").await.unwrap_err();
    assert!(matches!(err, ConnectorError::Api { status: 500, .. }));
    assert!(!cache.is_filled("sp1"));

    assert_eq!(cache.resolve_name(&cancel, "sp1", "r1").await.unwrap(), "Editor");
    assert!(cache.is_filled("sp1"));
}
