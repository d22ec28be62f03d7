use contentful_sync::sync::list_all;
use contentful_sync::{Connector, ConnectorConfig, ConnectorError, ResourceType};
use serde_json::json;
use std::time::Duration;
use testing::{ContentfulFixture, collection, space_json, team_json};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
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

#[tokio::test]
async fn test_space_walk_fetches_every_page_once() {
    let fixture = ContentfulFixture::start().await;
    let spaces = (0..5)
        .map(|i| space_json(&format!("sp{i}"), &format!("Space {i}")))
        .collect();
    fixture.mount_pages_once("/spaces", spaces, 2).await;

    let connector = connector(&fixture, 2);
    let cancel = CancellationToken::new();
    let syncer = connector.syncer(ResourceType::Space);

    let first = syncer.list(&cancel, None).await.unwrap();
    assert_eq!(first.items.len(), 2);
    assert_eq!(first.next_cursor.as_deref(), Some("2"));

    let mut cursor = first.next_cursor;
    let mut seen = first.items.len();
    while let Some(current) = cursor {
        let page = syncer.list(&cancel, Some(&current)).await.unwrap();
        seen += page.items.len();
        cursor = page.next_cursor;
    }
    assert_eq!(seen, 5);
}

#[tokio::test]
async fn test_empty_listing_has_no_cursor() {
    let fixture = ContentfulFixture::start().await;
    fixture.mount_pages_once("/spaces", Vec::new(), 10).await;

    let connector = connector(&fixture, 10);
    let page = connector
        .syncer(ResourceType::Space)
        .list(&CancellationToken::new(), None)
        .await
        .unwrap();

    assert!(page.items.is_empty());
    assert!(page.next_cursor.is_none());
}

#[tokio::test]
async fn test_malformed_cursor_is_rejected_without_request() {
    let fixture = ContentfulFixture::start().await;
    let connector = connector(&fixture, 10);

    let err = connector
        .syncer(ResourceType::Team)
        .list(&CancellationToken::new(), Some("page-two"))
        .await
        .unwrap_err();

    assert!(matches!(err, ConnectorError::InvalidCursor { cursor } if cursor == "page-two"));
    let requests = fixture.server().received_requests().await.unwrap();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn test_teams_keep_non_empty_descriptions() {
    let fixture = ContentfulFixture::start().await;
    let teams = vec![
        team_json("t1", "Editors", Some("Content editors")),
        team_json("t2", "Ops", Some("")),
        team_json("t3", "Legal", None),
    ];
    fixture
        .mount_pages_once(&fixture.organization_path("/teams"), teams, 10)
        .await;

    let connector = connector(&fixture, 10);
    let teams = list_all(connector.syncer(ResourceType::Team), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(teams.len(), 3);
    let descriptions: Vec<_> = teams
        .iter()
        .map(|t| match &t.profile {
            contentful_sync::resource::ResourceProfile::Team { description } => description.clone(),
            _ => panic!("expected team profile")
        })
        .collect();
    assert_eq!(
        descriptions,
        vec![Some("Content editors".to_string()), None, None]
    );
}

#[tokio::test]
async fn test_server_error_is_retryable() {
    let fixture = ContentfulFixture::start().await;
    Mock::given(method("GET"))
        .and(path("/spaces"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"message": "busy"})))
        .mount(fixture.server())
        .await;

    let connector = connector(&fixture, 10);
    let err = connector
        .syncer(ResourceType::Space)
        .list(&CancellationToken::new(), None)
        .await
        .unwrap_err();

    assert!(matches!(err, ConnectorError::Api { status: 503, .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_cancellation_interrupts_slow_request() {
    let fixture = ContentfulFixture::start().await;
    Mock::given(method("GET"))
        .and(path("/spaces"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(collection(vec![space_json("sp1", "Slow")]))
                .set_delay(Duration::from_secs(5))
        )
        .mount(fixture.server())
        .await;

    let connector = connector(&fixture, 10);
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = connector
        .syncer(ResourceType::Space)
        .list(&cancel, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ConnectorError::Cancelled));
}
