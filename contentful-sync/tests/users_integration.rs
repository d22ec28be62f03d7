use contentful_sync::sync::list_all;
use contentful_sync::users::{AccountInfo, CreateAccountResponse, CredentialOption};
use contentful_sync::{Connector, ConnectorConfig, ConnectorError, ResourceType};
use serde_json::json;
use std::time::Duration;
use testing::{
    ContentfulFixture, collection, invitation_json, organization_membership_json, user_json
};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

fn connector(fixture: &ContentfulFixture) -> Connector {
    let config = ConnectorConfig::builder()
        .api_token("test-token")
        .organization_id(fixture.organization_id())
        .base_url(fixture.uri())
        .page_size(10)
        .build()
        .unwrap();
    Connector::new(&config).unwrap()
}

fn account(profile: serde_json::Value) -> AccountInfo {
    AccountInfo {
        login: "grace@example.com".to_string(),
        profile: profile.as_object().cloned().unwrap()
    }
}

#[tokio::test]
async fn test_users_carry_profile_and_last_activity() {
    let fixture = ContentfulFixture::start().await;
    fixture
        .mount_pages_once(
            &fixture.organization_path("/users"),
            vec![
                user_json("u1", "Ada", "Lovelace", "ada@example.com"),
                user_json("u2", "Grace", "Hopper", "grace@example.com"),
            ],
            10
        )
        .await;
    fixture
        .mount_lookup(
            &fixture.organization_path("/organization_memberships"),
            "sys.user.sys.id[eq]",
            "u1",
            vec![organization_membership_json("om1", "u1", "owner")]
        )
        .await;

    let connector = connector(&fixture);
    let users = list_all(connector.syncer(ResourceType::User), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(users.len(), 2);
    assert_eq!(users[0].display_name, "Ada Lovelace");

    let ada = users[0].user_profile().unwrap();
    assert_eq!(ada.email, "ada@example.com");
    assert!(ada.created_at.is_some());
    assert!(ada.last_active_at.is_some());

    // No membership mock for u2: the lookup 404s and the user is still listed.
    let grace = users[1].user_profile().unwrap();
    assert!(grace.last_active_at.is_none());
}

#[tokio::test]
async fn test_cancel_during_last_activity_lookup_fails_page() {
    let fixture = ContentfulFixture::start().await;
    fixture
        .mount_pages(
            &fixture.organization_path("/users"),
            vec![user_json("u1", "Ada", "Lovelace", "ada@example.com")],
            10
        )
        .await;
    Mock::given(method("GET"))
        .and(path(fixture.organization_path("/organization_memberships")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(collection(vec![organization_membership_json("om1", "u1", "owner")]))
                .set_delay(Duration::from_secs(3))
        )
        .mount(fixture.server())
        .await;

    let connector = connector(&fixture);
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let err = connector
        .syncer(ResourceType::User)
        .list(&cancel, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ConnectorError::Cancelled));
}

#[tokio::test]
async fn test_users_have_no_entitlements() {
    let fixture = ContentfulFixture::start().await;
    let connector = connector(&fixture);
    let user = contentful_sync::Resource::user("u1", Default::default());

    let page = connector
        .syncer(ResourceType::User)
        .entitlements(&CancellationToken::new(), &user, None)
        .await
        .unwrap();
    assert!(page.items.is_empty());
    assert!(page.next_cursor.is_none());
}

#[tokio::test]
async fn test_create_account_sends_invitation() {
    let fixture = ContentfulFixture::start().await;
    Mock::given(method("POST"))
        .and(path(fixture.organization_path("/invitations")))
        .and(body_partial_json(json!({
            "email": "grace@example.com",
            "firstName": "Grace",
            "lastName": "Hopper",
            "role": "developer"
        })))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(invitation_json("inv1", "https://app.contentful.com/invitations/inv1"))
        )
        .expect(1)
        .mount(fixture.server())
        .await;

    let connector = connector(&fixture);
    let response = connector
        .users()
        .create_account(
            &CancellationToken::new(),
            &account(json!({"firstName": "Grace", "lastName": "Hopper", "role": "developer"}))
        )
        .await
        .unwrap();

    assert_eq!(
        response,
        CreateAccountResponse::ActionRequired {
            message: "https://app.contentful.com/invitations/inv1".to_string()
        }
    );
}

#[tokio::test]
async fn test_create_account_validates_before_posting() {
    let fixture = ContentfulFixture::start().await;
    let connector = connector(&fixture);

    let err = connector
        .users()
        .create_account(
            &CancellationToken::new(),
            &account(json!({"firstName": "Grace", "lastName": "Hopper"}))
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ConnectorError::InvalidAccountInfo(_)));
    assert!(fixture.server().received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_account_capability_is_invitation_only() {
    let fixture = ContentfulFixture::start().await;
    let connector = connector(&fixture);
    let capability = connector.users().account_capability();

    assert_eq!(capability.supported_credentials, vec![CredentialOption::NoPassword]);
    assert_eq!(capability.preferred_credential, CredentialOption::NoPassword);
}
