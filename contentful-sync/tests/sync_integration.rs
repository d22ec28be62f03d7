use contentful_sync::{Connector, ConnectorConfig, ConnectorError, SyncRunner};
use testing::{
    ContentfulFixture, organization_json, organization_membership_json, role_json, space_json,
    space_membership_json, team_json, team_membership_json, user_json
};
use tokio_util::sync::CancellationToken;

fn connector(fixture: &ContentfulFixture) -> Connector {
    let config = ConnectorConfig::builder()
        .api_token("test-token")
        .organization_id(fixture.organization_id())
        .base_url(fixture.uri())
        .page_size(2)
        .build()
        .unwrap();
    Connector::new(&config).unwrap()
}

async fn mount_organization(fixture: &ContentfulFixture) {
    let org = fixture.organization_id().to_string();
    fixture
        .mount_pages("/organizations", vec![organization_json(&org, "Acme")], 2)
        .await;
    fixture
        .mount_pages(
            &fixture.organization_path("/users"),
            vec![
                user_json("u1", "Ada", "Lovelace", "ada@example.com"),
                user_json("u2", "Grace", "Hopper", "grace@example.com"),
                user_json("u3", "Alan", "Turing", "alan@example.com"),
            ],
            2
        )
        .await;
    fixture
        .mount_pages(
            &fixture.organization_path("/organization_memberships"),
            vec![
                organization_membership_json("om1", "u1", "owner"),
                organization_membership_json("om2", "u2", "developer"),
                organization_membership_json("om3", "u3", "member"),
            ],
            2
        )
        .await;
    fixture
        .mount_pages(
            &fixture.organization_path("/teams"),
            vec![team_json("t1", "Editors", Some("Content editors"))],
            2
        )
        .await;
    fixture
        .mount_pages(
            &fixture.organization_path("/teams/t1/team_memberships"),
            vec![team_membership_json("tm1", "t1", "u2", "om2")],
            2
        )
        .await;
    fixture
        .mount_pages(
            "/spaces",
            vec![space_json("sp1", "Marketing"), space_json("sp2", "Docs")],
            2
        )
        .await;
    // Read by both the space entitlement walk and the role cache fill.
    fixture
        .mount_pages(
            &fixture.organization_path("/roles"),
            vec![
                role_json("r1", "Editor", Some("sp1")),
                role_json("r2", "Translator", Some("sp2")),
            ],
            2
        )
        .await;
}

#[tokio::test]
async fn test_full_sync_collects_every_kind() {
    let fixture = ContentfulFixture::start().await;
    mount_organization(&fixture).await;
    fixture
        .mount_pages(
            "/spaces/sp1/space_memberships",
            vec![
                space_membership_json("sm1", "u1", true, &[]),
                space_membership_json("sm2", "u2", false, &["r1"]),
            ],
            2
        )
        .await;
    fixture
        .mount_pages(
            "/spaces/sp2/space_memberships",
            vec![space_membership_json("sm3", "u3", false, &["r2"])],
            2
        )
        .await;

    let connector = connector(&fixture);
    let snapshot = SyncRunner::new(&connector)
        .run(&CancellationToken::new())
        .await
        .unwrap();

    let report = &snapshot.report;
    assert!(!report.has_errors(), "unexpected errors: {:?}", report.errors);
    assert!(report.completed_at.is_some());
    // 3 users, 1 organization, 1 team, 2 spaces
    assert_eq!(report.resources_synced, 7);
    // 4 organization roles, 1 team member, Editor+admin for sp1, Translator+admin for sp2
    assert_eq!(report.entitlements_synced, 9);
    // 3 organization memberships, 1 team membership, 2 + 1 space grants
    assert_eq!(report.grants_synced, 7);

    assert!(
        snapshot
            .grants
            .iter()
            .any(|g| g.id == "space:sp2:Translator:user:u3")
    );
    assert!(connector.role_cache().is_filled("sp1"));
    assert!(connector.role_cache().is_filled("sp2"));
}

#[tokio::test]
async fn test_failed_grant_walk_is_recorded_and_sync_continues() {
    let fixture = ContentfulFixture::start().await;
    mount_organization(&fixture).await;
    fixture
        .mount_pages(
            "/spaces/sp1/space_memberships",
            vec![space_membership_json("sm1", "u1", false, &["r-missing"])],
            2
        )
        .await;
    fixture
        .mount_pages(
            "/spaces/sp2/space_memberships",
            vec![space_membership_json("sm3", "u3", false, &["r2"])],
            2
        )
        .await;

    let connector = connector(&fixture);
    let snapshot = SyncRunner::new(&connector)
        .run(&CancellationToken::new())
        .await
        .unwrap();

    let report = &snapshot.report;
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].entity_type, "space");
    assert_eq!(report.errors[0].entity_id, "sp1");
    assert!(
        snapshot
            .grants
            .iter()
            .any(|g| g.id == "space:sp2:Translator:user:u3")
    );
}

#[tokio::test]
async fn test_cancelled_sync_stops() {
    let fixture = ContentfulFixture::start().await;
    let connector = connector(&fixture);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = SyncRunner::new(&connector).run(&cancel).await.unwrap_err();
    assert!(matches!(err, ConnectorError::Cancelled));
}
