use serde_json::{Value, json};
use std::sync::atomic::{AtomicU32, Ordering};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

pub fn unique_id(prefix: &str) -> String {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{}-{}", prefix, id)
}

/// Mock Contentful Management API bound to one organization.
pub struct ContentfulFixture {
    server: MockServer,
    organization_id: String
}

impl ContentfulFixture {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let organization_id = unique_id("org");
        tracing::debug!("Contentful mock server started at {}", server.uri());
        Self {
            server,
            organization_id
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn server(&self) -> &MockServer {
        &self.server
    }

    pub fn organization_id(&self) -> &str {
        &self.organization_id
    }

    pub fn organization_path(&self, suffix: &str) -> String {
        format!("/organizations/{}{}", self.organization_id, suffix)
    }

    /// Serves `items` in `page_size` chunks keyed by `skip`, followed by an
    /// empty page at the end offset.
    pub async fn mount_pages(&self, endpoint: &str, items: Vec<Value>, page_size: usize) {
        self.mount_paged(endpoint, None, items, page_size, None).await;
    }

    /// Like [`Self::mount_pages`], but every page, the trailing empty one
    /// included, must be fetched exactly once.
    pub async fn mount_pages_once(&self, endpoint: &str, items: Vec<Value>, page_size: usize) {
        self.mount_paged(endpoint, None, items, page_size, Some(1)).await;
    }

    /// Paged lookup: like [`Self::mount_pages`], but only answers requests
    /// where `key` equals `value`.
    pub async fn mount_lookup_pages(
        &self,
        endpoint: &str,
        key: &str,
        value: &str,
        items: Vec<Value>,
        page_size: usize
    ) {
        self.mount_paged(endpoint, Some((key, value)), items, page_size, None)
            .await;
    }

    async fn mount_paged(
        &self,
        endpoint: &str,
        filter: Option<(&str, &str)>,
        items: Vec<Value>,
        page_size: usize,
        expected: Option<u64>
    ) {
        let page_size = page_size.max(1);
        let total = items.len();

        for (index, chunk) in items.chunks(page_size).enumerate() {
            let skip = index * page_size;
            let body = paged_collection(chunk.to_vec(), total, skip);
            self.mount_page(endpoint, filter, skip, body, expected).await;
        }
        let body = paged_collection(Vec::new(), total, total);
        self.mount_page(endpoint, filter, total, body, expected).await;
    }

    async fn mount_page(
        &self,
        endpoint: &str,
        filter: Option<(&str, &str)>,
        skip: usize,
        body: Value,
        expected: Option<u64>
    ) {
        let mut mock = Mock::given(method("GET"))
            .and(path(endpoint))
            .and(query_param("skip", skip.to_string()));
        if let Some((key, value)) = filter {
            mock = mock.and(query_param(key, value));
        }
        let mut mock = mock.respond_with(ResponseTemplate::new(200).set_body_json(body));
        if let Some(n) = expected {
            mock = mock.expect(n);
        }
        mock.mount(&self.server).await;
    }

    /// Answers a filtered lookup (no paging) on `endpoint` where `key` equals `value`.
    pub async fn mount_lookup(&self, endpoint: &str, key: &str, value: &str, items: Vec<Value>) {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .and(query_param(key, value))
            .respond_with(ResponseTemplate::new(200).set_body_json(collection(items)))
            .mount(&self.server)
            .await;
    }
}

pub fn collection(items: Vec<Value>) -> Value {
    let total = items.len();
    paged_collection(items, total, 0)
}

fn paged_collection(items: Vec<Value>, total: usize, skip: usize) -> Value {
    json!({
        "sys": {"type": "Array"},
        "total": total,
        "skip": skip,
        "limit": items.len(),
        "items": items
    })
}

pub fn link(link_type: &str, id: &str) -> Value {
    json!({"sys": {"type": "Link", "linkType": link_type, "id": id}})
}

pub fn organization_json(id: &str, name: &str) -> Value {
    json!({"name": name, "sys": {"type": "Organization", "id": id}})
}

pub fn space_json(id: &str, name: &str) -> Value {
    json!({"name": name, "sys": {"type": "Space", "id": id}})
}

pub fn team_json(id: &str, name: &str, description: Option<&str>) -> Value {
    json!({
        "name": name,
        "description": description,
        "sys": {"type": "Team", "id": id}
    })
}

pub fn user_json(id: &str, first_name: &str, last_name: &str, email: &str) -> Value {
    json!({
        "firstName": first_name,
        "lastName": last_name,
        "email": email,
        "activated": true,
        "confirmed": true,
        "2faEnabled": false,
        "sys": {
            "type": "User",
            "id": id,
            "createdAt": "2024-01-15T10:00:00Z"
        }
    })
}

/// Role scoped to `space_id`; `None` produces a role without a space link.
pub fn role_json(id: &str, name: &str, space_id: Option<&str>) -> Value {
    let mut sys = json!({"type": "Role", "id": id});
    if let Some(space_id) = space_id {
        sys["space"] = link("Space", space_id);
    }
    json!({"name": name, "description": null, "sys": sys})
}

pub fn organization_membership_json(id: &str, user_id: &str, role: &str) -> Value {
    json!({
        "role": role,
        "sys": {
            "type": "OrganizationMembership",
            "id": id,
            "user": link("User", user_id),
            "lastActiveAt": "2024-06-01T08:30:00Z"
        }
    })
}

pub fn space_membership_json(id: &str, user_id: &str, admin: bool, role_ids: &[&str]) -> Value {
    let roles: Vec<Value> = role_ids.iter().map(|r| link("Role", r)).collect();
    json!({
        "admin": admin,
        "roles": roles,
        "sys": {
            "type": "SpaceMembership",
            "id": id,
            "user": link("User", user_id)
        }
    })
}

pub fn team_membership_json(
    id: &str,
    team_id: &str,
    user_id: &str,
    organization_membership_id: &str
) -> Value {
    json!({
        "sys": {
            "type": "TeamMembership",
            "id": id,
            "team": link("Team", team_id),
            "user": link("User", user_id),
            "organizationMembership": link("OrganizationMembership", organization_membership_id)
        }
    })
}

pub fn invitation_json(id: &str, invitation_url: &str) -> Value {
    json!({
        "sys": {
            "type": "Invitation",
            "id": id,
            "invitationUrl": invitation_url
        }
    })
}
