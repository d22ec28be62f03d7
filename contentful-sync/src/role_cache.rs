//! Per-space role id <-> role name lookups.
//!
//! The first lookup for a space walks every role page and fills both
//! directions; later lookups for that space are answered from memory. Each
//! space has its own single-fill latch, so concurrent callers for the same
//! space share one walk while other spaces fill independently. A failed walk
//! leaves the latch empty and the next caller starts over.
//!
//! The synthetic `admin` role never enters the cache; callers compare against
//! [`SPACE_ADMIN`](crate::spaces::SPACE_ADMIN) before looking anything up.

use crate::client::ContentfulApi;
use crate::error::{ConnectorError, ConnectorResult};
use dashmap::DashMap;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedRole {
    pub id: String,
    pub name: String
}

/// Roles of one space in listing order.
#[derive(Debug, Default)]
pub struct SpaceRoles {
    roles: Vec<CachedRole>,
    by_id: HashMap<String, usize>,
    by_name: HashMap<String, usize>
}

impl SpaceRoles {
    fn insert(&mut self, space_id: &str, id: String, name: String) {
        if self.by_id.contains_key(&id) {
            return;
        }
        let index = self.roles.len();
        match self.by_name.entry(name.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(index);
            }
            Entry::Occupied(first) => {
                warn!(
                    space_id = %space_id,
                    role_name = %name,
                    kept_role_id = %self.roles[*first.get()].id,
                    ignored_role_id = %id,
                    "Duplicate role name in space, name lookups resolve to the first role"
                );
            }
        }
        self.by_id.insert(id.clone(), index);
        self.roles.push(CachedRole { id, name });
    }

    pub fn name_of(&self, role_id: &str) -> Option<&str> {
        self.by_id
            .get(role_id)
            .map(|&i| self.roles[i].name.as_str())
    }

    pub fn id_of(&self, role_name: &str) -> Option<&str> {
        self.by_name
            .get(role_name)
            .map(|&i| self.roles[i].id.as_str())
    }

    pub fn roles(&self) -> &[CachedRole] {
        &self.roles
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

type Latch = Arc<OnceCell<Arc<SpaceRoles>>>;

pub struct RoleCache {
    client: Arc<dyn ContentfulApi>,
    spaces: DashMap<String, Latch>
}

impl RoleCache {
    pub fn new(client: Arc<dyn ContentfulApi>) -> Self {
        Self {
            client,
            spaces: DashMap::new()
        }
    }

    pub async fn resolve_name(
        &self,
        cancel: &CancellationToken,
        space_id: &str,
        role_id: &str
    ) -> ConnectorResult<String> {
        let roles = self.roles(cancel, space_id).await?;
        roles
            .name_of(role_id)
            .map(str::to_string)
            .ok_or_else(|| ConnectorError::RoleNotFound {
                space_id: space_id.to_string(),
                role: role_id.to_string()
            })
    }

    pub async fn resolve_id(
        &self,
        cancel: &CancellationToken,
        space_id: &str,
        role_name: &str
    ) -> ConnectorResult<String> {
        let roles = self.roles(cancel, space_id).await?;
        roles
            .id_of(role_name)
            .map(str::to_string)
            .ok_or_else(|| ConnectorError::RoleNotFound {
                space_id: space_id.to_string(),
                role: role_name.to_string()
            })
    }

    /// All roles of `space_id`, filling the space on first use.
    pub async fn roles(
        &self,
        cancel: &CancellationToken,
        space_id: &str
    ) -> ConnectorResult<Arc<SpaceRoles>> {
        let latch = self.latch(space_id);
        let roles = latch
            .get_or_try_init(|| self.fill(cancel, space_id))
            .await?;
        Ok(Arc::clone(roles))
    }

    /// Whether `space_id` has been filled during this session.
    pub fn is_filled(&self, space_id: &str) -> bool {
        self.spaces
            .get(space_id)
            .is_some_and(|latch| latch.initialized())
    }

    fn latch(&self, space_id: &str) -> Latch {
        if let Some(latch) = self.spaces.get(space_id) {
            return Arc::clone(latch.value());
        }
        let entry = self.spaces.entry(space_id.to_string()).or_default();
        Arc::clone(entry.value())
    }

    async fn fill(
        &self,
        cancel: &CancellationToken,
        space_id: &str
    ) -> ConnectorResult<Arc<SpaceRoles>> {
        let mut roles = SpaceRoles::default();
        let mut offset = 0u32;

        loop {
            let page = self.client.list_roles(cancel, offset).await?;
            if page.is_empty() {
                break;
            }
            offset += page.items.len() as u32;

            for role in page.items {
                if role.space_id().is_some_and(|id| id != space_id) {
                    continue;
                }
                roles.insert(space_id, role.sys.id, role.name);
            }
        }

        debug!(space_id = %space_id, roles = roles.len(), "Filled role cache");
        Ok(Arc::new(roles))
    }
}
