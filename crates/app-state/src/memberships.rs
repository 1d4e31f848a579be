//! Membership applications
//!
//! Members see their own applications; admins see every application,
//! optionally narrowed to one status. Both lists are updated in place after a
//! successful write instead of being refetched.

use api_client::{Membership, MembershipDraft, MembershipStatus, MembershipStatusUpdate, NewsApi};
use async_trait::async_trait;
use networking::FetchError;
use storage::keys;

use crate::sync::{Resource, Result, Synchronizer};

/// Which list of applications a resource tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipScope {
    /// The signed-in user's applications
    Mine,
    /// Admin view, optionally filtered by status
    Admin(Option<MembershipStatus>),
}

/// A change to an application list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipMutation {
    /// Submit a new application
    Create(MembershipDraft),
    /// Approve or reject an application
    SetStatus {
        /// Application id
        id: String,
        /// Decision
        update: MembershipStatusUpdate,
    },
}

/// Membership list resource
#[derive(Debug, Clone)]
pub struct MembershipsResource {
    api: NewsApi,
    scope: MembershipScope,
}

impl MembershipsResource {
    /// Create a resource for a scope
    pub fn new(api: NewsApi, scope: MembershipScope) -> Self {
        Self { api, scope }
    }

    /// The tracked scope
    pub fn scope(&self) -> MembershipScope {
        self.scope
    }

    fn admits(&self, membership: &Membership) -> bool {
        match self.scope {
            MembershipScope::Admin(Some(status)) => membership.status == status,
            _ => true,
        }
    }
}

#[async_trait]
impl Resource for MembershipsResource {
    type Value = Vec<Membership>;
    type Mutation = MembershipMutation;

    fn name(&self) -> &'static str {
        match self.scope {
            MembershipScope::Mine => "memberships",
            MembershipScope::Admin(_) => "admin_memberships",
        }
    }

    fn cache_key(&self) -> String {
        match self.scope {
            MembershipScope::Mine => keys::MEMBERSHIPS.to_string(),
            MembershipScope::Admin(status) => keys::admin_memberships(status.map(|s| s.as_str())),
        }
    }

    async fn fetch(&self) -> std::result::Result<Vec<Membership>, FetchError> {
        match self.scope {
            MembershipScope::Mine => self.api.memberships().await,
            MembershipScope::Admin(status) => self.api.admin_memberships(status).await,
        }
    }

    async fn apply(
        &self,
        current: Option<Vec<Membership>>,
        mutation: &MembershipMutation,
    ) -> std::result::Result<Vec<Membership>, FetchError> {
        let mut list = current.unwrap_or_default();

        match mutation {
            MembershipMutation::Create(draft) => {
                let created = self.api.create_membership(draft).await?;
                list.retain(|m| m.id != created.id);
                if self.admits(&created) {
                    list.insert(0, created);
                }
            }
            MembershipMutation::SetStatus { id, update } => {
                let changed = self.api.set_membership_status(id, update).await?;
                let position = list.iter().position(|m| m.id == changed.id);
                match position {
                    Some(index) if self.admits(&changed) => list[index] = changed,
                    Some(index) => {
                        list.remove(index);
                    }
                    None if self.admits(&changed) => list.insert(0, changed),
                    None => {}
                }
            }
        }

        Ok(list)
    }

    fn touched_fields(&self, mutation: &MembershipMutation) -> Vec<&'static str> {
        match mutation {
            MembershipMutation::Create(_) => vec!["memberships"],
            MembershipMutation::SetStatus { .. } => vec!["status"],
        }
    }
}

/// Synchronizer for a membership list
pub type MembershipsSync = Synchronizer<MembershipsResource>;

impl Synchronizer<MembershipsResource> {
    /// Submit an application
    pub async fn apply_for(&self, draft: MembershipDraft) -> Result<Option<Vec<Membership>>> {
        self.update(MembershipMutation::Create(draft)).await
    }

    /// Approve an application
    pub async fn approve(&self, id: impl Into<String>, remarks: Option<String>) -> Result<Option<Vec<Membership>>> {
        self.set_status(id, MembershipStatus::Approved, remarks).await
    }

    /// Reject an application
    pub async fn reject(&self, id: impl Into<String>, remarks: Option<String>) -> Result<Option<Vec<Membership>>> {
        self.set_status(id, MembershipStatus::Rejected, remarks).await
    }

    async fn set_status(
        &self,
        id: impl Into<String>,
        status: MembershipStatus,
        remarks: Option<String>,
    ) -> Result<Option<Vec<Membership>>> {
        self.update(MembershipMutation::SetStatus {
            id: id.into(),
            update: MembershipStatusUpdate { status, remarks },
        })
        .await
    }

    /// Application from the in-memory list
    pub fn find(&self, id: &str) -> Option<Membership> {
        self.value()?.into_iter().find(|m| m.id == id)
    }
}
