use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use orgscope_core::{DeptId, Entity, Hierarchical};

/// A department row.
///
/// Deletion is a soft flag; deleted departments stay in storage but are
/// excluded from trees and cannot become parents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dept {
    pub id: DeptId,
    /// [`DeptId`] 0 for top-level departments.
    pub parent_id: DeptId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leader: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub sort: i32,
    pub enabled: bool,
    #[serde(default)]
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Dept {
    pub fn new(id: DeptId, parent_id: DeptId, name: impl Into<String>, sort: i32) -> Self {
        let now = Utc::now();
        Self {
            id,
            parent_id,
            name: name.into(),
            leader: None,
            phone: None,
            sort,
            enabled: true,
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_leader(mut self, leader: impl Into<String>, phone: Option<String>) -> Self {
        self.leader = Some(leader.into());
        self.phone = phone;
        self
    }

    pub fn is_top_level(&self) -> bool {
        self.parent_id == DeptId::new(0)
    }

    /// Live departments are the ones hierarchy queries see.
    pub fn is_live(&self) -> bool {
        !self.deleted
    }

    pub fn mark_deleted(&mut self, at: DateTime<Utc>) {
        self.deleted = true;
        self.updated_at = at;
    }

    pub fn reparent(&mut self, parent_id: DeptId, at: DateTime<Utc>) {
        self.parent_id = parent_id;
        self.updated_at = at;
    }
}

impl Entity for Dept {
    type Id = DeptId;

    fn id(&self) -> &DeptId {
        &self.id
    }
}

impl Hierarchical for Dept {
    fn parent_id(&self) -> &DeptId {
        &self.parent_id
    }

    fn sort_key(&self) -> i32 {
        self.sort
    }
}
