use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum MemberStatus {
    Active,
    Inactive,
    New,
}

/// Derived roles, additive and non-exclusive. Never edited by hand: the
/// cached set on a member must always equal `roles::compute` for the
/// current group graph.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    Leader,
    Worker,
    GeneralAttendee,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::Leader => "Leader",
            Role::Worker => "Worker",
            Role::GeneralAttendee => "General Attendee",
        };
        write!(f, "{}", s)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: Uuid,
    pub name: String,
    pub status: MemberStatus,
    /// Single small-group membership; a member belongs to at most one
    /// small group at a time (guides point at the group they guide).
    pub assigned_group_id: Option<Uuid>,
    /// Ministry-area memberships; multi-area membership is legal.
    pub assigned_area_ids: BTreeSet<Uuid>,
    /// Derived role cache, recomputed on every membership mutation.
    pub roles: BTreeSet<Role>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
