use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Member, MinistryArea, Role, SmallGroup};

/// Derive a member's roles from the current group graph. Pure: the result
/// depends only on the arguments, and the member's cached `roles` field is
/// ignored.
pub fn compute(member: &Member, groups: &[SmallGroup], areas: &[MinistryArea]) -> BTreeSet<Role> {
    let is_group_member = member.assigned_group_id.is_some();
    let is_guide = groups.iter().any(|g| g.guide.is_held_by(member.id));
    let is_area_leader = areas.iter().any(|a| a.leader.is_held_by(member.id));
    let is_area_participant = areas
        .iter()
        .any(|a| a.member_ids.contains(&member.id) && !a.leader.is_held_by(member.id));

    let mut roles = BTreeSet::new();
    if is_group_member {
        roles.insert(Role::GeneralAttendee);
    }
    if is_guide || is_area_leader || is_area_participant {
        roles.insert(Role::Worker);
    }
    if is_guide || is_area_leader {
        roles.insert(Role::Leader);
    }
    roles
}

/// Refresh the cached role set for exactly the touched members. Every
/// membership mutation must pass the full set of member ids it touched
/// (old officer, new officer, evicted and added/removed members) so no
/// stale cache survives the write.
pub fn recompute(
    members: &mut [Member],
    touched: &BTreeSet<Uuid>,
    groups: &[SmallGroup],
    areas: &[MinistryArea],
    now: DateTime<Utc>,
) {
    for i in 0..members.len() {
        if !touched.contains(&members[i].id) {
            continue;
        }
        let fresh = compute(&members[i], groups, areas);
        if members[i].roles != fresh {
            members[i].roles = fresh;
            members[i].updated_at = now;
        }
    }
}
