use std::collections::BTreeSet;

use uuid::Uuid;

use crate::models::{
    Meeting, MeetingSeries, Member, MinistryArea, Role, SeriesKind, SmallGroup, TargetGroup,
};

/// Resolve the members expected at a meeting. Pure; sorted by display name
/// (id as tiebreak) for deterministic output.
///
/// General series with role targets resolve from the snapshot frozen at
/// generation time, so a later role change never rewrites who was expected
/// at a past meeting. Group-owned series resolve live from today's roster,
/// past instances included: group meetings serve operational follow-up,
/// not historical audit.
pub fn resolve(
    meeting: &Meeting,
    series: &[MeetingSeries],
    members: &[Member],
    groups: &[SmallGroup],
    areas: &[MinistryArea],
) -> Vec<Member> {
    let owning = meeting
        .series_id
        .and_then(|id| series.iter().find(|s| s.id == id));
    let Some(owning) = owning else {
        return from_snapshot(meeting, members);
    };

    match &owning.kind {
        SeriesKind::General { targets } => {
            if targets.contains(&TargetGroup::AllMembers) {
                // an all-members meeting means everyone on the current roll
                sorted(members.to_vec())
            } else {
                from_snapshot(meeting, members)
            }
        }
        SeriesKind::SmallGroup { group_id } => match groups.iter().find(|g| g.id == *group_id) {
            Some(group) => roster(group.guide.holder(), &group.member_ids, members),
            None => from_snapshot(meeting, members),
        },
        SeriesKind::MinistryArea { area_id } => match areas.iter().find(|a| a.id == *area_id) {
            Some(area) => roster(area.leader.holder(), &area.member_ids, members),
            None => from_snapshot(meeting, members),
        },
    }
}

/// The attendee ids to freeze onto a new instance: `Some` for general
/// series (targets expanded against current roles), `None` for group-owned
/// series, which never store a snapshot.
pub fn snapshot_for(series: &MeetingSeries, members: &[Member]) -> Option<Vec<Uuid>> {
    match &series.kind {
        SeriesKind::General { targets } => {
            let chosen: Vec<Member> = members
                .iter()
                .filter(|m| is_targeted(m, targets))
                .cloned()
                .collect();
            Some(sorted(chosen).into_iter().map(|m| m.id).collect())
        }
        SeriesKind::SmallGroup { .. } | SeriesKind::MinistryArea { .. } => None,
    }
}

fn is_targeted(member: &Member, targets: &BTreeSet<TargetGroup>) -> bool {
    targets.iter().any(|target| match target {
        TargetGroup::AllMembers => true,
        TargetGroup::Workers => member.roles.contains(&Role::Worker),
        TargetGroup::Leaders => member.roles.contains(&Role::Leader),
    })
}

fn from_snapshot(meeting: &Meeting, members: &[Member]) -> Vec<Member> {
    match &meeting.attendee_snapshot {
        Some(ids) => {
            let wanted: BTreeSet<Uuid> = ids.iter().copied().collect();
            let chosen = members
                .iter()
                .filter(|m| wanted.contains(&m.id))
                .cloned()
                .collect();
            sorted(chosen)
        }
        None => Vec::new(),
    }
}

fn roster(officer: Option<Uuid>, member_ids: &BTreeSet<Uuid>, members: &[Member]) -> Vec<Member> {
    let mut expected = member_ids.clone();
    if let Some(id) = officer {
        expected.insert(id);
    }
    let chosen = members
        .iter()
        .filter(|m| expected.contains(&m.id))
        .cloned()
        .collect();
    sorted(chosen)
}

fn sorted(mut members: Vec<Member>) -> Vec<Member> {
    members.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    members
}
