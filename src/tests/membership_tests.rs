use crate::models::{AuditAction, MemberStatus, Office, Role};
use crate::storage::RecordStore;
use crate::{InMemoryAuditLogger, InMemoryStore, ParishError, ParishService};
use env_logger;
use std::collections::BTreeSet;
use uuid::Uuid;

#[test]
fn test_set_member_status() {
    let _ = env_logger::try_init();
    let mut storage = InMemoryStore::new();
    let mut audit_logger = InMemoryAuditLogger::new();
    let mut service = ParishService::new(&mut storage, &mut audit_logger);

    let m = service
        .create_member("Ana".to_string(), MemberStatus::New)
        .unwrap();
    let updated = service
        .set_member_status(m.id, MemberStatus::Active)
        .unwrap();
    assert_eq!(updated.status, MemberStatus::Active);
    assert!(updated.updated_at > updated.created_at);

    let result = service.set_member_status(Uuid::new_v4(), MemberStatus::Inactive);
    assert!(matches!(result, Err(ParishError::MemberNotFound(_))));

    let members = storage.load_members().unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].status, MemberStatus::Active);

    // the failed call logged nothing
    let logs = audit_logger.get_logs();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs.last().unwrap().action, AuditAction::SetMemberStatus);
}

#[test]
fn test_reassign_guide_between_groups() {
    let _ = env_logger::try_init();
    let mut storage = InMemoryStore::new();
    let mut audit_logger = InMemoryAuditLogger::new();
    let mut service = ParishService::new(&mut storage, &mut audit_logger);

    let a = service
        .create_member("Ana".to_string(), MemberStatus::Active)
        .unwrap();
    let b = service
        .create_member("Ben".to_string(), MemberStatus::Active)
        .unwrap();
    let c = service
        .create_member("Cara".to_string(), MemberStatus::Active)
        .unwrap();
    let alpha = service
        .create_small_group(
            "Alpha".to_string(),
            Some(a.id),
            BTreeSet::from([b.id, c.id]),
        )
        .unwrap();
    let beta = service
        .create_small_group("Beta".to_string(), None, BTreeSet::new())
        .unwrap();

    service.assign_guide(beta.id, a.id).unwrap();

    let groups = storage.load_small_groups().unwrap();
    let alpha = groups.iter().find(|g| g.id == alpha.id).unwrap();
    let beta = groups.iter().find(|g| g.id == beta.id).unwrap();
    assert!(alpha.guide.is_vacant());
    assert_eq!(alpha.member_ids, BTreeSet::from([b.id, c.id]));
    assert_eq!(beta.guide, Office::Holder(a.id));
    assert!(!beta.member_ids.contains(&a.id));

    let members = storage.load_members().unwrap();
    let a = members.iter().find(|m| m.id == a.id).unwrap();
    let b = members.iter().find(|m| m.id == b.id).unwrap();
    let c = members.iter().find(|m| m.id == c.id).unwrap();
    assert_eq!(a.assigned_group_id, Some(beta.id));
    assert_eq!(
        a.roles,
        BTreeSet::from([Role::Leader, Role::Worker, Role::GeneralAttendee])
    );
    assert_eq!(b.roles, BTreeSet::from([Role::GeneralAttendee]));
    assert_eq!(c.roles, BTreeSet::from([Role::GeneralAttendee]));

    let logs = audit_logger.get_logs();
    assert_eq!(logs.len(), 6);
    assert_eq!(logs[5].action, AuditAction::AssignGuide);
}

#[test]
fn test_guide_seat_is_unique_across_groups() {
    let _ = env_logger::try_init();
    let mut storage = InMemoryStore::new();
    let mut audit_logger = InMemoryAuditLogger::new();
    let mut service = ParishService::new(&mut storage, &mut audit_logger);

    let m = service
        .create_member("Ana".to_string(), MemberStatus::Active)
        .unwrap();
    let g1 = service
        .create_small_group("Alpha".to_string(), Some(m.id), BTreeSet::new())
        .unwrap();
    let g2 = service
        .create_small_group("Beta".to_string(), None, BTreeSet::new())
        .unwrap();
    let g3 = service
        .create_small_group("Gamma".to_string(), None, BTreeSet::new())
        .unwrap();

    service.assign_guide(g2.id, m.id).unwrap();
    service.assign_guide(g3.id, m.id).unwrap();
    service.assign_guide(g2.id, m.id).unwrap();

    let groups = storage.load_small_groups().unwrap();
    let holding: Vec<Uuid> = groups
        .iter()
        .filter(|g| g.guide.is_held_by(m.id))
        .map(|g| g.id)
        .collect();
    assert_eq!(holding, vec![g2.id]);
    assert!(groups.iter().find(|g| g.id == g1.id).unwrap().guide.is_vacant());
    assert!(groups.iter().find(|g| g.id == g3.id).unwrap().guide.is_vacant());
}

#[test]
fn test_guide_cannot_join_plain_roster() {
    let _ = env_logger::try_init();
    let mut storage = InMemoryStore::new();
    let mut audit_logger = InMemoryAuditLogger::new();
    let mut service = ParishService::new(&mut storage, &mut audit_logger);

    let guide = service
        .create_member("Guide".to_string(), MemberStatus::Active)
        .unwrap();
    service
        .create_small_group("Alpha".to_string(), Some(guide.id), BTreeSet::new())
        .unwrap();
    let bravo = service
        .create_small_group("Bravo".to_string(), None, BTreeSet::new())
        .unwrap();

    let result = service.set_group_members(bravo.id, BTreeSet::from([guide.id]));
    assert!(matches!(result, Err(ParishError::InvariantViolation(_))));

    // rejected before any mutation
    let groups = storage.load_small_groups().unwrap();
    let bravo = groups.iter().find(|g| g.id == bravo.id).unwrap();
    assert!(bravo.member_ids.is_empty());
}

#[test]
fn test_plain_member_moves_between_groups() {
    let _ = env_logger::try_init();
    let mut storage = InMemoryStore::new();
    let mut audit_logger = InMemoryAuditLogger::new();
    let mut service = ParishService::new(&mut storage, &mut audit_logger);

    let m = service
        .create_member("Ana".to_string(), MemberStatus::Active)
        .unwrap();
    let alpha = service
        .create_small_group("Alpha".to_string(), None, BTreeSet::from([m.id]))
        .unwrap();
    let beta = service
        .create_small_group("Beta".to_string(), None, BTreeSet::new())
        .unwrap();

    service
        .set_group_members(beta.id, BTreeSet::from([m.id]))
        .unwrap();

    let groups = storage.load_small_groups().unwrap();
    let alpha = groups.iter().find(|g| g.id == alpha.id).unwrap();
    let beta = groups.iter().find(|g| g.id == beta.id).unwrap();
    assert!(alpha.member_ids.is_empty());
    assert_eq!(beta.member_ids, BTreeSet::from([m.id]));

    let members = storage.load_members().unwrap();
    let m = members.iter().find(|x| x.id == m.id).unwrap();
    assert_eq!(m.assigned_group_id, Some(beta.id));
}

#[test]
fn test_removed_members_get_pointer_cleared() {
    let _ = env_logger::try_init();
    let mut storage = InMemoryStore::new();
    let mut audit_logger = InMemoryAuditLogger::new();
    let mut service = ParishService::new(&mut storage, &mut audit_logger);

    let b = service
        .create_member("Ben".to_string(), MemberStatus::Active)
        .unwrap();
    let c = service
        .create_member("Cara".to_string(), MemberStatus::Active)
        .unwrap();
    let group = service
        .create_small_group("Alpha".to_string(), None, BTreeSet::from([b.id, c.id]))
        .unwrap();

    service
        .set_group_members(group.id, BTreeSet::from([b.id]))
        .unwrap();

    let members = storage.load_members().unwrap();
    let b = members.iter().find(|m| m.id == b.id).unwrap();
    let c = members.iter().find(|m| m.id == c.id).unwrap();
    assert_eq!(b.assigned_group_id, Some(group.id));
    assert_eq!(c.assigned_group_id, None);
    assert!(c.roles.is_empty());
}

#[test]
fn test_vacate_guide() {
    let _ = env_logger::try_init();
    let mut storage = InMemoryStore::new();
    let mut audit_logger = InMemoryAuditLogger::new();
    let mut service = ParishService::new(&mut storage, &mut audit_logger);

    let guide = service
        .create_member("Guide".to_string(), MemberStatus::Active)
        .unwrap();
    let group = service
        .create_small_group("Alpha".to_string(), Some(guide.id), BTreeSet::new())
        .unwrap();

    let updated = service.vacate_guide(group.id).unwrap();
    assert!(updated.guide.is_vacant());

    let members = storage.load_members().unwrap();
    let guide = members.iter().find(|m| m.id == guide.id).unwrap();
    assert_eq!(guide.assigned_group_id, None);
    assert!(guide.roles.is_empty());

    let logs = audit_logger.get_logs();
    assert_eq!(logs.last().unwrap().action, AuditAction::VacateGuide);
}

#[test]
fn test_assign_guide_unknown_ids_abort() {
    let _ = env_logger::try_init();
    let mut storage = InMemoryStore::new();
    let mut audit_logger = InMemoryAuditLogger::new();
    let mut service = ParishService::new(&mut storage, &mut audit_logger);

    let guide = service
        .create_member("Guide".to_string(), MemberStatus::Active)
        .unwrap();
    let group = service
        .create_small_group("Alpha".to_string(), Some(guide.id), BTreeSet::new())
        .unwrap();

    let result = service.assign_guide(group.id, Uuid::new_v4());
    assert!(matches!(result, Err(ParishError::MemberNotFound(_))));
    let result = service.assign_guide(Uuid::new_v4(), guide.id);
    assert!(matches!(result, Err(ParishError::GroupNotFound(_))));

    // nothing was mutated by the failed calls
    let groups = storage.load_small_groups().unwrap();
    let group = groups.iter().find(|g| g.id == group.id).unwrap();
    assert_eq!(group.guide, Office::Holder(guide.id));
}

#[test]
fn test_area_leader_moves_between_areas() {
    let _ = env_logger::try_init();
    let mut storage = InMemoryStore::new();
    let mut audit_logger = InMemoryAuditLogger::new();
    let mut service = ParishService::new(&mut storage, &mut audit_logger);

    let l = service
        .create_member("Lea".to_string(), MemberStatus::Active)
        .unwrap();
    let a1 = service
        .create_ministry_area("Music".to_string(), Some(l.id), BTreeSet::new())
        .unwrap();
    let a2 = service
        .create_ministry_area("Welcome".to_string(), None, BTreeSet::new())
        .unwrap();

    service.assign_area_leader(a2.id, l.id).unwrap();

    let areas = storage.load_ministry_areas().unwrap();
    let a1 = areas.iter().find(|a| a.id == a1.id).unwrap();
    let a2 = areas.iter().find(|a| a.id == a2.id).unwrap();
    assert!(a1.leader.is_vacant());
    assert_eq!(a2.leader, Office::Holder(l.id));

    let members = storage.load_members().unwrap();
    let l = members.iter().find(|m| m.id == l.id).unwrap();
    assert_eq!(l.assigned_area_ids, BTreeSet::from([a2.id]));
}

#[test]
fn test_vacate_area_leader() {
    let _ = env_logger::try_init();
    let mut storage = InMemoryStore::new();
    let mut audit_logger = InMemoryAuditLogger::new();
    let mut service = ParishService::new(&mut storage, &mut audit_logger);

    let lea = service
        .create_member("Lea".to_string(), MemberStatus::Active)
        .unwrap();
    let pia = service
        .create_member("Pia".to_string(), MemberStatus::Active)
        .unwrap();
    let area = service
        .create_ministry_area("Music".to_string(), Some(lea.id), BTreeSet::from([pia.id]))
        .unwrap();

    let updated = service.vacate_area_leader(area.id).unwrap();
    assert!(updated.leader.is_vacant());

    // vacating an already vacant seat is accepted
    let again = service.vacate_area_leader(area.id).unwrap();
    assert!(again.leader.is_vacant());

    let result = service.vacate_area_leader(Uuid::new_v4());
    assert!(matches!(result, Err(ParishError::AreaNotFound(_))));

    let members = storage.load_members().unwrap();
    let lea = members.iter().find(|m| m.id == lea.id).unwrap();
    let pia = members.iter().find(|m| m.id == pia.id).unwrap();
    assert!(lea.assigned_area_ids.is_empty());
    assert!(lea.roles.is_empty());
    assert_eq!(pia.roles, BTreeSet::from([Role::Worker]));

    let logs = audit_logger.get_logs();
    assert_eq!(logs.last().unwrap().action, AuditAction::VacateAreaLeader);
}

#[test]
fn test_multi_area_membership_is_kept() {
    let _ = env_logger::try_init();
    let mut storage = InMemoryStore::new();
    let mut audit_logger = InMemoryAuditLogger::new();
    let mut service = ParishService::new(&mut storage, &mut audit_logger);

    let p = service
        .create_member("Pia".to_string(), MemberStatus::Active)
        .unwrap();
    let a1 = service
        .create_ministry_area("Music".to_string(), None, BTreeSet::new())
        .unwrap();
    let a2 = service
        .create_ministry_area("Welcome".to_string(), None, BTreeSet::new())
        .unwrap();

    service
        .set_area_members(a1.id, BTreeSet::from([p.id]))
        .unwrap();
    service
        .set_area_members(a2.id, BTreeSet::from([p.id]))
        .unwrap();

    let areas = storage.load_ministry_areas().unwrap();
    assert!(areas.iter().all(|a| a.member_ids.contains(&p.id)));

    let members = storage.load_members().unwrap();
    let p = members.iter().find(|m| m.id == p.id).unwrap();
    assert_eq!(p.assigned_area_ids, BTreeSet::from([a1.id, a2.id]));
    assert_eq!(p.roles, BTreeSet::from([Role::Worker]));
}

#[test]
fn test_area_leader_cannot_join_own_roster() {
    let _ = env_logger::try_init();
    let mut storage = InMemoryStore::new();
    let mut audit_logger = InMemoryAuditLogger::new();
    let mut service = ParishService::new(&mut storage, &mut audit_logger);

    let l = service
        .create_member("Lea".to_string(), MemberStatus::Active)
        .unwrap();
    let a1 = service
        .create_ministry_area("Music".to_string(), Some(l.id), BTreeSet::new())
        .unwrap();
    let a2 = service
        .create_ministry_area("Welcome".to_string(), None, BTreeSet::new())
        .unwrap();

    let result = service.set_area_members(a1.id, BTreeSet::from([l.id]));
    assert!(matches!(result, Err(ParishError::InvariantViolation(_))));

    // leading one area does not bar plain membership of another
    service
        .set_area_members(a2.id, BTreeSet::from([l.id]))
        .unwrap();

    let members = storage.load_members().unwrap();
    let l = members.iter().find(|m| m.id == l.id).unwrap();
    assert_eq!(l.assigned_area_ids, BTreeSet::from([a1.id, a2.id]));
}
