use crate::attendees;
use crate::constants::DEFAULT_HORIZON_DAYS;
use crate::error::ParishError;
use crate::logger::AuditLogger;
use crate::models::*;
use crate::recurrence::{self, GenerationWindow, MeetingDraft};
use crate::roles;
use crate::storage::RecordStore;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use log::{debug, info, warn};
use serde_json;
use std::collections::BTreeSet;
use uuid::Uuid;

/// The single choke point for every mutation of the membership graph and
/// the meeting calendar. All office/roster edits funnel through here so the
/// one-office-per-kind invariant and the derived-role cache are maintained
/// at exactly one place; collections are loaded, reworked in memory and
/// written back whole only after the full computation succeeded.
pub struct ParishService<'a> {
    pub storage: &'a mut dyn RecordStore,
    pub audit_logger: &'a mut dyn AuditLogger,
}

impl<'a> ParishService<'a> {
    pub fn new(storage: &'a mut dyn RecordStore, audit_logger: &'a mut dyn AuditLogger) -> Self {
        info!("Initializing ParishService");
        Self {
            storage,
            audit_logger,
        }
    }

    // MEMBER MANAGEMENT

    pub fn create_member(
        &mut self,
        name: String,
        status: MemberStatus,
    ) -> Result<Member, ParishError> {
        info!("Creating member '{}'", name);
        let now = Utc::now();
        let member = Member {
            id: Uuid::new_v4(),
            name,
            status,
            assigned_group_id: None,
            assigned_area_ids: BTreeSet::new(),
            roles: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        };

        let mut members = self.storage.load_members()?;
        members.push(member.clone());
        self.storage.save_members(members)?;

        self.audit_logger.log(AuditLogEntry::new(
            AuditAction::CreateMember,
            &serde_json::json!({ "member_id": member.id }),
            now,
        ));
        debug!("Member created with ID: {}", member.id);

        Ok(member)
    }

    pub fn set_member_status(
        &mut self,
        member_id: Uuid,
        status: MemberStatus,
    ) -> Result<Member, ParishError> {
        info!("Setting status of member {} to {:?}", member_id, status);
        let now = Utc::now();
        let mut members = self.storage.load_members()?;
        let idx = Self::member_index(&members, member_id)?;
        members[idx].status = status;
        members[idx].updated_at = now;
        let updated = members[idx].clone();
        self.storage.save_members(members)?;

        self.audit_logger.log(AuditLogEntry::new(
            AuditAction::SetMemberStatus,
            &serde_json::json!({ "member_id": member_id, "status": status }),
            now,
        ));

        Ok(updated)
    }

    // SMALL GROUPS & GUIDE OFFICE

    pub fn create_small_group(
        &mut self,
        name: String,
        guide_id: Option<Uuid>,
        member_ids: BTreeSet<Uuid>,
    ) -> Result<SmallGroup, ParishError> {
        info!("Creating small group '{}'", name);
        let now = Utc::now();
        let mut members = self.storage.load_members()?;
        let mut groups = self.storage.load_small_groups()?;
        let areas = self.storage.load_ministry_areas()?;

        let group_id = Uuid::new_v4();
        groups.push(SmallGroup {
            id: group_id,
            name,
            guide: Office::Vacant,
            member_ids: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        });

        let mut touched = BTreeSet::new();
        if let Some(member_id) = guide_id {
            touched.extend(Self::install_guide(
                &mut members,
                &mut groups,
                group_id,
                member_id,
                now,
            )?);
        }
        touched.extend(Self::apply_group_roster(
            &mut members,
            &mut groups,
            group_id,
            &member_ids,
            now,
        )?);
        roles::recompute(&mut members, &touched, &groups, &areas, now);

        let created = groups
            .iter()
            .find(|g| g.id == group_id)
            .cloned()
            .ok_or(ParishError::GroupNotFound(group_id))?;
        self.storage.save_members(members)?;
        self.storage.save_small_groups(groups)?;

        self.audit_logger.log(AuditLogEntry::new(
            AuditAction::CreateSmallGroup,
            &serde_json::json!({ "group_id": group_id, "guide_id": guide_id, "touched": touched }),
            now,
        ));
        debug!("Small group created with ID: {}", group_id);

        Ok(created)
    }

    /// Seat a member as the guide of a group, cascading every consequence:
    /// the sitting guide is demoted, any other guide seat the member holds
    /// is vacated, stale plain-roster entries are evicted, and everyone
    /// touched has their roles recomputed.
    pub fn assign_guide(
        &mut self,
        group_id: Uuid,
        member_id: Uuid,
    ) -> Result<SmallGroup, ParishError> {
        info!("Assigning member {} as guide of group {}", member_id, group_id);
        let now = Utc::now();
        let mut members = self.storage.load_members()?;
        let mut groups = self.storage.load_small_groups()?;
        let areas = self.storage.load_ministry_areas()?;

        let touched = Self::install_guide(&mut members, &mut groups, group_id, member_id, now)?;
        roles::recompute(&mut members, &touched, &groups, &areas, now);

        let updated = groups
            .iter()
            .find(|g| g.id == group_id)
            .cloned()
            .ok_or(ParishError::GroupNotFound(group_id))?;
        self.storage.save_members(members)?;
        self.storage.save_small_groups(groups)?;

        self.audit_logger.log(AuditLogEntry::new(
            AuditAction::AssignGuide,
            &serde_json::json!({ "group_id": group_id, "member_id": member_id, "touched": touched }),
            now,
        ));
        debug!(
            "Guide of group {} is now {}; {} member(s) recomputed",
            group_id,
            member_id,
            touched.len()
        );

        Ok(updated)
    }

    /// Explicitly mark a group's guide seat vacant. This is the sanctioned
    /// way to remove a guide without naming a replacement.
    pub fn vacate_guide(&mut self, group_id: Uuid) -> Result<SmallGroup, ParishError> {
        info!("Vacating guide seat of group {}", group_id);
        let now = Utc::now();
        let mut members = self.storage.load_members()?;
        let mut groups = self.storage.load_small_groups()?;
        let areas = self.storage.load_ministry_areas()?;

        let touched = Self::clear_guide(&mut members, &mut groups, group_id, now)?;
        roles::recompute(&mut members, &touched, &groups, &areas, now);

        let updated = groups
            .iter()
            .find(|g| g.id == group_id)
            .cloned()
            .ok_or(ParishError::GroupNotFound(group_id))?;
        self.storage.save_members(members)?;
        self.storage.save_small_groups(groups)?;

        self.audit_logger.log(AuditLogEntry::new(
            AuditAction::VacateGuide,
            &serde_json::json!({ "group_id": group_id, "touched": touched }),
            now,
        ));

        Ok(updated)
    }

    /// Replace a group's plain-member roster. Added members are pulled out
    /// of whatever other group they belonged to (a member belongs to at
    /// most one small group); removed members get their pointer cleared.
    /// Sitting guides cannot be added this way.
    pub fn set_group_members(
        &mut self,
        group_id: Uuid,
        member_ids: BTreeSet<Uuid>,
    ) -> Result<SmallGroup, ParishError> {
        info!(
            "Setting roster of group {} to {} member(s)",
            group_id,
            member_ids.len()
        );
        let now = Utc::now();
        let mut members = self.storage.load_members()?;
        let mut groups = self.storage.load_small_groups()?;
        let areas = self.storage.load_ministry_areas()?;

        let touched =
            Self::apply_group_roster(&mut members, &mut groups, group_id, &member_ids, now)?;
        roles::recompute(&mut members, &touched, &groups, &areas, now);

        let updated = groups
            .iter()
            .find(|g| g.id == group_id)
            .cloned()
            .ok_or(ParishError::GroupNotFound(group_id))?;
        self.storage.save_members(members)?;
        self.storage.save_small_groups(groups)?;

        self.audit_logger.log(AuditLogEntry::new(
            AuditAction::SetGroupMembers,
            &serde_json::json!({ "group_id": group_id, "touched": touched }),
            now,
        ));

        Ok(updated)
    }

    // MINISTRY AREAS & LEADER OFFICE

    pub fn create_ministry_area(
        &mut self,
        name: String,
        leader_id: Option<Uuid>,
        member_ids: BTreeSet<Uuid>,
    ) -> Result<MinistryArea, ParishError> {
        info!("Creating ministry area '{}'", name);
        let now = Utc::now();
        let mut members = self.storage.load_members()?;
        let groups = self.storage.load_small_groups()?;
        let mut areas = self.storage.load_ministry_areas()?;

        let area_id = Uuid::new_v4();
        areas.push(MinistryArea {
            id: area_id,
            name,
            leader: Office::Vacant,
            member_ids: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        });

        let mut touched = BTreeSet::new();
        if let Some(member_id) = leader_id {
            touched.extend(Self::install_leader(
                &mut members,
                &mut areas,
                area_id,
                member_id,
                now,
            )?);
        }
        touched.extend(Self::apply_area_roster(
            &mut members,
            &mut areas,
            area_id,
            &member_ids,
            now,
        )?);
        roles::recompute(&mut members, &touched, &groups, &areas, now);

        let created = areas
            .iter()
            .find(|a| a.id == area_id)
            .cloned()
            .ok_or(ParishError::AreaNotFound(area_id))?;
        self.storage.save_members(members)?;
        self.storage.save_ministry_areas(areas)?;

        self.audit_logger.log(AuditLogEntry::new(
            AuditAction::CreateMinistryArea,
            &serde_json::json!({ "area_id": area_id, "leader_id": leader_id, "touched": touched }),
            now,
        ));
        debug!("Ministry area created with ID: {}", area_id);

        Ok(created)
    }

    pub fn assign_area_leader(
        &mut self,
        area_id: Uuid,
        member_id: Uuid,
    ) -> Result<MinistryArea, ParishError> {
        info!(
            "Assigning member {} as leader of ministry area {}",
            member_id, area_id
        );
        let now = Utc::now();
        let mut members = self.storage.load_members()?;
        let groups = self.storage.load_small_groups()?;
        let mut areas = self.storage.load_ministry_areas()?;

        let touched = Self::install_leader(&mut members, &mut areas, area_id, member_id, now)?;
        roles::recompute(&mut members, &touched, &groups, &areas, now);

        let updated = areas
            .iter()
            .find(|a| a.id == area_id)
            .cloned()
            .ok_or(ParishError::AreaNotFound(area_id))?;
        self.storage.save_members(members)?;
        self.storage.save_ministry_areas(areas)?;

        self.audit_logger.log(AuditLogEntry::new(
            AuditAction::AssignAreaLeader,
            &serde_json::json!({ "area_id": area_id, "member_id": member_id, "touched": touched }),
            now,
        ));

        Ok(updated)
    }

    pub fn vacate_area_leader(&mut self, area_id: Uuid) -> Result<MinistryArea, ParishError> {
        info!("Vacating leader seat of ministry area {}", area_id);
        let now = Utc::now();
        let mut members = self.storage.load_members()?;
        let groups = self.storage.load_small_groups()?;
        let mut areas = self.storage.load_ministry_areas()?;

        let touched = Self::clear_leader(&mut members, &mut areas, area_id, now)?;
        roles::recompute(&mut members, &touched, &groups, &areas, now);

        let updated = areas
            .iter()
            .find(|a| a.id == area_id)
            .cloned()
            .ok_or(ParishError::AreaNotFound(area_id))?;
        self.storage.save_members(members)?;
        self.storage.save_ministry_areas(areas)?;

        self.audit_logger.log(AuditLogEntry::new(
            AuditAction::VacateAreaLeader,
            &serde_json::json!({ "area_id": area_id, "touched": touched }),
            now,
        ));

        Ok(updated)
    }

    /// Replace an area's plain-member roster. Unlike small groups, area
    /// membership is many-to-many, so added members keep their other area
    /// memberships; only the area's own sitting leader is rejected.
    pub fn set_area_members(
        &mut self,
        area_id: Uuid,
        member_ids: BTreeSet<Uuid>,
    ) -> Result<MinistryArea, ParishError> {
        info!(
            "Setting roster of ministry area {} to {} member(s)",
            area_id,
            member_ids.len()
        );
        let now = Utc::now();
        let mut members = self.storage.load_members()?;
        let groups = self.storage.load_small_groups()?;
        let mut areas = self.storage.load_ministry_areas()?;

        let touched = Self::apply_area_roster(&mut members, &mut areas, area_id, &member_ids, now)?;
        roles::recompute(&mut members, &touched, &groups, &areas, now);

        let updated = areas
            .iter()
            .find(|a| a.id == area_id)
            .cloned()
            .ok_or(ParishError::AreaNotFound(area_id))?;
        self.storage.save_members(members)?;
        self.storage.save_ministry_areas(areas)?;

        self.audit_logger.log(AuditLogEntry::new(
            AuditAction::SetAreaMembers,
            &serde_json::json!({ "area_id": area_id, "touched": touched }),
            now,
        ));

        Ok(updated)
    }

    // MEETING SERIES

    pub fn create_series(
        &mut self,
        name: String,
        kind: SeriesKind,
        recurrence: Recurrence,
        default_time: NaiveTime,
        default_location: String,
        description: Option<String>,
    ) -> Result<MeetingSeries, ParishError> {
        info!("Creating meeting series '{}'", name);
        let now = Utc::now();
        let today = now.date_naive();

        let members = self.storage.load_members()?;
        let groups = self.storage.load_small_groups()?;
        let areas = self.storage.load_ministry_areas()?;
        let mut series_list = self.storage.load_series()?;
        let mut meetings = self.storage.load_meetings()?;

        Self::validate_recurrence(&recurrence)?;
        // the owning group must exist before any instance is generated
        match &kind {
            SeriesKind::SmallGroup { group_id } => {
                Self::group_index(&groups, *group_id)?;
            }
            SeriesKind::MinistryArea { area_id } => {
                Self::area_index(&areas, *area_id)?;
            }
            SeriesKind::General { .. } => {}
        }

        let series = MeetingSeries {
            id: Uuid::new_v4(),
            name,
            kind,
            recurrence,
            default_time,
            default_location,
            description,
            created_at: now,
            updated_at: now,
        };

        let window = GenerationWindow::days_ahead(today, DEFAULT_HORIZON_DAYS);
        let drafts = recurrence::generate(&series, window, &BTreeSet::new());
        let snapshot = attendees::snapshot_for(&series, &members);
        let instances = Self::materialize(&series, drafts, snapshot, now);
        let instance_count = instances.len();
        meetings.extend(instances);
        series_list.push(series.clone());

        self.storage.save_series(series_list)?;
        self.storage.save_meetings(meetings)?;

        self.audit_logger.log(AuditLogEntry::new(
            AuditAction::CreateSeries,
            &serde_json::json!({ "series_id": series.id, "instances": instance_count }),
            now,
        ));
        debug!(
            "Series {} created with {} instance(s)",
            series.id, instance_count
        );

        Ok(series)
    }

    /// Edit a series in place. Defaults and description only affect
    /// instances generated from now on; a recurrence change additionally
    /// regenerates the future calendar (past instances and instances with
    /// recorded attendance are never disturbed). The series kind is fixed
    /// at creation.
    pub fn update_series(
        &mut self,
        series_id: Uuid,
        new_name: Option<String>,
        new_recurrence: Option<Recurrence>,
        new_default_time: Option<NaiveTime>,
        new_default_location: Option<String>,
        new_description: Option<String>,
    ) -> Result<MeetingSeries, ParishError> {
        info!("Updating series {}", series_id);
        let now = Utc::now();
        let today = now.date_naive();

        let members = self.storage.load_members()?;
        let mut series_list = self.storage.load_series()?;
        let mut meetings = self.storage.load_meetings()?;
        let attendance = self.storage.load_attendance()?;

        let idx = Self::series_index(&series_list, series_id)?;
        if let Some(rule) = &new_recurrence {
            Self::validate_recurrence(rule)?;
        }
        let old_recurrence = series_list[idx].recurrence.clone();
        {
            let series = &mut series_list[idx];
            if let Some(name) = new_name {
                series.name = name;
            }
            if let Some(time) = new_default_time {
                series.default_time = time;
            }
            if let Some(location) = new_default_location {
                series.default_location = location;
            }
            if let Some(description) = new_description {
                series.description = Some(description);
            }
            if let Some(rule) = new_recurrence {
                series.recurrence = rule;
            }
            series.updated_at = now;
        }
        let series = series_list[idx].clone();

        let rule_changed = series.recurrence != old_recurrence;
        let mut created = 0usize;
        let mut removed = 0usize;
        if rule_changed {
            (created, removed) = Self::regenerate(
                &series,
                &old_recurrence,
                &mut meetings,
                &attendance,
                &members,
                today,
                now,
            );
        }

        self.storage.save_series(series_list)?;
        if rule_changed {
            self.storage.save_meetings(meetings)?;
        }

        self.audit_logger.log(AuditLogEntry::new(
            AuditAction::UpdateSeries,
            &serde_json::json!({
                "series_id": series_id,
                "rule_changed": rule_changed,
                "instances_created": created,
                "instances_removed": removed,
            }),
            now,
        ));
        debug!(
            "Series {} updated (rule changed: {}, +{} / -{} instances)",
            series_id, rule_changed, created, removed
        );

        Ok(series)
    }

    /// Remove a series together with all of its instances and their
    /// attendance records. This is the one sanctioned destructive cascade;
    /// deleting a single instance with history is rejected instead.
    pub fn delete_series(&mut self, series_id: Uuid) -> Result<(), ParishError> {
        info!("Deleting series {} and its instances", series_id);
        let now = Utc::now();
        let mut series_list = self.storage.load_series()?;
        let mut meetings = self.storage.load_meetings()?;
        let mut attendance = self.storage.load_attendance()?;

        let idx = Self::series_index(&series_list, series_id)?;
        series_list.remove(idx);

        let doomed: BTreeSet<Uuid> = meetings
            .iter()
            .filter(|m| m.series_id == Some(series_id))
            .map(|m| m.id)
            .collect();
        meetings.retain(|m| m.series_id != Some(series_id));
        let records_before = attendance.len();
        attendance.retain(|r| !doomed.contains(&r.meeting_id));
        let records_removed = records_before - attendance.len();

        self.storage.save_series(series_list)?;
        self.storage.save_meetings(meetings)?;
        self.storage.save_attendance(attendance)?;

        self.audit_logger.log(AuditLogEntry::new(
            AuditAction::DeleteSeries,
            &serde_json::json!({
                "series_id": series_id,
                "meetings_removed": doomed.len(),
                "records_removed": records_removed,
            }),
            now,
        ));
        debug!(
            "Series {} deleted ({} meeting(s), {} attendance record(s))",
            series_id,
            doomed.len(),
            records_removed
        );

        Ok(())
    }

    /// Top up a series's materialized calendar further into the future.
    /// Safe to call repeatedly; already-materialized dates are skipped.
    pub fn extend_horizon(
        &mut self,
        series_id: Uuid,
        until: NaiveDate,
    ) -> Result<Vec<Meeting>, ParishError> {
        info!("Extending horizon of series {} until {}", series_id, until);
        let now = Utc::now();
        let today = now.date_naive();

        let members = self.storage.load_members()?;
        let series_list = self.storage.load_series()?;
        let mut meetings = self.storage.load_meetings()?;

        let idx = Self::series_index(&series_list, series_id)?;
        let series = series_list[idx].clone();

        let existing: BTreeSet<NaiveDate> = meetings
            .iter()
            .filter(|m| m.series_id == Some(series_id))
            .map(|m| m.date)
            .collect();
        let window = GenerationWindow::new(today, until);
        let drafts = recurrence::generate(&series, window, &existing);
        let snapshot = attendees::snapshot_for(&series, &members);
        let created = Self::materialize(&series, drafts, snapshot, now);
        meetings.extend(created.iter().cloned());

        self.storage.save_meetings(meetings)?;

        self.audit_logger.log(AuditLogEntry::new(
            AuditAction::ExtendHorizon,
            &serde_json::json!({ "series_id": series_id, "until": until, "created": created.len() }),
            now,
        ));

        Ok(created)
    }

    // MEETINGS

    /// Create a single instance outside any recurrence rule, optionally
    /// attached to a series. Attached general-series instances freeze an
    /// attendee snapshot exactly like generated ones; unattached instances
    /// carry no snapshot and resolve to an empty expected list.
    pub fn create_occasional_meeting(
        &mut self,
        series_id: Option<Uuid>,
        date: NaiveDate,
        time: NaiveTime,
        location: String,
        description: Option<String>,
    ) -> Result<Meeting, ParishError> {
        info!("Creating occasional meeting on {}", date);
        let now = Utc::now();
        let mut meetings = self.storage.load_meetings()?;

        let snapshot = match series_id {
            Some(sid) => {
                let series_list = self.storage.load_series()?;
                let idx = Self::series_index(&series_list, sid)?;
                let members = self.storage.load_members()?;
                attendees::snapshot_for(&series_list[idx], &members)
            }
            None => None,
        };

        let meeting = Meeting {
            id: Uuid::new_v4(),
            series_id,
            date,
            time,
            location,
            description,
            minute: None,
            attendee_snapshot: snapshot,
            occasional: true,
            created_at: now,
            updated_at: now,
        };
        meetings.push(meeting.clone());
        self.storage.save_meetings(meetings)?;

        self.audit_logger.log(AuditLogEntry::new(
            AuditAction::CreateMeeting,
            &serde_json::json!({ "meeting_id": meeting.id, "series_id": series_id, "date": date }),
            now,
        ));
        debug!("Occasional meeting created with ID: {}", meeting.id);

        Ok(meeting)
    }

    /// Non-destructive per-instance edits. Allowed even when attendance is
    /// already recorded; only removal is guarded.
    pub fn update_meeting(
        &mut self,
        meeting_id: Uuid,
        new_date: Option<NaiveDate>,
        new_time: Option<NaiveTime>,
        new_location: Option<String>,
        new_description: Option<String>,
        new_minute: Option<String>,
    ) -> Result<Meeting, ParishError> {
        info!("Updating meeting {}", meeting_id);
        let now = Utc::now();
        let mut meetings = self.storage.load_meetings()?;
        let idx = Self::meeting_index(&meetings, meeting_id)?;
        {
            let meeting = &mut meetings[idx];
            if let Some(date) = new_date {
                meeting.date = date;
            }
            if let Some(time) = new_time {
                meeting.time = time;
            }
            if let Some(location) = new_location {
                meeting.location = location;
            }
            if let Some(description) = new_description {
                meeting.description = Some(description);
            }
            if let Some(minute) = new_minute {
                meeting.minute = Some(minute);
            }
            meeting.updated_at = now;
        }
        let updated = meetings[idx].clone();
        self.storage.save_meetings(meetings)?;

        self.audit_logger.log(AuditLogEntry::new(
            AuditAction::UpdateMeeting,
            &serde_json::json!({ "meeting_id": meeting_id }),
            now,
        ));

        Ok(updated)
    }

    /// Remove one instance. Rejected when the instance already carries
    /// attendance history; sibling instances and the series are unaffected.
    pub fn delete_meeting(&mut self, meeting_id: Uuid) -> Result<(), ParishError> {
        info!("Deleting meeting {}", meeting_id);
        let now = Utc::now();
        let mut meetings = self.storage.load_meetings()?;
        let attendance = self.storage.load_attendance()?;

        Self::meeting_index(&meetings, meeting_id)?;
        if attendance.iter().any(|r| r.meeting_id == meeting_id) {
            warn!(
                "Refusing to delete meeting {}: attendance already recorded",
                meeting_id
            );
            return Err(ParishError::ImmutableHistory(meeting_id));
        }

        meetings.retain(|m| m.id != meeting_id);
        self.storage.save_meetings(meetings)?;

        self.audit_logger.log(AuditLogEntry::new(
            AuditAction::DeleteMeeting,
            &serde_json::json!({ "meeting_id": meeting_id }),
            now,
        ));

        Ok(())
    }

    // ATTENDANCE

    /// Upsert one member's attendance for one meeting. At most one record
    /// exists per (meeting, member) pair; a pair with no record at all
    /// reads as "undetermined", which is not the same as absent.
    pub fn record_attendance(
        &mut self,
        meeting_id: Uuid,
        member_id: Uuid,
        attended: bool,
        notes: Option<String>,
    ) -> Result<AttendanceRecord, ParishError> {
        info!(
            "Recording attendance for member {} at meeting {}: {}",
            member_id, meeting_id, attended
        );
        let now = Utc::now();
        let meetings = self.storage.load_meetings()?;
        Self::meeting_index(&meetings, meeting_id)?;
        let members = self.storage.load_members()?;
        Self::member_index(&members, member_id)?;

        let mut records = self.storage.load_attendance()?;
        let record = match records
            .iter_mut()
            .find(|r| r.meeting_id == meeting_id && r.member_id == member_id)
        {
            Some(existing) => {
                existing.attended = attended;
                existing.notes = notes;
                existing.recorded_at = now;
                existing.clone()
            }
            None => {
                let record = AttendanceRecord {
                    id: Uuid::new_v4(),
                    meeting_id,
                    member_id,
                    attended,
                    notes,
                    recorded_at: now,
                };
                records.push(record.clone());
                record
            }
        };
        self.storage.save_attendance(records)?;

        self.audit_logger.log(AuditLogEntry::new(
            AuditAction::RecordAttendance,
            &serde_json::json!({ "meeting_id": meeting_id, "member_id": member_id, "attended": attended }),
            now,
        ));

        Ok(record)
    }

    pub fn attendance_for_meeting(
        &self,
        meeting_id: Uuid,
    ) -> Result<Vec<AttendanceRecord>, ParishError> {
        let meetings = self.storage.load_meetings()?;
        Self::meeting_index(&meetings, meeting_id)?;
        let records = self.storage.load_attendance()?;
        Ok(records
            .into_iter()
            .filter(|r| r.meeting_id == meeting_id)
            .collect())
    }

    /// The members expected at a meeting, resolved against the live graph
    /// or the frozen snapshot depending on the owning series.
    pub fn expected_attendees(&self, meeting_id: Uuid) -> Result<Vec<Member>, ParishError> {
        let meetings = self.storage.load_meetings()?;
        let idx = Self::meeting_index(&meetings, meeting_id)?;
        let series = self.storage.load_series()?;
        let members = self.storage.load_members()?;
        let groups = self.storage.load_small_groups()?;
        let areas = self.storage.load_ministry_areas()?;
        Ok(attendees::resolve(
            &meetings[idx],
            &series,
            &members,
            &groups,
            &areas,
        ))
    }

    /// Expected attendees zipped with their recorded state: `Some(true)`
    /// attended, `Some(false)` marked absent, `None` undetermined.
    pub fn attendance_sheet(
        &self,
        meeting_id: Uuid,
    ) -> Result<Vec<(Member, Option<bool>)>, ParishError> {
        let expected = self.expected_attendees(meeting_id)?;
        let records = self.storage.load_attendance()?;
        Ok(expected
            .into_iter()
            .map(|member| {
                let state = records
                    .iter()
                    .find(|r| r.meeting_id == meeting_id && r.member_id == member.id)
                    .map(|r| r.attended);
                (member, state)
            })
            .collect())
    }

    // CONSISTENCY MACHINERY

    /// Seat `member_id` as guide of `group_id` and cascade: demote the
    /// sitting guide, vacate any other guide seat the member holds, evict
    /// the member from every other plain roster, and keep officer and
    /// plain-member status mutually exclusive within the group. Returns
    /// every member id whose relationships changed.
    fn install_guide(
        members: &mut Vec<Member>,
        groups: &mut Vec<SmallGroup>,
        group_id: Uuid,
        member_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<BTreeSet<Uuid>, ParishError> {
        let member_idx = Self::member_index(members, member_id)?;
        let group_idx = Self::group_index(groups, group_id)?;
        let mut touched = BTreeSet::new();

        // demote the sitting guide, clearing their pointer only if it
        // still points at this group
        if let Some(previous) = groups[group_idx].guide.holder() {
            if previous != member_id {
                if let Some(p) = members.iter_mut().find(|m| m.id == previous) {
                    if p.assigned_group_id == Some(group_id) {
                        p.assigned_group_id = None;
                        p.updated_at = now;
                    }
                }
                touched.insert(previous);
            }
        }

        // vacate any other guide seat the member holds and evict stale
        // plain-roster entries elsewhere
        for group in groups.iter_mut().filter(|g| g.id != group_id) {
            let mut changed = false;
            if group.guide.is_held_by(member_id) {
                group.guide = Office::Vacant;
                changed = true;
            }
            if group.member_ids.remove(&member_id) {
                changed = true;
            }
            if changed {
                group.updated_at = now;
            }
        }

        let group = &mut groups[group_idx];
        group.guide = Office::Holder(member_id);
        group.member_ids.remove(&member_id);
        group.updated_at = now;

        let member = &mut members[member_idx];
        member.assigned_group_id = Some(group_id);
        member.updated_at = now;
        touched.insert(member_id);

        Ok(touched)
    }

    fn clear_guide(
        members: &mut [Member],
        groups: &mut [SmallGroup],
        group_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<BTreeSet<Uuid>, ParishError> {
        let group_idx = Self::group_index(groups, group_id)?;
        let mut touched = BTreeSet::new();

        if let Some(previous) = groups[group_idx].guide.holder() {
            groups[group_idx].guide = Office::Vacant;
            groups[group_idx].updated_at = now;
            if let Some(p) = members.iter_mut().find(|m| m.id == previous) {
                if p.assigned_group_id == Some(group_id) {
                    p.assigned_group_id = None;
                    p.updated_at = now;
                }
            }
            touched.insert(previous);
        }

        Ok(touched)
    }

    fn apply_group_roster(
        members: &mut Vec<Member>,
        groups: &mut Vec<SmallGroup>,
        group_id: Uuid,
        desired: &BTreeSet<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<BTreeSet<Uuid>, ParishError> {
        let group_idx = Self::group_index(groups, group_id)?;
        for id in desired {
            Self::member_index(members, *id)?;
        }
        // a sitting guide (of this group or any other) is never a plain
        // member; seating one requires the explicit assign/vacate ops
        for id in desired {
            if let Some(holding) = groups.iter().find(|g| g.guide.is_held_by(*id)) {
                warn!(
                    "Rejecting roster edit of group {}: member {} guides group {}",
                    group_id, id, holding.id
                );
                return Err(ParishError::InvariantViolation(format!(
                    "member {} holds the guide seat of group {} and cannot join a plain roster",
                    id, holding.id
                )));
            }
        }

        let current = groups[group_idx].member_ids.clone();
        let added: Vec<Uuid> = desired.difference(&current).copied().collect();
        let removed: Vec<Uuid> = current.difference(desired).copied().collect();
        let mut touched = BTreeSet::new();

        for id in &added {
            // single small-group membership: pull the member out of any
            // other roster before adding
            for group in groups.iter_mut().filter(|g| g.id != group_id) {
                if group.member_ids.remove(id) {
                    group.updated_at = now;
                }
            }
            if let Some(m) = members.iter_mut().find(|m| m.id == *id) {
                m.assigned_group_id = Some(group_id);
                m.updated_at = now;
            }
            touched.insert(*id);
        }
        for id in &removed {
            if let Some(m) = members.iter_mut().find(|m| m.id == *id) {
                if m.assigned_group_id == Some(group_id) {
                    m.assigned_group_id = None;
                    m.updated_at = now;
                }
            }
            touched.insert(*id);
        }

        let group = &mut groups[group_idx];
        group.member_ids = desired.clone();
        group.updated_at = now;

        Ok(touched)
    }

    /// Area counterpart of `install_guide`. The member pointer is set-valued
    /// (multi-area membership is legal), so only the vacated seat's area id
    /// is dropped from the member's set and no cross-area roster eviction
    /// happens.
    fn install_leader(
        members: &mut Vec<Member>,
        areas: &mut Vec<MinistryArea>,
        area_id: Uuid,
        member_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<BTreeSet<Uuid>, ParishError> {
        let member_idx = Self::member_index(members, member_id)?;
        let area_idx = Self::area_index(areas, area_id)?;
        let mut touched = BTreeSet::new();

        if let Some(previous) = areas[area_idx].leader.holder() {
            if previous != member_id {
                if let Some(p) = members.iter_mut().find(|m| m.id == previous) {
                    if p.assigned_area_ids.remove(&area_id) {
                        p.updated_at = now;
                    }
                }
                touched.insert(previous);
            }
        }

        let vacated: Vec<Uuid> = areas
            .iter()
            .filter(|a| a.id != area_id && a.leader.is_held_by(member_id))
            .map(|a| a.id)
            .collect();
        for area in areas.iter_mut().filter(|a| vacated.contains(&a.id)) {
            area.leader = Office::Vacant;
            area.member_ids.remove(&member_id);
            area.updated_at = now;
        }

        let area = &mut areas[area_idx];
        area.leader = Office::Holder(member_id);
        area.member_ids.remove(&member_id);
        area.updated_at = now;

        let member = &mut members[member_idx];
        for id in &vacated {
            member.assigned_area_ids.remove(id);
        }
        member.assigned_area_ids.insert(area_id);
        member.updated_at = now;
        touched.insert(member_id);

        Ok(touched)
    }

    fn clear_leader(
        members: &mut [Member],
        areas: &mut [MinistryArea],
        area_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<BTreeSet<Uuid>, ParishError> {
        let area_idx = Self::area_index(areas, area_id)?;
        let mut touched = BTreeSet::new();

        if let Some(previous) = areas[area_idx].leader.holder() {
            areas[area_idx].leader = Office::Vacant;
            areas[area_idx].updated_at = now;
            if let Some(p) = members.iter_mut().find(|m| m.id == previous) {
                if p.assigned_area_ids.remove(&area_id) {
                    p.updated_at = now;
                }
            }
            touched.insert(previous);
        }

        Ok(touched)
    }

    fn apply_area_roster(
        members: &mut Vec<Member>,
        areas: &mut Vec<MinistryArea>,
        area_id: Uuid,
        desired: &BTreeSet<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<BTreeSet<Uuid>, ParishError> {
        let area_idx = Self::area_index(areas, area_id)?;
        for id in desired {
            Self::member_index(members, *id)?;
        }
        if let Some(holder) = areas[area_idx].leader.holder() {
            if desired.contains(&holder) {
                warn!(
                    "Rejecting roster edit of area {}: member {} is its sitting leader",
                    area_id, holder
                );
                return Err(ParishError::InvariantViolation(format!(
                    "member {} leads ministry area {} and cannot join its plain roster",
                    holder, area_id
                )));
            }
        }

        let current = areas[area_idx].member_ids.clone();
        let added: Vec<Uuid> = desired.difference(&current).copied().collect();
        let removed: Vec<Uuid> = current.difference(desired).copied().collect();
        let mut touched = BTreeSet::new();

        for id in &added {
            if let Some(m) = members.iter_mut().find(|m| m.id == *id) {
                m.assigned_area_ids.insert(area_id);
                m.updated_at = now;
            }
            touched.insert(*id);
        }
        for id in &removed {
            if let Some(m) = members.iter_mut().find(|m| m.id == *id) {
                if m.assigned_area_ids.remove(&area_id) {
                    m.updated_at = now;
                }
            }
            touched.insert(*id);
        }

        let area = &mut areas[area_idx];
        area.member_ids = desired.clone();
        area.updated_at = now;

        Ok(touched)
    }

    // GENERATION HELPERS

    /// Weekly rules need at least one weekday and day-of-month rules a day
    /// inside 1-31; anything else could never produce an instance.
    fn validate_recurrence(rule: &Recurrence) -> Result<(), ParishError> {
        match rule {
            Recurrence::Weekly { weekdays } if weekdays.is_empty() => {
                warn!("Rejecting weekly rule without weekdays");
                Err(ParishError::InvariantViolation(
                    "a weekly rule needs at least one weekday".to_string(),
                ))
            }
            Recurrence::Monthly {
                rule: MonthlyRule::DayOfMonth { day },
            } if !(1..=31).contains(day) => {
                warn!("Rejecting monthly rule with day {}", day);
                Err(ParishError::InvariantViolation(format!(
                    "day {} is outside the 1-31 day-of-month range",
                    day
                )))
            }
            _ => Ok(()),
        }
    }

    fn materialize(
        series: &MeetingSeries,
        drafts: Vec<MeetingDraft>,
        snapshot: Option<Vec<Uuid>>,
        now: DateTime<Utc>,
    ) -> Vec<Meeting> {
        drafts
            .into_iter()
            .map(|draft| Meeting {
                id: Uuid::new_v4(),
                series_id: Some(series.id),
                date: draft.date,
                time: draft.time,
                location: draft.location,
                description: draft.description,
                minute: None,
                attendee_snapshot: snapshot.clone(),
                occasional: false,
                created_at: now,
                updated_at: now,
            })
            .collect()
    }

    /// Rework a series's future calendar after a recurrence change.
    /// Past instances are out of scope entirely; future instances that
    /// carry attendance are kept even when their date no longer matches
    /// the new rule; occasional instances are never touched. Returns the
    /// numbers of created and removed instances.
    fn regenerate(
        series: &MeetingSeries,
        old_recurrence: &Recurrence,
        meetings: &mut Vec<Meeting>,
        attendance: &[AttendanceRecord],
        members: &[Member],
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> (usize, usize) {
        let with_attendance: BTreeSet<Uuid> = attendance.iter().map(|r| r.meeting_id).collect();

        // regeneration scope: the default horizon, stretched to the
        // furthest already-materialized future instance so every future
        // row is re-checked against the new rule
        let mut window = GenerationWindow::days_ahead(today, DEFAULT_HORIZON_DAYS);
        let furthest = meetings
            .iter()
            .filter(|m| m.series_id == Some(series.id) && m.date >= today)
            .map(|m| m.date)
            .max();
        if let Some(date) = furthest {
            window.until = window.until.max(date);
        }
        let new_dates = recurrence::rule_dates(&series.recurrence, window);

        // a one-time date edit moves the surviving row instead of
        // recreating it, so per-instance edits like the minute are kept
        if let (Recurrence::OneTime { .. }, Recurrence::OneTime { date: new_date }) =
            (old_recurrence, &series.recurrence)
        {
            let new_date = *new_date;
            let already_materialized = meetings
                .iter()
                .any(|m| m.series_id == Some(series.id) && m.date == new_date);
            if !already_materialized {
                if let Some(row) = meetings.iter_mut().find(|m| {
                    m.series_id == Some(series.id)
                        && !m.occasional
                        && m.date >= today
                        && !with_attendance.contains(&m.id)
                }) {
                    row.date = new_date;
                    row.updated_at = now;
                }
            }
        }

        let before = meetings.len();
        meetings.retain(|m| {
            if m.series_id != Some(series.id) || m.occasional {
                return true;
            }
            if m.date < today || with_attendance.contains(&m.id) {
                return true;
            }
            new_dates.contains(&m.date)
        });
        let removed = before - meetings.len();

        let existing: BTreeSet<NaiveDate> = meetings
            .iter()
            .filter(|m| m.series_id == Some(series.id))
            .map(|m| m.date)
            .collect();
        let drafts = recurrence::generate(series, window, &existing);
        let snapshot = attendees::snapshot_for(series, members);
        let created = Self::materialize(series, drafts, snapshot, now);
        let created_count = created.len();
        meetings.extend(created);

        (created_count, removed)
    }

    // LOOKUPS

    fn member_index(members: &[Member], id: Uuid) -> Result<usize, ParishError> {
        members
            .iter()
            .position(|m| m.id == id)
            .ok_or(ParishError::MemberNotFound(id))
    }

    fn group_index(groups: &[SmallGroup], id: Uuid) -> Result<usize, ParishError> {
        groups
            .iter()
            .position(|g| g.id == id)
            .ok_or(ParishError::GroupNotFound(id))
    }

    fn area_index(areas: &[MinistryArea], id: Uuid) -> Result<usize, ParishError> {
        areas
            .iter()
            .position(|a| a.id == id)
            .ok_or(ParishError::AreaNotFound(id))
    }

    fn series_index(series: &[MeetingSeries], id: Uuid) -> Result<usize, ParishError> {
        series
            .iter()
            .position(|s| s.id == id)
            .ok_or(ParishError::SeriesNotFound(id))
    }

    fn meeting_index(meetings: &[Meeting], id: Uuid) -> Result<usize, ParishError> {
        meetings
            .iter()
            .position(|m| m.id == id)
            .ok_or(ParishError::MeetingNotFound(id))
    }
}
