use crate::error::ParishError;
use crate::models::*;
use crate::storage::RecordStore;

/// Vec-backed reference implementation of the record store. Used by every
/// test; a production caller would wrap its JSON files or database behind
/// the same trait.
#[derive(Default)]
pub struct InMemoryStore {
    members: Vec<Member>,
    small_groups: Vec<SmallGroup>,
    ministry_areas: Vec<MinistryArea>,
    series: Vec<MeetingSeries>,
    meetings: Vec<Meeting>,
    attendance: Vec<AttendanceRecord>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        InMemoryStore::default()
    }
}

impl RecordStore for InMemoryStore {
    fn load_members(&self) -> Result<Vec<Member>, ParishError> {
        Ok(self.members.clone())
    }

    fn save_members(&mut self, members: Vec<Member>) -> Result<(), ParishError> {
        self.members = members;
        Ok(())
    }

    fn load_small_groups(&self) -> Result<Vec<SmallGroup>, ParishError> {
        Ok(self.small_groups.clone())
    }

    fn save_small_groups(&mut self, groups: Vec<SmallGroup>) -> Result<(), ParishError> {
        self.small_groups = groups;
        Ok(())
    }

    fn load_ministry_areas(&self) -> Result<Vec<MinistryArea>, ParishError> {
        Ok(self.ministry_areas.clone())
    }

    fn save_ministry_areas(&mut self, areas: Vec<MinistryArea>) -> Result<(), ParishError> {
        self.ministry_areas = areas;
        Ok(())
    }

    fn load_series(&self) -> Result<Vec<MeetingSeries>, ParishError> {
        Ok(self.series.clone())
    }

    fn save_series(&mut self, series: Vec<MeetingSeries>) -> Result<(), ParishError> {
        self.series = series;
        Ok(())
    }

    fn load_meetings(&self) -> Result<Vec<Meeting>, ParishError> {
        Ok(self.meetings.clone())
    }

    fn save_meetings(&mut self, meetings: Vec<Meeting>) -> Result<(), ParishError> {
        self.meetings = meetings;
        Ok(())
    }

    fn load_attendance(&self) -> Result<Vec<AttendanceRecord>, ParishError> {
        Ok(self.attendance.clone())
    }

    fn save_attendance(&mut self, records: Vec<AttendanceRecord>) -> Result<(), ParishError> {
        self.attendance = records;
        Ok(())
    }
}
