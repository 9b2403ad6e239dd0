use crate::error::ParishError;
use crate::models::*;

/// Abstract per-entity record store. Every collection supports only
/// load-all and save-all: no query language, no partial update. Mutations
/// load the full collection, rework it in memory and write it back whole,
/// so writers must hold exclusive access for the read-modify-write cycle
/// (the service borrows the store mutably for exactly that reason).
pub trait RecordStore {
    fn load_members(&self) -> Result<Vec<Member>, ParishError>;
    fn save_members(&mut self, members: Vec<Member>) -> Result<(), ParishError>;

    fn load_small_groups(&self) -> Result<Vec<SmallGroup>, ParishError>;
    fn save_small_groups(&mut self, groups: Vec<SmallGroup>) -> Result<(), ParishError>;

    fn load_ministry_areas(&self) -> Result<Vec<MinistryArea>, ParishError>;
    fn save_ministry_areas(&mut self, areas: Vec<MinistryArea>) -> Result<(), ParishError>;

    fn load_series(&self) -> Result<Vec<MeetingSeries>, ParishError>;
    fn save_series(&mut self, series: Vec<MeetingSeries>) -> Result<(), ParishError>;

    fn load_meetings(&self) -> Result<Vec<Meeting>, ParishError>;
    fn save_meetings(&mut self, meetings: Vec<Meeting>) -> Result<(), ParishError>;

    fn load_attendance(&self) -> Result<Vec<AttendanceRecord>, ParishError>;
    fn save_attendance(&mut self, records: Vec<AttendanceRecord>) -> Result<(), ParishError>;
}

pub mod in_memory;
