use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// At most one record per (meeting, member) pair; writers upsert. A missing
/// record means "undetermined", which is distinct from `attended: false`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub meeting_id: Uuid,
    pub member_id: Uuid,
    pub attended: bool,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
}
