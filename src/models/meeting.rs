use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One dated meeting instance. Generated from a series rule, or created ad
/// hoc (`series_id: None`). Independently editable without affecting the
/// series or sibling instances.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    pub id: Uuid,
    pub series_id: Option<Uuid>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub location: String,
    pub description: Option<String>,
    pub minute: Option<String>,
    /// Frozen at generation time for general series; `None` for group-owned
    /// instances, whose attendees are always resolved live.
    pub attendee_snapshot: Option<Vec<Uuid>>,
    /// Created ad hoc, outside the recurrence rule. Regeneration never
    /// deletes or moves these rows.
    pub occasional: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
