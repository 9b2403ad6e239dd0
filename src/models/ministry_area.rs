use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::office::Office;

/// A functional serving team led by a single leader. The leader seat is
/// independent of the small-group guide seat: one person may hold one of
/// each kind. `member_ids` never contains the leader.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinistryArea {
    pub id: Uuid,
    pub name: String,
    pub leader: Office,
    pub member_ids: BTreeSet<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
