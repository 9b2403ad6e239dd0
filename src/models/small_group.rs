use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::office::Office;

/// A small fellowship group (GDI) led by a single guide. `member_ids`
/// holds the rank-and-file roster and never contains the guide; a member
/// holds the guide seat of at most one group system-wide.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmallGroup {
    pub id: Uuid,
    pub name: String,
    pub guide: Office,
    pub member_ids: BTreeSet<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
