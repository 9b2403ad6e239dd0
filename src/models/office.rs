use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The singular guide/leader seat of one group. A vacant seat is a
/// first-class state ("needs reassignment"), never a placeholder member.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", content = "memberId", rename_all = "camelCase")]
pub enum Office {
    Holder(Uuid),
    Vacant,
}

impl Office {
    pub fn holder(&self) -> Option<Uuid> {
        match self {
            Office::Holder(id) => Some(*id),
            Office::Vacant => None,
        }
    }

    pub fn is_vacant(&self) -> bool {
        matches!(self, Office::Vacant)
    }

    pub fn is_held_by(&self, member_id: Uuid) -> bool {
        self.holder() == Some(member_id)
    }
}

impl std::fmt::Display for Office {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Office::Holder(id) => write!(f, "{}", id),
            Office::Vacant => write!(f, "vacant"),
        }
    }
}
