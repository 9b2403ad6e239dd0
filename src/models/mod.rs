pub mod attendance;
pub mod audit;
pub mod meeting;
pub mod member;
pub mod ministry_area;
pub mod office;
pub mod series;
pub mod small_group;

pub use attendance::AttendanceRecord;
pub use audit::{AuditAction, AuditLogEntry};
pub use meeting::Meeting;
pub use member::{Member, MemberStatus, Role};
pub use ministry_area::MinistryArea;
pub use office::Office;
pub use series::{MeetingSeries, MonthlyRule, Ordinal, Recurrence, SeriesKind, TargetGroup};
pub use small_group::SmallGroup;
