use crate::models::AuditLogEntry;

/// Sink for the parish audit trail. Service operations append exactly one
/// entry per successful mutation, after the collection writes went through;
/// a failed operation leaves no trace here.
pub trait AuditLogger {
    fn log(&mut self, entry: AuditLogEntry);
}

pub mod in_memory;
