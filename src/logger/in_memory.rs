use crate::logger::AuditLogger;
use crate::models::AuditLogEntry;

#[derive(Default)]
pub struct InMemoryAuditLogger {
    entries: Vec<AuditLogEntry>,
}

impl InMemoryAuditLogger {
    pub fn new() -> Self {
        InMemoryAuditLogger::default()
    }

    pub fn get_logs(&self) -> &[AuditLogEntry] {
        &self.entries
    }
}

impl AuditLogger for InMemoryAuditLogger {
    fn log(&mut self, entry: AuditLogEntry) {
        self.entries.push(entry);
    }
}
