/// How far ahead instance generation materializes meetings when no explicit
/// horizon is given. Series edits and horizon extensions re-run generation,
/// so the window only needs to cover the planning range the UI shows.
pub const DEFAULT_HORIZON_DAYS: u64 = 90;
