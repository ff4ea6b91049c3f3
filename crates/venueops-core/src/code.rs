/// Prefix used for task codes (`TASK-000042`).
pub const TASK_CODE_PREFIX: &str = "TASK";

/// Width the numeric part of a code is zero-padded to.
pub const CODE_WIDTH: usize = 6;

/// Formats a human-readable code from a persisted id.
///
/// Ids wider than [`CODE_WIDTH`] digits are printed in full.
pub fn generate_code(prefix: &str, id: i64) -> String {
    format!("{}-{:0width$}", prefix, id, width = CODE_WIDTH)
}

/// Code for a task row with the given id.
#[inline]
pub fn task_code(id: i64) -> String {
    generate_code(TASK_CODE_PREFIX, id)
}
