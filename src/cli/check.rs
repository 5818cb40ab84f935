//! Integrity check command

use crate::error::{LedgerError, LedgerResult};
use crate::services::IntegrityService;
use crate::storage::Storage;

/// Report store violations; fails when any are found
pub fn handle_check_command(storage: &Storage) -> LedgerResult<()> {
    let violations = IntegrityService::new(storage).check()?;

    if violations.is_empty() {
        println!("No problems found.");
        return Ok(());
    }

    for violation in &violations {
        println!("  {}", violation);
    }
    Err(LedgerError::Consistency(format!(
        "{} problem(s) found",
        violations.len()
    )))
}
