// src/exit_codes.rs

//! Stable process exit codes.

use crate::RunStatus;

/// Every spec passed, or nothing was executed (`--list`, `--dry-run`).
pub const OK: i32 = 0;
/// The run completed but at least one spec failed.
pub const TESTS_FAILED: i32 = 1;
/// Nothing ran: invalid configuration, no specs, or a spec failed to load.
pub const FATAL: i32 = 2;

/// Exit code for a run that returned normally.
pub fn for_status(status: &RunStatus) -> i32 {
    match status {
        RunStatus::Completed(aggregate) if !aggregate.all_passed() => TESTS_FAILED,
        RunStatus::Completed(_) | RunStatus::Listed | RunStatus::DryRun => OK,
    }
}
