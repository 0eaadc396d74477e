//! Process exit codes. Part of the CLI contract.

use rankgrade_core::errors::ErrorKind;

pub const SUCCESS: i32 = 0;
pub const GRADING_FAILED: i32 = 1; // Pipeline failed after the request was accepted
pub const CONFIG_ERROR: i32 = 2; // Bad request, bad flags or bad config file

/// Exit code for a failure reported in an error envelope.
pub fn for_kind(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::InputValidationError | ErrorKind::ConfigError => CONFIG_ERROR,
        ErrorKind::UpstreamError
        | ErrorKind::TimeoutError
        | ErrorKind::ParseError
        | ErrorKind::IntegrityError
        | ErrorKind::Cancelled => GRADING_FAILED,
    }
}
