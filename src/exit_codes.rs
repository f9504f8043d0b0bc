//! Exit code constants for the recsync CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, invalid config)
//! - 2: Record not found
//! - 3: Record conflict or corruption
//! - 4: Lock acquisition failure
//! - 5: I/O or permission failure

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments or invalid configuration.
pub const USER_ERROR: i32 = 1;

/// The record does not exist.
pub const NOT_FOUND: i32 = 2;

/// Write verification failed or the record could not be parsed.
pub const RECORD_FAILURE: i32 = 3;

/// Lock acquisition failure: timeout or invalid lock state.
pub const LOCK_FAILURE: i32 = 4;

/// Filesystem failure: permissions or other I/O errors.
pub const IO_FAILURE: i32 = 5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [
            SUCCESS,
            USER_ERROR,
            NOT_FOUND,
            RECORD_FAILURE,
            LOCK_FAILURE,
            IO_FAILURE,
        ];
        for (i, &a) in codes.iter().enumerate() {
            for (j, &b) in codes.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "Exit codes must be distinct");
                }
            }
        }
    }
}
