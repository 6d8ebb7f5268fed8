//! CLI Exit Code Registry
//!
//! Exit codes are part of the shell contract; batch scripts that run the
//! month-end settlement check them.
//!
//! | Code | Meaning                                                    |
//! |------|------------------------------------------------------------|
//! | 0    | Workbook written                                           |
//! | 2    | Usage error (no files, unknown flag)                       |
//! | 3    | Configuration missing, unreadable, malformed or invalid    |
//! | 4    | An upload could not be read                                |
//! | 5    | Settlement failed (missing column) or workbook not written |

use monthend_recon::SettleError;

/// Success - workbook written.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - no upload paths, unknown flag.
pub const EXIT_USAGE: u8 = 2;

/// Config file missing, unreadable, unparseable or failing validation.
/// Nothing is processed.
pub const EXIT_CONFIG: u8 = 3;

/// An upload could not be opened or parsed (bad extension, corrupt file).
pub const EXIT_UPLOAD_READ: u8 = 4;

/// Classification, assembly or workbook export failed. No workbook is left behind.
pub const EXIT_PROCESSING: u8 = 5;

/// Map an engine error to its exit code.
pub fn settle_exit_code(err: &SettleError) -> u8 {
    match err {
        SettleError::ConfigParse(_) | SettleError::ConfigValidation(_) => EXIT_CONFIG,
        SettleError::MissingColumn { .. } => EXIT_PROCESSING,
    }
}
