//! Result codes
//!
//! `ResultCode` is the single outcome type shared by every operation in the
//! platform layer. There is exactly one success value; every other variant is
//! a failure. Fallible Rust APIs return [`DdResult`], whose `Err` side never
//! carries `Success`.

use core::fmt;

use crate::log::{LogLevel, Logger};

/// `Result` alias used across the platform layer
pub type DdResult<T = ()> = core::result::Result<T, ResultCode>;

/// String returned by [`result_to_str`] for values outside the enumeration
pub const UNRECOGNIZED_RESULT: &str = "Unrecognized Result";

macro_rules! result_codes {
    ($( $(#[$meta:meta])* $name:ident = $value:expr, )+) => {
        /// Outcome of a platform operation
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        #[repr(u32)]
        pub enum ResultCode {
            $( $(#[$meta])* $name = $value, )+
        }

        impl ResultCode {
            /// Every defined result code, in declaration order
            pub const ALL: &'static [ResultCode] = &[$(ResultCode::$name,)+];

            /// Fixed English name of this code
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(ResultCode::$name => stringify!($name),)+
                }
            }

            /// Convert from the raw wire value, `None` if it is not a defined code
            pub fn from_raw(raw: u32) -> Option<Self> {
                $(
                    if raw == $value {
                        return Some(ResultCode::$name);
                    }
                )+
                None
            }
        }
    };
}

result_codes! {
    // === Generic ===
    /// Operation completed
    Success = 0,
    /// Unspecified failure
    Error = 1,
    /// Resource not ready yet, also used for timed-out waits
    NotReady = 2,
    /// Peer speaks an incompatible version
    VersionMismatch = 3,
    /// Feature or resource unavailable on this platform
    Unavailable = 4,
    /// Request refused
    Rejected = 5,
    /// No more data
    EndOfStream = 6,
    /// Operation was aborted
    Aborted = 7,
    /// Allocation failed
    InsufficientMemory = 8,
    /// Argument outside the accepted domain
    InvalidParameter = 9,
    /// Unknown client identifier
    InvalidClientId = 10,
    /// Connection already established
    ConnectionExists = 11,
    /// File or module could not be located
    FileNotFound = 12,
    /// Symbol lookup failed
    FunctionNotFound = 13,
    /// Interface lookup failed
    InterfaceNotFound = 14,
    /// Entry already present
    EntryExists = 15,
    /// Permission denied on a file
    FileAccessError = 16,
    /// Read/write failure on a file
    FileIoError = 17,
    /// A fixed limit was hit
    LimitReached = 18,
    /// Memory budget exceeded
    MemoryOverLimit = 19,

    // === URI protocol ===
    UriServiceRegistrationError = 1000,
    UriStringParseError = 1001,
    UriInvalidParameters = 1002,
    UriInvalidPostDataBlock = 1003,
    UriInvalidPostDataSize = 1004,
    UriFailedToAcquirePostBlock = 1005,
    UriFailedToOpenResponseBlock = 1006,
    UriRequestFailed = 1007,
    UriPendingRequestError = 1008,
    UriInvalidChar = 1009,
    UriInvalidJson = 1010,

    // === Settings URI service ===
    SettingsUriInvalidComponent = 2000,
    SettingsUriInvalidSettingName = 2001,
    SettingsUriInvalidSettingValue = 2002,
    SettingsUriInvalidSettingValueSize = 2003,

    // === Info URI service ===
    InfoUriSourceNameInvalid = 3000,
    InfoUriSourceCallbackInvalid = 3001,
    InfoUriSourceAlreadyRegistered = 3002,
    InfoUriSourceWriteFailed = 3003,

    // === Settings service ===
    SettingsInvalidComponent = 4000,
    SettingsInvalidSettingName = 4001,
    SettingsInvalidSettingValue = 4002,
    SettingsInsufficientValueSize = 4003,
    SettingsInvalidSettingValueSize = 4004,
}

impl ResultCode {
    /// Raw wire value
    pub const fn raw(self) -> u32 {
        self as u32
    }

    /// `true` maps to `Success`, `false` to `Error`
    pub const fn from_bool(value: bool) -> Self {
        if value {
            ResultCode::Success
        } else {
            ResultCode::Error
        }
    }

    pub const fn is_success(self) -> bool {
        matches!(self, ResultCode::Success)
    }

    /// Collapse every failure into the generic `Error`
    pub const fn sanitize(self) -> Self {
        if self.is_success() {
            self
        } else {
            ResultCode::Error
        }
    }

    /// Convert to a Rust `Result` so it can be propagated with `?`
    pub fn into_result(self) -> DdResult {
        if self.is_success() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<DdResult> for ResultCode {
    fn from(result: DdResult) -> Self {
        match result {
            Ok(()) => ResultCode::Success,
            // An `Err(Success)` is a programming error upstream; treat it as generic failure.
            Err(ResultCode::Success) => ResultCode::Error,
            Err(code) => code,
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::error::Error for ResultCode {}

/// Stringify a raw result value.
///
/// Total over `u32`: values outside the enumeration yield
/// [`UNRECOGNIZED_RESULT`] and emit a Warn diagnostic through `logger`.
pub fn result_to_str(raw: u32, logger: &Logger) -> &'static str {
    match ResultCode::from_raw(raw) {
        Some(code) => code.as_str(),
        None => {
            logger.print(
                LogLevel::Warn,
                format_args!("Result code {} is not handled", raw),
            );
            UNRECOGNIZED_RESULT
        }
    }
}

/// Report a result the caller could not handle.
///
/// Only active when asserts are enabled on `logger`; logs at Error level
/// naming the expression, location and code. Use through
/// [`dd_unhandled_result!`](crate::dd_unhandled_result).
pub fn mark_unhandled_result(
    logger: &Logger,
    result: ResultCode,
    expr: &str,
    file: &str,
    line: u32,
    func: &str,
) {
    if !logger.asserts_enabled() || result.is_success() {
        return;
    }
    logger.print(
        LogLevel::Error,
        format_args!(
            "{} ({}): Unchecked Result in {}: \"{}\" == \"{}\" (0x{:X})",
            file,
            line,
            func,
            expr,
            result.as_str(),
            result.raw()
        ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_code_has_distinct_name() {
        let names: HashSet<&str> = ResultCode::ALL.iter().map(|c| c.as_str()).collect();
        assert_eq!(names.len(), ResultCode::ALL.len());
        assert!(names.iter().all(|n| !n.is_empty()));
        assert!(!names.contains(UNRECOGNIZED_RESULT));
    }

    #[test]
    fn test_raw_round_trip_for_defined_codes() {
        for code in ResultCode::ALL {
            assert_eq!(ResultCode::from_raw(code.raw()), Some(*code));
        }
    }

    #[test]
    fn test_out_of_range_is_unrecognized() {
        let logger = Logger::silent(LogLevel::Debug);
        assert_eq!(UNRECOGNIZED_RESULT, "Unrecognized Result");
        assert_eq!(result_to_str(20, &logger), UNRECOGNIZED_RESULT);
        assert_eq!(result_to_str(u32::MAX, &logger), UNRECOGNIZED_RESULT);
        assert_eq!(result_to_str(0, &logger), "Success");
        assert_eq!(result_to_str(1010, &logger), "UriInvalidJson");
    }

    #[test]
    fn test_exactly_one_success() {
        let successes = ResultCode::ALL.iter().filter(|c| c.is_success()).count();
        assert_eq!(successes, 1);
    }

    #[test]
    fn test_from_bool() {
        assert_eq!(ResultCode::from_bool(true), ResultCode::Success);
        assert_eq!(ResultCode::from_bool(false), ResultCode::Error);
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(ResultCode::Success.sanitize(), ResultCode::Success);
        assert_eq!(ResultCode::FileNotFound.sanitize(), ResultCode::Error);
    }

    #[test]
    fn test_into_result_and_back() {
        assert_eq!(ResultCode::Success.into_result(), Ok(()));
        assert_eq!(ResultCode::NotReady.into_result(), Err(ResultCode::NotReady));
        assert_eq!(ResultCode::from(Err(ResultCode::Success)), ResultCode::Error);
        assert_eq!(ResultCode::from(Ok(())), ResultCode::Success);
    }

    #[test]
    fn test_display_matches_as_str() {
        assert_eq!(ResultCode::LimitReached.to_string(), "LimitReached");
    }
}
