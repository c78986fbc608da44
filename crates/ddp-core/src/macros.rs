//! Diagnostic macros
//!
//! Every macro has two forms: the plain form uses the process logger
//! ([`logger()`](crate::log::logger)), the `@logger <expr>,` form takes an
//! explicit `&Logger`.

/// Print through an explicit logger: `dd_log!(&logger, LogLevel::Info, "x = {}", x)`.
///
/// Arguments are only formatted when the level passes the filter.
#[macro_export]
macro_rules! dd_log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let logger: &$crate::log::Logger = $logger;
        let level: $crate::log::LogLevel = $level;
        if logger.should_print(level) {
            logger.print(level, ::core::format_args!($($arg)+));
        }
    }};
}

/// Print through the process logger: `dd_print!(LogLevel::Warn, "lost {} bytes", n)`
#[macro_export]
macro_rules! dd_print {
    ($level:expr, $($arg:tt)+) => {
        $crate::dd_log!($crate::log::logger(), $level, $($arg)+)
    };
}

/// Assert a boolean condition.
///
/// Only `bool` conditions compile. When asserts are compiled out the
/// condition is type-checked but never evaluated.
///
/// ```rust
/// let logger = ddp_core::Logger::silent(ddp_core::LogLevel::Error);
/// let depth = 1;
/// ddp_core::dd_assert!(@logger &logger, depth < 2);
/// ```
///
/// Integers are not conditions:
///
/// ```compile_fail
/// ddp_core::dd_assert!(1);
/// ```
///
/// Neither are pointers:
///
/// ```compile_fail
/// let p = &0u8 as *const u8;
/// ddp_core::dd_assert!(p);
/// ```
///
/// Nor assignments:
///
/// ```compile_fail
/// let mut x = 0;
/// ddp_core::dd_assert!(x = 1);
/// ```
#[macro_export]
macro_rules! dd_assert {
    (@logger $logger:expr, $cond:expr $(,)?) => {{
        if $crate::assert::ASSERTS_ENABLED {
            $crate::assert::assert_condition(
                $logger,
                $cond,
                ::core::stringify!($cond),
                ::core::file!(),
                ::core::line!(),
                ::core::module_path!(),
            );
        } else {
            let _ = || -> bool { $cond };
        }
    }};
    ($cond:expr $(,)?) => {
        $crate::dd_assert!(@logger $crate::log::logger(), $cond)
    };
}

/// Warn when a boolean condition is false; never breaks
///
/// Same `bool` constraint as [`dd_assert!`]:
///
/// ```compile_fail
/// ddp_core::dd_warn!(0u32);
/// ```
///
/// ```compile_fail
/// let p = &0u8 as *const u8;
/// ddp_core::dd_warn!(p);
/// ```
#[macro_export]
macro_rules! dd_warn {
    (@logger $logger:expr, $cond:expr $(,)?) => {{
        if $crate::assert::ASSERTS_ENABLED {
            $crate::assert::warn_condition(
                $logger,
                $cond,
                ::core::stringify!($cond),
                ::core::file!(),
                ::core::line!(),
                ::core::module_path!(),
            );
        } else {
            let _ = || -> bool { $cond };
        }
    }};
    ($cond:expr $(,)?) => {
        $crate::dd_warn!(@logger $crate::log::logger(), $cond)
    };
}

/// Unconditional assertion failure with a reason string
#[macro_export]
macro_rules! dd_assert_reason {
    (@logger $logger:expr, $reason:expr $(,)?) => {{
        if $crate::assert::ASSERTS_ENABLED {
            $crate::assert::assert_reason(
                $logger,
                $reason,
                ::core::file!(),
                ::core::line!(),
                ::core::module_path!(),
            );
        }
    }};
    ($reason:expr $(,)?) => {
        $crate::dd_assert_reason!(@logger $crate::log::logger(), $reason)
    };
}

/// Unconditional warning with a reason string
#[macro_export]
macro_rules! dd_warn_reason {
    (@logger $logger:expr, $reason:expr $(,)?) => {{
        if $crate::assert::ASSERTS_ENABLED {
            $crate::assert::warn_reason(
                $logger,
                $reason,
                ::core::file!(),
                ::core::line!(),
                ::core::module_path!(),
            );
        }
    }};
    ($reason:expr $(,)?) => {
        $crate::dd_warn_reason!(@logger $crate::log::logger(), $reason)
    };
}

#[macro_export]
macro_rules! dd_assert_always {
    () => {
        $crate::dd_assert_reason!("Unconditional Assertion")
    };
}

#[macro_export]
macro_rules! dd_warn_always {
    () => {
        $crate::dd_warn_reason!("Unconditional Warning")
    };
}

/// Legacy spelling of [`dd_warn!`], matching [`LogLevel::ALERT`](crate::log::LogLevel::ALERT)
#[macro_export]
macro_rules! dd_alert {
    ($($arg:tt)+) => {
        $crate::dd_warn!($($arg)+)
    };
}

/// Legacy spelling of [`dd_warn_reason!`]
#[macro_export]
macro_rules! dd_alert_reason {
    ($($arg:tt)+) => {
        $crate::dd_warn_reason!($($arg)+)
    };
}

/// Legacy spelling of [`dd_warn_always!`]
#[macro_export]
macro_rules! dd_alert_always {
    () => {
        $crate::dd_warn_always!()
    };
}

/// Assert that marks a code path that has not been written yet
#[macro_export]
macro_rules! dd_not_implemented {
    () => {
        $crate::dd_assert_reason!("Code not implemented!")
    };
}

/// Assert that marks a code path that must never execute
#[macro_export]
macro_rules! dd_unreachable {
    () => {
        $crate::dd_assert_reason!("Unreachable code has been reached!")
    };
}

/// Flag a `ResultCode` that the caller cannot handle
#[macro_export]
macro_rules! dd_unhandled_result {
    (@logger $logger:expr, $result:expr $(,)?) => {
        $crate::result::mark_unhandled_result(
            $logger,
            $result,
            ::core::stringify!($result),
            ::core::file!(),
            ::core::line!(),
            ::core::module_path!(),
        )
    };
    ($result:expr $(,)?) => {
        $crate::dd_unhandled_result!(@logger $crate::log::logger(), $result)
    };
}

/// Log an expression and its value, then return the value.
///
/// Prints `file:line:\t"expr" == value` at the given level.
#[macro_export]
macro_rules! dd_dbg {
    (@logger $logger:expr, $level:expr, $expr:expr $(,)?) => {
        match $expr {
            value => {
                $crate::dd_log!(
                    $logger,
                    $level,
                    "{}:{}:\t\"{}\" == {:?}",
                    ::core::file!(),
                    ::core::line!(),
                    ::core::stringify!($expr),
                    &value
                );
                value
            }
        }
    };
    ($level:expr, $expr:expr $(,)?) => {
        $crate::dd_dbg!(@logger $crate::log::logger(), $level, $expr)
    };
}
