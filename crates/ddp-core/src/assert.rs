//! Assert and warn checks
//!
//! Conditions are typed strictly as `bool`, so passing an integer, a pointer
//! or an assignment expression to `dd_assert!`/`dd_warn!` fails to compile.
//! A failed assert logs at Error level and then performs the logger's
//! [`AssertAction`]; a failed warn only logs at Warn level.

use serde::{Deserialize, Serialize};

use crate::log::{LogLevel, Logger};

/// Whether the assert macros are compiled in for this build
pub const ASSERTS_ENABLED: bool = cfg!(any(debug_assertions, feature = "asserts"));

/// What a failed assert does after logging
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssertAction {
    /// Execute a hardware breakpoint, aborting the process if the target has none
    Trap,
    /// Panic with the diagnostic message
    #[default]
    Panic,
    /// Log and continue
    LogOnly,
}

/// Check `value`; on failure log the expression and location then break.
#[track_caller]
pub fn assert_condition(
    logger: &Logger,
    value: bool,
    expr: &str,
    file: &str,
    line: u32,
    func: &str,
) {
    if value || !logger.asserts_enabled() {
        return;
    }
    assert_reason(logger, expr, file, line, func);
}

/// Unconditionally report an assertion failure with `reason`
#[track_caller]
pub fn assert_reason(logger: &Logger, reason: &str, file: &str, line: u32, func: &str) {
    if !logger.asserts_enabled() {
        return;
    }
    logger.print(
        LogLevel::Error,
        format_args!("{} ({}): Assertion failed in {}: {}", file, line, func, reason),
    );
    debug_break(logger.assert_action(), reason, file, line);
}

/// Check `value`; on failure log a warning, never break.
pub fn warn_condition(
    logger: &Logger,
    value: bool,
    expr: &str,
    file: &str,
    line: u32,
    func: &str,
) {
    if value || !logger.asserts_enabled() {
        return;
    }
    warn_reason(logger, expr, file, line, func);
}

/// Unconditionally emit a warning with `reason`
pub fn warn_reason(logger: &Logger, reason: &str, file: &str, line: u32, func: &str) {
    if !logger.asserts_enabled() {
        return;
    }
    logger.print(
        LogLevel::Warn,
        format_args!("{} ({}): Warning triggered in {}: {}", file, line, func, reason),
    );
}

#[track_caller]
fn debug_break(action: AssertAction, reason: &str, file: &str, line: u32) {
    match action {
        AssertAction::LogOnly => {}
        AssertAction::Panic => panic!("assertion failed: {} ({}:{})", reason, file, line),
        AssertAction::Trap => trap(),
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
fn trap() {
    // SAFETY: int3 only raises SIGTRAP/breakpoint exception; it touches no memory.
    unsafe { core::arch::asm!("int3") }
}

#[cfg(target_arch = "aarch64")]
fn trap() {
    // SAFETY: brk only raises a breakpoint exception; it touches no memory.
    unsafe { core::arch::asm!("brk #0xf000") }
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))]
fn trap() {
    std::process::abort()
}
