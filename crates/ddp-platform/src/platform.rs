//! Process-level utilities: time, sleeping, process and host identity,
//! filesystem helpers and a log sink targeting the platform's debug output.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ddp_core::{DdResult, LogLevel, LogSink, ResultCode};
use ddp_hal::{OsInfo, Platform, StdPlatform};

/// Monotonic milliseconds since first use
pub fn current_time_ms() -> u64 {
    StdPlatform.current_time_ms()
}

/// High-resolution monotonic tick count
pub fn query_timestamp() -> u64 {
    StdPlatform.query_timestamp()
}

/// Ticks per second of [`query_timestamp`]
pub fn query_timestamp_frequency() -> u64 {
    StdPlatform.query_timestamp_frequency()
}

pub fn sleep(ms: u32) {
    StdPlatform.sleep_ms(ms);
}

pub fn process_id() -> u32 {
    StdPlatform.process_id()
}

/// File name of the running executable
pub fn process_name() -> String {
    StdPlatform.process_name()
}

/// OS version, hostname, current user and memory totals of this host
pub fn os_info() -> DdResult<OsInfo> {
    StdPlatform.os_info()
}

/// Outcome of a successful [`mkdir`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MkdirStatus {
    Created,
    Existed,
}

/// Create a single directory
///
/// # Returns
/// * `Ok(MkdirStatus::Existed)` - A directory was already there
/// * `Err(ResultCode::FileIoError)` - Missing parent, a non-directory in the way, or any other failure
pub fn mkdir(path: impl AsRef<Path>) -> DdResult<MkdirStatus> {
    let path = path.as_ref();
    match fs::create_dir(path) {
        Ok(()) => Ok(MkdirStatus::Created),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => {
            Ok(MkdirStatus::Existed)
        }
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "mkdir failed");
            Err(ResultCode::FileIoError)
        }
    }
}

/// Absolute, symlink-resolved form of an existing path
///
/// # Returns
/// * `Err(ResultCode::FileNotFound)` - Nothing exists at `path`
/// * `Err(ResultCode::FileIoError)` - Any other failure
pub fn abs_path(path: impl AsRef<Path>) -> DdResult<PathBuf> {
    fs::canonicalize(path.as_ref()).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ResultCode::FileNotFound,
        _ => ResultCode::FileIoError,
    })
}

/// Log sink writing to [`Platform::debug_write`]
#[derive(Clone, Debug, Default)]
pub struct PlatformSink<P: Platform = StdPlatform> {
    platform: P,
}

impl<P: Platform> PlatformSink<P> {
    pub fn new(platform: P) -> Self {
        Self { platform }
    }
}

impl<P: Platform> LogSink for PlatformSink<P> {
    fn write(&self, level: LogLevel, message: &str) {
        self.platform.debug_write(level, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mkdir_created_then_existed() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("captures");
        assert_eq!(mkdir(&target), Ok(MkdirStatus::Created));
        assert_eq!(mkdir(&target), Ok(MkdirStatus::Existed));
    }

    #[test]
    fn test_mkdir_failures() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            mkdir(dir.path().join("missing").join("child")),
            Err(ResultCode::FileIoError)
        );

        let file = dir.path().join("plain");
        fs::write(&file, b"x").unwrap();
        assert_eq!(mkdir(&file), Err(ResultCode::FileIoError));
    }

    #[test]
    fn test_abs_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("trace.bin");
        fs::write(&file, b"").unwrap();

        let resolved = abs_path(&file).unwrap();
        assert!(resolved.is_absolute());
        assert_eq!(resolved.file_name().unwrap(), "trace.bin");

        assert_eq!(
            abs_path(dir.path().join("nope")),
            Err(ResultCode::FileNotFound)
        );
    }

    #[test]
    fn test_time_advances() {
        let a = current_time_ms();
        sleep(5);
        assert!(current_time_ms() >= a + 5);
        assert!(query_timestamp_frequency() > 0);
    }

    #[test]
    fn test_process_identity() {
        assert_eq!(process_id(), std::process::id());
        assert!(!process_name().is_empty());
    }

    #[test]
    fn test_os_info_matches_uname_family() {
        let info = os_info().unwrap();
        if cfg!(target_os = "linux") {
            assert_eq!(info.os_type, "Linux");
            assert!(!info.hostname.is_empty());
        } else if cfg!(target_os = "macos") {
            assert_eq!(info.os_type, "Darwin");
        }
    }
}
