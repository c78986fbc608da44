//! Host description over `uname`/`sysinfo`

use ddp_core::DdResult;

use crate::OsInfo;

fn user_name() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("LOGNAME"))
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_default()
}

fn home_dir() -> String {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_default()
}

#[cfg(unix)]
fn c_field(raw: &[libc::c_char]) -> String {
    let bytes: Vec<u8> = raw.iter().take_while(|&&c| c != 0).map(|&c| c as u8).collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// `PRETTY_NAME` from os-release, if the distribution ships one
#[cfg(target_os = "linux")]
fn distribution_name() -> Option<String> {
    let release = std::fs::read_to_string("/etc/os-release").ok()?;
    release.lines().find_map(|line| {
        let value = line.strip_prefix("PRETTY_NAME=")?;
        Some(value.trim_matches('"').to_string())
    })
}

#[cfg(not(target_os = "linux"))]
fn distribution_name() -> Option<String> {
    None
}

/// (physical, swap) in bytes
#[cfg(target_os = "linux")]
fn memory_totals() -> (u64, u64) {
    // SAFETY: sysinfo is plain data, all-zero is a valid value, and the call
    // only writes into the struct we pass.
    let mut info: libc::sysinfo = unsafe { core::mem::zeroed() };
    if unsafe { libc::sysinfo(&mut info) } != 0 {
        tracing::debug!("sysinfo failed");
        return (0, 0);
    }
    let unit = u64::from(info.mem_unit);
    (
        (info.totalram as u64).saturating_mul(unit),
        (info.totalswap as u64).saturating_mul(unit),
    )
}

#[cfg(not(target_os = "linux"))]
fn memory_totals() -> (u64, u64) {
    (0, 0)
}

#[cfg(unix)]
pub(super) fn query() -> DdResult<OsInfo> {
    // SAFETY: utsname is plain data; uname fills it with NUL-terminated fields.
    let mut uts: libc::utsname = unsafe { core::mem::zeroed() };
    if unsafe { libc::uname(&mut uts) } != 0 {
        tracing::debug!("uname failed");
        return Err(ddp_core::ResultCode::Error);
    }

    let sysname = c_field(&uts.sysname);
    let release = c_field(&uts.release);
    let description = format!(
        "{} {} {} {}",
        sysname,
        release,
        c_field(&uts.version),
        c_field(&uts.machine)
    );
    let (physical_memory, swap_memory) = memory_totals();

    Ok(OsInfo {
        name: distribution_name().unwrap_or_else(|| format!("{} {}", sysname, release)),
        os_type: sysname,
        description,
        hostname: c_field(&uts.nodename),
        user_name: user_name(),
        home_dir: home_dir(),
        physical_memory,
        swap_memory,
    })
}

#[cfg(not(unix))]
pub(super) fn query() -> DdResult<OsInfo> {
    let os_type = if cfg!(windows) {
        String::from("Windows")
    } else {
        String::from(std::env::consts::OS)
    };
    let (physical_memory, swap_memory) = memory_totals();
    Ok(OsInfo {
        name: os_type.clone(),
        description: format!("{} {}", os_type, std::env::consts::ARCH),
        os_type,
        hostname: std::env::var("COMPUTERNAME").unwrap_or_default(),
        user_name: user_name(),
        home_dir: home_dir(),
        physical_memory,
        swap_memory,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(target_os = "linux")]
    #[test]
    fn test_linux_host_description() {
        let info = query().unwrap();
        assert_eq!(info.os_type, "Linux");
        assert!(!info.name.is_empty());
        assert!(info.description.starts_with("Linux "));
        assert!(info.physical_memory > 0);
    }

    #[cfg(target_os = "macos")]
    #[test]
    fn test_darwin_host_description() {
        let info = query().unwrap();
        assert_eq!(info.os_type, "Darwin");
    }

    #[cfg(unix)]
    #[test]
    fn test_c_field_stops_at_nul() {
        let raw = [b'h' as libc::c_char, b'i' as libc::c_char, 0, b'x' as libc::c_char];
        assert_eq!(c_field(&raw), "hi");
    }
}
