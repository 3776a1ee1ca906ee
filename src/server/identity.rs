//! Effective-user lookup and the service-owner restriction.

use anyhow::{anyhow, Result};

use crate::error::LifecycleError;
use crate::server::Identity;

pub struct SystemIdentity;

impl Identity for SystemIdentity {
    #[cfg(target_os = "linux")]
    fn current_user(&self) -> Result<String> {
        let uid = unsafe { libc::geteuid() };
        let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
        let mut buf = vec![0 as libc::c_char; 4096];
        let mut result: *mut libc::passwd = std::ptr::null_mut();

        let rc = unsafe { libc::getpwuid_r(uid, &mut pwd, buf.as_mut_ptr(), buf.len(), &mut result) };
        if rc != 0 || result.is_null() {
            return Err(anyhow!("No passwd entry for uid {}", uid));
        }

        let name = unsafe { std::ffi::CStr::from_ptr(pwd.pw_name) };
        Ok(name.to_string_lossy().into_owned())
    }

    #[cfg(not(target_os = "linux"))]
    fn current_user(&self) -> Result<String> {
        std::env::var("USER").map_err(|_| anyhow!("Cannot determine current user"))
    }
}

/// Fail with `IdentityMismatch` unless the process runs as `owner`.
pub fn require_owner(identity: &dyn Identity, owner: &str) -> Result<()> {
    let actual = identity.current_user()?;
    if actual != owner {
        return Err(LifecycleError::IdentityMismatch {
            expected: owner.to_string(),
            actual,
        }
        .into());
    }
    Ok(())
}

/// True when running as root (needed to write systemd units).
pub fn is_root() -> bool {
    #[cfg(target_os = "linux")]
    {
        unsafe { libc::geteuid() == 0 }
    }
    #[cfg(not(target_os = "linux"))]
    {
        false
    }
}
