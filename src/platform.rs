//! Host detection: operating system and privilege level.
use std::fmt;

use crate::exec;

/// Detected operating system platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    /// Linux and other Unix-like systems.
    Linux,
    /// Windows.
    Windows,
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linux => write!(f, "linux"),
            Self::Windows => write!(f, "windows"),
        }
    }
}

/// Platform information for the current process.
#[derive(Debug, Clone)]
pub struct Platform {
    /// Operating system.
    pub os: Os,
    /// Whether the process runs with superuser / administrator rights.
    pub elevated: bool,
}

impl Platform {
    /// Detect the current platform.
    #[must_use]
    pub fn detect() -> Self {
        let os = Self::detect_os();
        let platform = Self {
            os,
            elevated: Self::detect_elevated(os),
        };
        tracing::debug!("platform: {} (elevated: {})", platform.os, platform.elevated);
        platform
    }

    /// Create a platform with explicit values.
    #[must_use]
    pub const fn new(os: Os, elevated: bool) -> Self {
        Self { os, elevated }
    }

    /// Whether this is a Windows host.
    #[must_use]
    pub fn is_windows(&self) -> bool {
        self.os == Os::Windows
    }

    const fn detect_os() -> Os {
        if cfg!(target_os = "windows") {
            Os::Windows
        } else {
            Os::Linux
        }
    }

    /// `id -u` prints `0` for root; `net session` only succeeds for an
    /// administrator.
    fn detect_elevated(os: Os) -> bool {
        match os {
            Os::Linux => exec::run("id", &["-u"]).is_ok_and(|r| r.stdout.trim() == "0"),
            Os::Windows => exec::run_unchecked("net", &["session"]).is_ok_and(|r| r.success),
        }
    }
}
