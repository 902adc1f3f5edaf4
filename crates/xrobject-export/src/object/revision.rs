//! Ownership revision stamp
//!
//! The REVISION section holds two `(user, time)` slots. The first names the
//! owner and creation time; the second names whoever last exported the
//! object when that was not the owner.

use std::env;
use std::fs;

use xrobject_core::{Revision, RevisionRecord};
use xrobject_formats::PackedWriter;

/// Supplies the exporting identity and the current time
pub trait RevisionSource {
    /// `\\host\user` of whoever runs the export
    fn current_user(&self) -> String;
    /// Unix time in seconds
    fn current_time(&self) -> u32;
}

/// Identity from the environment, time from the system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRevisionSource;

impl SystemRevisionSource {
    fn hostname() -> String {
        env_first(&["HOSTNAME", "COMPUTERNAME"])
            .or_else(|| {
                fs::read_to_string("/etc/hostname")
                    .ok()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
            })
            .unwrap_or_else(|| "localhost".to_string())
    }

    fn username() -> String {
        env_first(&["USER", "USERNAME", "LOGNAME"]).unwrap_or_else(|| "unknown".to_string())
    }
}

fn env_first(keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| env::var(key).ok())
        .find(|value| !value.is_empty())
}

impl RevisionSource for SystemRevisionSource {
    fn current_user(&self) -> String {
        format_user(&Self::hostname(), &Self::username())
    }

    fn current_time(&self) -> u32 {
        u32::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
    }
}

/// Fixed identity and time, for reproducible output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedRevisionSource {
    pub user: String,
    pub time: u32,
}

impl FixedRevisionSource {
    pub fn new(user: impl Into<String>, time: u32) -> Self {
        Self {
            user: user.into(),
            time,
        }
    }
}

impl RevisionSource for FixedRevisionSource {
    fn current_user(&self) -> String {
        self.user.clone()
    }

    fn current_time(&self) -> u32 {
        self.time
    }
}

/// `\\host\user`
pub fn format_user(host: &str, user: &str) -> String {
    format!("\\\\{host}\\{user}")
}

/// Record to write for a stored revision
///
/// An unowned object, or one owned by the current user, is claimed (or
/// reaffirmed) keeping an existing creation time. An object owned by someone
/// else keeps its owner pair and gets the current user as modifier.
pub fn next_revision(stored: &Revision, current_user: &str, current_time: u32) -> RevisionRecord {
    if stored.owner.is_empty() || stored.owner == current_user {
        RevisionRecord {
            owner: current_user.to_string(),
            ctime: if stored.ctime != 0 { stored.ctime } else { current_time },
            moder: String::new(),
            mtime: 0,
        }
    } else {
        RevisionRecord {
            owner: stored.owner.clone(),
            ctime: stored.ctime,
            moder: current_user.to_string(),
            mtime: current_time,
        }
    }
}

/// REVISION payload: `owner, ctime, moder, mtime`
pub fn write_revision(record: &RevisionRecord) -> PackedWriter {
    let mut writer = PackedWriter::new();
    writer
        .put_str(&record.owner)
        .put_u32(record.ctime)
        .put_str(&record.moder)
        .put_u32(record.mtime);
    writer
}
