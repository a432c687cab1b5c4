// ── Format and controller versions ──
//
// Snapshot documents carry a dotted format version (`2016.1.2`). Versions
// compare component-wise as integers, so `2016.1.10` sorts after
// `2016.1.2`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::api::ControllerApi;
use crate::error::CoreError;

/// Format version written into every new snapshot.
pub const CURRENT_FORMAT: &str = "2016.1.2";

/// Assumed when a document carries no version at all.
pub const OLDEST_FORMAT: &str = "2015.1.2";

/// Snapshot versions restore accepts.
pub const SUPPORTED_FORMATS: [&str; 3] = ["2015.1.2", "2016.1.0", "2016.1.2"];

/// Controller software version this tool is built against.
pub const SUPPORTED_CONTROLLER: &str = "2016.1.2";

#[derive(Debug, Clone)]
pub struct FormatVersion(Vec<u32>);

impl FormatVersion {
    pub fn current() -> Self {
        Self(vec![2016, 1, 2])
    }

    /// Highest version the translator knows how to read.
    pub fn known_max() -> Self {
        Self::current()
    }
}

impl FromStr for FormatVersion {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .trim()
            .split('.')
            .map(str::parse::<u32>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| CoreError::UnsupportedSnapshotVersion {
                version: s.to_owned(),
                supported: SUPPORTED_FORMATS.join(", "),
            })?;
        Ok(Self(parts))
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(u32::to_string).collect();
        f.write_str(&parts.join("."))
    }
}

impl PartialEq for FormatVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for FormatVersion {}

impl PartialOrd for FormatVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FormatVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.0.len().max(other.0.len());
        (0..len)
            .map(|i| {
                let a = self.0.get(i).copied().unwrap_or(0);
                let b = other.0.get(i).copied().unwrap_or(0);
                a.cmp(&b)
            })
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

/// The live controller must run exactly the version this tool supports.
pub fn check_controller_version(found: &str) -> Result<(), CoreError> {
    if found.trim() == SUPPORTED_CONTROLLER {
        Ok(())
    } else {
        Err(CoreError::VersionMismatch {
            found: found.to_owned(),
            expected: SUPPORTED_CONTROLLER.to_owned(),
        })
    }
}

/// Query the live controller and enforce [`check_controller_version`],
/// unless the operator asked to skip the gate.
pub async fn gate_controller(api: &dyn ControllerApi, skip: bool) -> Result<(), CoreError> {
    if skip {
        warn!("skipping controller version check");
        return Ok(());
    }
    let found = api.version().await?;
    check_controller_version(&found)
}

/// Restore only accepts documents written by a supported format version.
pub fn check_snapshot_version(version: &str) -> Result<(), CoreError> {
    if SUPPORTED_FORMATS.contains(&version.trim()) {
        Ok(())
    } else {
        Err(CoreError::UnsupportedSnapshotVersion {
            version: version.to_owned(),
            supported: SUPPORTED_FORMATS.join(", "),
        })
    }
}
