//! Snapshot, restore and reset engines for CloudVision Portal inventories.
//!
//! The engines talk to a controller only through the [`ControllerApi`]
//! trait:
//!
//! - **[`capture_snapshot`]** reads the requested entity types into a
//!   [`SnapshotDocument`] and stages image files for the archive.
//!
//! - **[`archive`]** writes and reads the tar archive that carries a
//!   snapshot and its images.
//!
//! - **[`normalize`]** upgrades a raw document from any supported format
//!   version to the current shape through a table of rules.
//!
//! - **[`restore()`]** reconciles a snapshot onto a controller in
//!   dependency order, creating what is missing and updating only what
//!   differs.
//!
//! - **[`reset()`]** deletes inventory in reverse dependency order.
//!
//! - **[`CvpController`]** implements [`ControllerApi`] over
//!   [`cvpkit_api::CvpClient`].

pub mod api;
pub mod archive;
pub mod config;
pub mod controller;
pub mod error;
pub mod model;
pub mod reset;
pub mod restore;
pub mod snapshot;
pub mod translate;
pub mod version;

// ── Primary re-exports ──────────────────────────────────────────────
pub use api::{ControllerApi, DeviceAddReport, Outcome};
pub use config::{ControllerConfig, TaskPolicy, TlsVerification};
pub use controller::CvpController;
pub use error::CoreError;
pub use reset::{ResetOptions, ResetReport, reset};
pub use restore::{EntityRef, RestoreOptions, RestoreReport, restore, wait_for_tasks};
pub use snapshot::{Capture, CaptureOptions, capture_snapshot};
pub use translate::{TranslateOptions, normalize};

pub use model::{
    Configlet, ConfigletKind, Container, Device, EntityType, Image, ImageBundle, Role,
    SnapshotDocument, Task, TaskStatus,
};
