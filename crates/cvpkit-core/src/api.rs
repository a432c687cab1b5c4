// ── Controller operations consumed by the engines ──
//
// The snapshot writer, restore reconciler and reset engine speak to the
// controller only through this trait. `CvpController` implements it over
// the HTTP client; tests substitute an in-memory fake.

use std::path::Path;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::CoreError;
use crate::model::{Configlet, Container, Device, Image, ImageBundle, Role, Task, TaskStatus};

/// Result of a create call. "Already exists" is an expected answer, not an
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Outcome {
    Created,
    AlreadyExists,
}

impl Outcome {
    /// Map an API result, turning the "already exists" family into
    /// [`Outcome::AlreadyExists`].
    pub fn from_result(result: Result<(), cvpkit_api::Error>) -> Result<Self, CoreError> {
        match result {
            Ok(()) => Ok(Self::Created),
            Err(e) if e.is_conflict() => Ok(Self::AlreadyExists),
            Err(e) => Err(e.into()),
        }
    }
}

/// The three disjoint outcomes of a batch device add.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceAddReport {
    pub connected: Vec<Device>,
    /// The controller's device credentials were rejected.
    pub unauthorized: Vec<Device>,
    /// Connection attempt failed.
    pub unreachable: Vec<Device>,
}

#[async_trait]
pub trait ControllerApi: Send + Sync {
    /// Controller software version string.
    async fn version(&self) -> Result<String, CoreError>;

    // ── Configlets ───────────────────────────────────────────────────

    async fn list_configlets(&self) -> Result<Vec<Configlet>, CoreError>;
    async fn get_configlet(&self, name: &str) -> Result<Configlet, CoreError>;
    /// Create a static configlet or a builder.
    async fn create_configlet(&self, configlet: &Configlet) -> Result<Outcome, CoreError>;
    async fn update_configlet(&self, configlet: &Configlet) -> Result<(), CoreError>;
    async fn delete_configlet(&self, name: &str) -> Result<(), CoreError>;
    /// Recreate a generated configlet, relinking builder, container and device.
    async fn add_generated_configlet(&self, configlet: &Configlet) -> Result<Outcome, CoreError>;
    /// Recreate a reconciled configlet and link it to its device.
    async fn add_reconciled_configlet(&self, configlet: &Configlet) -> Result<Outcome, CoreError>;

    // ── Images ───────────────────────────────────────────────────────

    async fn list_images(&self) -> Result<Vec<Image>, CoreError>;
    /// Download an image's content into `dir`, named after the image.
    async fn download_image(&self, name: &str, dir: &Path) -> Result<(), CoreError>;
    async fn list_image_bundles(&self) -> Result<Vec<ImageBundle>, CoreError>;
    async fn get_image_bundle(&self, name: &str) -> Result<ImageBundle, CoreError>;
    /// Create a bundle; `images` carries the reboot flag of every member.
    async fn create_image_bundle(
        &self,
        bundle: &ImageBundle,
        images: &[Image],
    ) -> Result<Outcome, CoreError>;
    async fn update_image_bundle(&self, bundle: &ImageBundle, images: &[Image])
    -> Result<(), CoreError>;
    async fn delete_image_bundle(&self, name: &str) -> Result<(), CoreError>;

    // ── Containers ───────────────────────────────────────────────────

    /// All containers, root first, with attached configlets and bundle.
    async fn list_containers(&self) -> Result<Vec<Container>, CoreError>;
    async fn create_container(&self, name: &str, parent_name: &str) -> Result<Outcome, CoreError>;
    async fn delete_container(&self, name: &str, parent_name: &str) -> Result<(), CoreError>;
    async fn rename_container(&self, old_name: &str, new_name: &str) -> Result<(), CoreError>;
    /// Attach configlets, keeping those already attached.
    async fn apply_configlets_to_container(
        &self,
        container: &str,
        configlets: &[String],
    ) -> Result<(), CoreError>;
    async fn remove_configlets_from_container(
        &self,
        container: &str,
        configlets: &[String],
    ) -> Result<(), CoreError>;
    async fn apply_image_bundle_to_container(
        &self,
        container: &str,
        bundle: &str,
    ) -> Result<(), CoreError>;
    async fn remove_image_bundle_from_container(
        &self,
        container: &str,
        bundle: &str,
    ) -> Result<(), CoreError>;

    // ── Devices ──────────────────────────────────────────────────────

    async fn list_devices(&self) -> Result<Vec<Device>, CoreError>;
    /// Add devices as one pipeline and wait for every connection attempt.
    async fn add_devices(&self, devices: &[Device]) -> Result<DeviceAddReport, CoreError>;
    async fn delete_device(&self, device: &Device) -> Result<(), CoreError>;
    /// Attach configlets by name, keeping those already attached.
    async fn apply_configlets_to_device(
        &self,
        device: &Device,
        configlets: &[String],
    ) -> Result<(), CoreError>;
    async fn apply_image_bundle_to_device(&self, device: &Device, bundle: &str)
    -> Result<(), CoreError>;
    /// Whether the device's running config matches its designed config.
    async fn run_compliance_check(&self, device_mac: &str) -> Result<bool, CoreError>;

    // ── Roles ────────────────────────────────────────────────────────

    async fn list_roles(&self) -> Result<Vec<Role>, CoreError>;
    async fn create_role(&self, role: &Role) -> Result<Outcome, CoreError>;
    async fn update_role(&self, role: &Role) -> Result<(), CoreError>;
    async fn delete_role(&self, name: &str) -> Result<(), CoreError>;

    // ── Tasks ────────────────────────────────────────────────────────

    async fn list_tasks(&self, status: Option<TaskStatus>) -> Result<Vec<Task>, CoreError>;
    async fn execute_task(&self, task_id: u64) -> Result<(), CoreError>;
    async fn get_task(&self, task_id: u64) -> Result<Task, CoreError>;
    async fn cancel_task(&self, task_id: u64) -> Result<(), CoreError>;
    async fn add_note_to_task(&self, task_id: u64, note: &str) -> Result<(), CoreError>;
}
