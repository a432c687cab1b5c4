// In-memory controller that records every call.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;

use cvpkit_core::{
    Configlet, Container, ControllerApi, CoreError, Device, DeviceAddReport, Image, ImageBundle,
    Outcome, Role, Task, TaskStatus,
};

#[derive(Debug, Default, Clone)]
pub struct State {
    pub version: String,
    pub configlets: Vec<Configlet>,
    pub images: Vec<Image>,
    pub bundles: Vec<ImageBundle>,
    pub containers: Vec<Container>,
    pub devices: Vec<Device>,
    pub roles: Vec<Role>,
    pub tasks: Vec<Task>,
    /// Status a task reaches when executed.
    pub task_outcome: Option<TaskStatus>,
    /// IP addresses whose connection attempt fails.
    pub unreachable: HashSet<String>,
    /// IP addresses whose configlet attachment fails.
    pub failing_attach: HashSet<String>,
    /// Generated or reconciled configlet names the controller refuses.
    pub failing_derived: HashSet<String>,
}

pub struct FakeController {
    state: Mutex<State>,
    calls: Mutex<Vec<String>>,
}

fn not_found(entity_type: &str, identifier: &str) -> CoreError {
    CoreError::NotFound {
        entity_type: entity_type.into(),
        identifier: identifier.into(),
    }
}

impl FakeController {
    pub fn new(state: State) -> Self {
        Self {
            state: Mutex::new(state),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A freshly installed controller: the `Tenant` root and built-in roles.
    pub fn fresh() -> Self {
        Self::new(State {
            version: "2016.1.2".into(),
            containers: vec![container("Tenant", "")],
            roles: vec![role("network-admin", "admin"), role("network-operator", "op")],
            task_outcome: Some(TaskStatus::Completed),
            ..State::default()
        })
    }

    pub fn state(&self) -> State {
        self.state.lock().unwrap().clone()
    }

    pub fn with_state(&self, f: impl FnOnce(&mut State)) {
        f(&mut self.state.lock().unwrap());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls whose operation name is exactly `op`.
    pub fn calls_to(&self, op: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.split(':').next() == Some(op))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, op: &str, arg: &str) {
        self.calls.lock().unwrap().push(format!("{op}:{arg}"));
    }
}

pub fn container(name: &str, parent: &str) -> Container {
    Container {
        name: name.into(),
        parent_name: parent.into(),
        configlets: Vec::new(),
        image_bundle: String::new(),
    }
}

pub fn device(ip: &str, fqdn: &str, mac: &str, container_name: &str) -> Device {
    Device {
        ip_address: ip.into(),
        fqdn: fqdn.into(),
        mac_address: mac.into(),
        container_name: container_name.into(),
        image_bundle: String::new(),
        configlets: Vec::new(),
    }
}

pub fn role(name: &str, description: &str) -> Role {
    Role {
        name: name.into(),
        description: description.into(),
        module_list: vec![serde_json::json!({"name": "inventory", "mode": "rw"})],
    }
}

#[async_trait]
impl ControllerApi for FakeController {
    async fn version(&self) -> Result<String, CoreError> {
        self.record("version", "");
        Ok(self.state.lock().unwrap().version.clone())
    }

    // ── Configlets ───────────────────────────────────────────────────

    async fn list_configlets(&self) -> Result<Vec<Configlet>, CoreError> {
        self.record("list_configlets", "");
        Ok(self.state.lock().unwrap().configlets.clone())
    }

    async fn get_configlet(&self, name: &str) -> Result<Configlet, CoreError> {
        self.record("get_configlet", name);
        let state = self.state.lock().unwrap();
        state
            .configlets
            .iter()
            .find(|c| c.name == name)
            .cloned()
            .ok_or_else(|| not_found("configlet", name))
    }

    async fn create_configlet(&self, configlet: &Configlet) -> Result<Outcome, CoreError> {
        self.record("create_configlet", &configlet.name);
        let mut state = self.state.lock().unwrap();
        if state.configlets.iter().any(|c| c.name == configlet.name) {
            return Ok(Outcome::AlreadyExists);
        }
        state.configlets.push(configlet.clone());
        Ok(Outcome::Created)
    }

    async fn update_configlet(&self, configlet: &Configlet) -> Result<(), CoreError> {
        self.record("update_configlet", &configlet.name);
        let mut state = self.state.lock().unwrap();
        let slot = state
            .configlets
            .iter_mut()
            .find(|c| c.name == configlet.name)
            .ok_or_else(|| not_found("configlet", &configlet.name))?;
        *slot = configlet.clone();
        Ok(())
    }

    async fn delete_configlet(&self, name: &str) -> Result<(), CoreError> {
        self.record("delete_configlet", name);
        let mut state = self.state.lock().unwrap();
        let before = state.configlets.len();
        state.configlets.retain(|c| c.name != name);
        if state.configlets.len() == before {
            return Err(not_found("configlet", name));
        }
        Ok(())
    }

    async fn add_generated_configlet(&self, configlet: &Configlet) -> Result<Outcome, CoreError> {
        self.record("add_generated_configlet", &configlet.name);
        let mut state = self.state.lock().unwrap();
        if state.failing_derived.contains(&configlet.name) {
            return Err(not_found("configlet builder", &configlet.name));
        }
        if state.configlets.iter().any(|c| c.name == configlet.name) {
            return Ok(Outcome::AlreadyExists);
        }
        state.configlets.push(configlet.clone());
        Ok(Outcome::Created)
    }

    async fn add_reconciled_configlet(&self, configlet: &Configlet) -> Result<Outcome, CoreError> {
        self.record("add_reconciled_configlet", &configlet.name);
        let mut state = self.state.lock().unwrap();
        if state.failing_derived.contains(&configlet.name) {
            return Err(not_found("configlet builder", &configlet.name));
        }
        if state.configlets.iter().any(|c| c.name == configlet.name) {
            return Ok(Outcome::AlreadyExists);
        }
        state.configlets.push(configlet.clone());
        Ok(Outcome::Created)
    }

    // ── Images ───────────────────────────────────────────────────────

    async fn list_images(&self) -> Result<Vec<Image>, CoreError> {
        self.record("list_images", "");
        Ok(self.state.lock().unwrap().images.clone())
    }

    async fn download_image(&self, name: &str, dir: &Path) -> Result<(), CoreError> {
        self.record("download_image", name);
        std::fs::write(dir.join(name), format!("contents of {name}"))?;
        Ok(())
    }

    async fn list_image_bundles(&self) -> Result<Vec<ImageBundle>, CoreError> {
        self.record("list_image_bundles", "");
        Ok(self.state.lock().unwrap().bundles.clone())
    }

    async fn get_image_bundle(&self, name: &str) -> Result<ImageBundle, CoreError> {
        self.record("get_image_bundle", name);
        let state = self.state.lock().unwrap();
        state
            .bundles
            .iter()
            .find(|b| b.name == name)
            .cloned()
            .ok_or_else(|| not_found("image bundle", name))
    }

    async fn create_image_bundle(
        &self,
        bundle: &ImageBundle,
        images: &[Image],
    ) -> Result<Outcome, CoreError> {
        self.record("create_image_bundle", &bundle.name);
        let mut state = self.state.lock().unwrap();
        if state.bundles.iter().any(|b| b.name == bundle.name) {
            return Ok(Outcome::AlreadyExists);
        }
        for image in images {
            if !state.images.iter().any(|i| i.name == image.name) {
                state.images.push(image.clone());
            }
        }
        state.bundles.push(bundle.clone());
        Ok(Outcome::Created)
    }

    async fn update_image_bundle(
        &self,
        bundle: &ImageBundle,
        _images: &[Image],
    ) -> Result<(), CoreError> {
        self.record("update_image_bundle", &bundle.name);
        let mut state = self.state.lock().unwrap();
        let slot = state
            .bundles
            .iter_mut()
            .find(|b| b.name == bundle.name)
            .ok_or_else(|| not_found("image bundle", &bundle.name))?;
        *slot = bundle.clone();
        Ok(())
    }

    async fn delete_image_bundle(&self, name: &str) -> Result<(), CoreError> {
        self.record("delete_image_bundle", name);
        self.state.lock().unwrap().bundles.retain(|b| b.name != name);
        Ok(())
    }

    // ── Containers ───────────────────────────────────────────────────

    async fn list_containers(&self) -> Result<Vec<Container>, CoreError> {
        self.record("list_containers", "");
        let mut containers = self.state.lock().unwrap().containers.clone();
        containers.sort_by_key(|c| !c.is_root());
        Ok(containers)
    }

    async fn create_container(&self, name: &str, parent_name: &str) -> Result<Outcome, CoreError> {
        self.record("create_container", name);
        let mut state = self.state.lock().unwrap();
        if state.containers.iter().any(|c| c.name == name) {
            return Ok(Outcome::AlreadyExists);
        }
        if !state.containers.iter().any(|c| c.name == parent_name) {
            return Err(not_found("container", parent_name));
        }
        state.containers.push(container(name, parent_name));
        Ok(Outcome::Created)
    }

    async fn delete_container(&self, name: &str, _parent_name: &str) -> Result<(), CoreError> {
        self.record("delete_container", name);
        let mut state = self.state.lock().unwrap();
        if state.containers.iter().any(|c| c.parent_name == name) {
            return Err(CoreError::Validation {
                message: format!("container {name} still has children"),
            });
        }
        if state.devices.iter().any(|d| d.container_name == name) {
            return Err(CoreError::Validation {
                message: format!("container {name} still has devices"),
            });
        }
        state.containers.retain(|c| c.name != name);
        Ok(())
    }

    async fn rename_container(&self, old_name: &str, new_name: &str) -> Result<(), CoreError> {
        self.record("rename_container", &format!("{old_name}->{new_name}"));
        let mut state = self.state.lock().unwrap();
        for c in &mut state.containers {
            if c.name == old_name {
                c.name = new_name.into();
            }
            if c.parent_name == old_name {
                c.parent_name = new_name.into();
            }
        }
        Ok(())
    }

    async fn apply_configlets_to_container(
        &self,
        container_name: &str,
        configlets: &[String],
    ) -> Result<(), CoreError> {
        self.record("apply_configlets_to_container", container_name);
        let mut state = self.state.lock().unwrap();
        let slot = state
            .containers
            .iter_mut()
            .find(|c| c.name == container_name)
            .ok_or_else(|| not_found("container", container_name))?;
        for name in configlets {
            if !slot.configlets.contains(name) {
                slot.configlets.push(name.clone());
            }
        }
        Ok(())
    }

    async fn remove_configlets_from_container(
        &self,
        container_name: &str,
        configlets: &[String],
    ) -> Result<(), CoreError> {
        self.record("remove_configlets_from_container", container_name);
        let mut state = self.state.lock().unwrap();
        if let Some(slot) = state.containers.iter_mut().find(|c| c.name == container_name) {
            slot.configlets.retain(|n| !configlets.contains(n));
        }
        Ok(())
    }

    async fn apply_image_bundle_to_container(
        &self,
        container_name: &str,
        bundle: &str,
    ) -> Result<(), CoreError> {
        self.record("apply_image_bundle_to_container", container_name);
        let mut state = self.state.lock().unwrap();
        if let Some(slot) = state.containers.iter_mut().find(|c| c.name == container_name) {
            slot.image_bundle = bundle.into();
        }
        Ok(())
    }

    async fn remove_image_bundle_from_container(
        &self,
        container_name: &str,
        _bundle: &str,
    ) -> Result<(), CoreError> {
        self.record("remove_image_bundle_from_container", container_name);
        let mut state = self.state.lock().unwrap();
        if let Some(slot) = state.containers.iter_mut().find(|c| c.name == container_name) {
            slot.image_bundle.clear();
        }
        Ok(())
    }

    // ── Devices ──────────────────────────────────────────────────────

    async fn list_devices(&self) -> Result<Vec<Device>, CoreError> {
        self.record("list_devices", "");
        Ok(self.state.lock().unwrap().devices.clone())
    }

    async fn add_devices(&self, devices: &[Device]) -> Result<DeviceAddReport, CoreError> {
        self.record("add_devices", &devices.len().to_string());
        let mut state = self.state.lock().unwrap();
        let mut report = DeviceAddReport::default();
        for d in devices {
            if state.unreachable.contains(&d.ip_address) {
                report.unreachable.push(d.clone());
                continue;
            }
            let mut added = d.clone();
            added.configlets.clear();
            added.image_bundle.clear();
            state.devices.push(added.clone());
            report.connected.push(added);
        }
        Ok(report)
    }

    async fn delete_device(&self, device: &Device) -> Result<(), CoreError> {
        self.record("delete_device", &device.ip_address);
        let mut state = self.state.lock().unwrap();
        state.devices.retain(|d| d.mac_address != device.mac_address);
        Ok(())
    }

    async fn apply_configlets_to_device(
        &self,
        device: &Device,
        configlets: &[String],
    ) -> Result<(), CoreError> {
        self.record("apply_configlets_to_device", &device.ip_address);
        let mut state = self.state.lock().unwrap();
        if state.failing_attach.contains(&device.ip_address) {
            return Err(CoreError::Validation {
                message: format!("attach rejected for {}", device.ip_address),
            });
        }
        let slot = state
            .devices
            .iter_mut()
            .find(|d| d.mac_address == device.mac_address)
            .ok_or_else(|| not_found("device", &device.mac_address))?;
        slot.configlets.extend(configlets.iter().cloned());
        Ok(())
    }

    async fn apply_image_bundle_to_device(
        &self,
        device: &Device,
        bundle: &str,
    ) -> Result<(), CoreError> {
        self.record("apply_image_bundle_to_device", &device.ip_address);
        let mut state = self.state.lock().unwrap();
        if let Some(slot) = state
            .devices
            .iter_mut()
            .find(|d| d.mac_address == device.mac_address)
        {
            slot.image_bundle = bundle.into();
        }
        Ok(())
    }

    async fn run_compliance_check(&self, device_mac: &str) -> Result<bool, CoreError> {
        self.record("run_compliance_check", device_mac);
        Ok(true)
    }

    // ── Roles ────────────────────────────────────────────────────────

    async fn list_roles(&self) -> Result<Vec<Role>, CoreError> {
        self.record("list_roles", "");
        Ok(self.state.lock().unwrap().roles.clone())
    }

    async fn create_role(&self, role: &Role) -> Result<Outcome, CoreError> {
        self.record("create_role", &role.name);
        let mut state = self.state.lock().unwrap();
        if state.roles.iter().any(|r| r.name == role.name) {
            return Ok(Outcome::AlreadyExists);
        }
        state.roles.push(role.clone());
        Ok(Outcome::Created)
    }

    async fn update_role(&self, role: &Role) -> Result<(), CoreError> {
        self.record("update_role", &role.name);
        let mut state = self.state.lock().unwrap();
        if let Some(slot) = state.roles.iter_mut().find(|r| r.name == role.name) {
            *slot = role.clone();
        }
        Ok(())
    }

    async fn delete_role(&self, name: &str) -> Result<(), CoreError> {
        self.record("delete_role", name);
        self.state.lock().unwrap().roles.retain(|r| r.name != name);
        Ok(())
    }

    // ── Tasks ────────────────────────────────────────────────────────

    async fn list_tasks(&self, status: Option<TaskStatus>) -> Result<Vec<Task>, CoreError> {
        self.record("list_tasks", "");
        let state = self.state.lock().unwrap();
        Ok(state
            .tasks
            .iter()
            .filter(|t| status.is_none_or(|s| t.status == s))
            .cloned()
            .collect())
    }

    async fn execute_task(&self, task_id: u64) -> Result<(), CoreError> {
        self.record("execute_task", &task_id.to_string());
        let mut state = self.state.lock().unwrap();
        let outcome = state.task_outcome;
        if let Some(task) = state.tasks.iter_mut().find(|t| t.task_id == task_id) {
            if let Some(outcome) = outcome {
                task.status = outcome;
            }
        }
        Ok(())
    }

    async fn get_task(&self, task_id: u64) -> Result<Task, CoreError> {
        self.record("get_task", &task_id.to_string());
        let state = self.state.lock().unwrap();
        state
            .tasks
            .iter()
            .find(|t| t.task_id == task_id)
            .cloned()
            .ok_or_else(|| not_found("task", &task_id.to_string()))
    }

    async fn cancel_task(&self, task_id: u64) -> Result<(), CoreError> {
        self.record("cancel_task", &task_id.to_string());
        Ok(())
    }

    async fn add_note_to_task(&self, task_id: u64, _note: &str) -> Result<(), CoreError> {
        self.record("add_note_to_task", &task_id.to_string());
        Ok(())
    }
}
