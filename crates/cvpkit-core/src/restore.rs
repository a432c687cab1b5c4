// ── Restore reconciler ──
//
// Applies a normalized snapshot to a live controller in dependency order:
// roles, configlets, image bundles, containers, devices, then optionally
// the tasks those changes produced. Entities already on the controller
// are compared and updated only when they differ; every other controller
// error aborts the remaining steps. Nothing is rolled back.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use serde::Serialize;
use tokio::time::{Instant, sleep};
use tracing::{info, warn};

use crate::api::{ControllerApi, DeviceAddReport, Outcome};
use crate::config::TaskPolicy;
use crate::error::CoreError;
use crate::model::{
    Configlet, ConfigletKind, Container, Device, EntityType, Image, ImageBundle, Role,
    SnapshotDocument, TaskStatus, is_builtin_role,
};
use crate::version::{check_snapshot_version, gate_controller};

#[derive(Debug, Clone, Default)]
pub struct RestoreOptions {
    pub types: Vec<EntityType>,
    /// Lowercased configlet names. Requires `configlets` to be the only
    /// requested type besides `tasks`.
    pub name_filter: Option<Vec<String>>,
    pub skip_version_check: bool,
    pub task_policy: TaskPolicy,
}

impl RestoreOptions {
    fn wants(&self, entity_type: EntityType) -> bool {
        self.types.contains(&entity_type)
    }
}

/// One entity touched (or deliberately left alone) by a restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRef {
    pub entity_type: EntityType,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RestoreReport {
    pub created: Vec<EntityRef>,
    pub updated: Vec<EntityRef>,
    pub unchanged: Vec<EntityRef>,
    pub skipped: Vec<EntityRef>,
    pub devices: DeviceAddReport,
    /// Tasks executed to completion.
    pub tasks: Vec<u64>,
    pub warnings: Vec<String>,
}

impl RestoreReport {
    fn entry(entity_type: EntityType, name: &str) -> EntityRef {
        EntityRef {
            entity_type,
            name: name.to_owned(),
        }
    }

    fn created(&mut self, entity_type: EntityType, name: &str) {
        self.created.push(Self::entry(entity_type, name));
    }

    fn updated(&mut self, entity_type: EntityType, name: &str) {
        self.updated.push(Self::entry(entity_type, name));
    }

    fn unchanged(&mut self, entity_type: EntityType, name: &str) {
        self.unchanged.push(Self::entry(entity_type, name));
    }

    fn skipped(&mut self, entity_type: EntityType, name: &str, reason: &str) {
        self.skipped.push(Self::entry(entity_type, name));
        self.warn(format!("{entity_type} {name} skipped: {reason}"));
    }

    fn warn(&mut self, message: String) {
        warn!("{message}");
        self.warnings.push(message);
    }
}

/// Restore `document` onto the controller behind `api`.
pub async fn restore(
    api: &dyn ControllerApi,
    document: &SnapshotDocument,
    options: &RestoreOptions,
) -> Result<RestoreReport, CoreError> {
    if options.name_filter.is_some() {
        let filtered: Vec<_> = options
            .types
            .iter()
            .filter(|t| **t != EntityType::Tasks)
            .collect();
        if filtered != [&EntityType::Configlets] {
            return Err(CoreError::Validation {
                message: "a name filter is only valid with configlets as the single object type"
                    .into(),
            });
        }
    }
    gate_controller(api, options.skip_version_check).await?;
    if !options.skip_version_check {
        check_snapshot_version(&document.version)?;
    }

    let mut report = RestoreReport::default();
    let mut restorer = Restorer {
        api,
        document,
        report: &mut report,
    };

    if options.wants(EntityType::Roles) {
        restorer.roles().await?;
    }
    if options.wants(EntityType::Configlets) {
        restorer.configlets(options.name_filter.as_deref()).await?;
    }
    if options.wants(EntityType::ImageBundles) {
        restorer.image_bundles().await?;
    }
    if options.wants(EntityType::Containers) {
        restorer.containers().await?;
    }
    if options.wants(EntityType::Devices) {
        restorer.devices().await?;
    }
    if options.wants(EntityType::Tasks) {
        restorer.tasks(options.task_policy).await?;
    }
    Ok(report)
}

struct Restorer<'a> {
    api: &'a dyn ControllerApi,
    document: &'a SnapshotDocument,
    report: &'a mut RestoreReport,
}

impl Restorer<'_> {
    fn section<'d, T>(&mut self, items: Option<&'d Vec<T>>, entity_type: EntityType) -> &'d [T] {
        if let Some(items) = items {
            info!(entity_type = %entity_type, count = items.len(), "restoring");
            items
        } else {
            self.report
                .warn(format!("snapshot has no {entity_type} section"));
            &[]
        }
    }

    // ── Roles ────────────────────────────────────────────────────────

    async fn roles(&mut self) -> Result<(), CoreError> {
        let document = self.document;
        let roles = self.section(document.roles.as_ref(), EntityType::Roles);
        let mut live: HashMap<String, Role> = self
            .api
            .list_roles()
            .await?
            .into_iter()
            .map(|r| (r.name.clone(), r))
            .collect();
        for role in roles {
            if is_builtin_role(&role.name) {
                self.report
                    .skipped(EntityType::Roles, &role.name, "built-in role");
                continue;
            }
            let current = match live.remove(&role.name) {
                Some(current) => current,
                None => match self.api.create_role(role).await? {
                    Outcome::Created => {
                        self.report.created(EntityType::Roles, &role.name);
                        continue;
                    }
                    Outcome::AlreadyExists => self
                        .api
                        .list_roles()
                        .await?
                        .into_iter()
                        .find(|r| r.name == role.name)
                        .ok_or_else(|| CoreError::not_found("role", role.name.as_str()))?,
                },
            };
            if current.module_list == role.module_list {
                self.report.unchanged(EntityType::Roles, &role.name);
            } else {
                self.api.update_role(role).await?;
                self.report.updated(EntityType::Roles, &role.name);
            }
        }
        Ok(())
    }

    // ── Configlets ───────────────────────────────────────────────────

    async fn configlets(&mut self, name_filter: Option<&[String]>) -> Result<(), CoreError> {
        let document = self.document;
        let all = self.section(document.configlets.as_ref(), EntityType::Configlets);
        let selected: Vec<&Configlet> = match name_filter {
            None => all.iter().collect(),
            Some(names) => {
                let wanted: HashSet<String> = names.iter().map(|n| n.to_lowercase()).collect();
                let selected: Vec<&Configlet> = all
                    .iter()
                    .filter(|c| wanted.contains(&c.name.to_lowercase()))
                    .collect();
                let present: HashSet<String> =
                    selected.iter().map(|c| c.name.to_lowercase()).collect();
                let mut missing: Vec<&String> = wanted.difference(&present).collect();
                missing.sort();
                for name in missing {
                    self.report
                        .warn(format!("configlet {name} is not in the snapshot"));
                }
                selected
            }
        };

        let mut live: HashMap<String, Configlet> = self
            .api
            .list_configlets()
            .await?
            .into_iter()
            .map(|c| (c.name.clone(), c))
            .collect();
        for configlet in selected {
            if !configlet.is_restorable() {
                self.report.skipped(
                    EntityType::Configlets,
                    &configlet.name,
                    configlet.kind.type_name(),
                );
                continue;
            }
            let current = match live.remove(&configlet.name) {
                Some(current) => current,
                None => match self.api.create_configlet(configlet).await? {
                    Outcome::Created => {
                        self.report.created(EntityType::Configlets, &configlet.name);
                        continue;
                    }
                    Outcome::AlreadyExists => self.api.get_configlet(&configlet.name).await?,
                },
            };
            if same_content(&current, configlet)? {
                self.report.unchanged(EntityType::Configlets, &configlet.name);
            } else {
                self.api.update_configlet(configlet).await?;
                self.report.updated(EntityType::Configlets, &configlet.name);
            }
        }
        Ok(())
    }

    // ── Image bundles ────────────────────────────────────────────────

    async fn image_bundles(&mut self) -> Result<(), CoreError> {
        let document = self.document;
        let bundles = self.section(document.image_bundles.as_ref(), EntityType::ImageBundles);
        let known: HashMap<&str, &Image> = document
            .images
            .iter()
            .flatten()
            .map(|i| (i.name.as_str(), i))
            .collect();
        let mut live: HashMap<String, ImageBundle> = self
            .api
            .list_image_bundles()
            .await?
            .into_iter()
            .map(|b| (b.name.clone(), b))
            .collect();

        for bundle in bundles {
            let images: Vec<Image> = bundle
                .image_names
                .iter()
                .map(|name| {
                    known.get(name.as_str()).map_or_else(
                        || Image {
                            name: name.clone(),
                            reboot_required: false,
                        },
                        |i| (*i).clone(),
                    )
                })
                .collect();
            for name in &bundle.image_names {
                if !known.contains_key(name.as_str()) {
                    self.report.warn(format!(
                        "image {name} of bundle {} is not in the snapshot",
                        bundle.name
                    ));
                }
            }

            let current = match live.remove(&bundle.name) {
                Some(current) => current,
                None => match self.api.create_image_bundle(bundle, &images).await? {
                    Outcome::Created => {
                        self.report.created(EntityType::ImageBundles, &bundle.name);
                        continue;
                    }
                    Outcome::AlreadyExists => self.api.get_image_bundle(&bundle.name).await?,
                },
            };
            if same_bundle(&current, bundle) {
                self.report.unchanged(EntityType::ImageBundles, &bundle.name);
            } else {
                self.api.update_image_bundle(bundle, &images).await?;
                self.report.updated(EntityType::ImageBundles, &bundle.name);
            }
        }
        Ok(())
    }

    // ── Containers ───────────────────────────────────────────────────

    async fn containers(&mut self) -> Result<(), CoreError> {
        let document = self.document;
        let containers = self.section(document.containers.as_ref(), EntityType::Containers);
        if containers.is_empty() {
            return Ok(());
        }
        let root = containers
            .iter()
            .find(|c| c.is_root())
            .ok_or_else(|| CoreError::invalid_snapshot("container tree has no root"))?;

        let live_root = self
            .api
            .list_containers()
            .await?
            .into_iter()
            .find(Container::is_root);
        match live_root {
            Some(live) if live.name != root.name => {
                info!(from = %live.name, to = %root.name, "renaming root container");
                self.api.rename_container(&live.name, &root.name).await?;
                self.report.updated(EntityType::Containers, &root.name);
            }
            _ => self.report.unchanged(EntityType::Containers, &root.name),
        }

        // Breadth-first from the root so every parent exists before its
        // children, whatever order the snapshot lists them in.
        let mut placed: HashSet<&str> = HashSet::from([root.name.as_str()]);
        let mut queue = VecDeque::from([root.name.as_str()]);
        while let Some(parent) = queue.pop_front() {
            for child in containers.iter().filter(|c| c.parent_name == parent) {
                if !placed.insert(child.name.as_str()) {
                    continue;
                }
                match self.api.create_container(&child.name, parent).await? {
                    Outcome::Created => self.report.created(EntityType::Containers, &child.name),
                    Outcome::AlreadyExists => {
                        info!(container = %child.name, "container already exists");
                        self.report.unchanged(EntityType::Containers, &child.name);
                    }
                }
                queue.push_back(child.name.as_str());
            }
        }
        for orphan in containers
            .iter()
            .filter(|c| !placed.contains(c.name.as_str()))
        {
            self.report.skipped(
                EntityType::Containers,
                &orphan.name,
                "parent is not reachable from the root",
            );
        }

        // Attachments need the whole tree in place. Only what the live
        // container lacks is sent, so an unchanged target gets no new tasks.
        let live: HashMap<String, Container> = self
            .api
            .list_containers()
            .await?
            .into_iter()
            .map(|c| (c.name.clone(), c))
            .collect();
        for container in containers
            .iter()
            .filter(|c| placed.contains(c.name.as_str()))
        {
            let current = live.get(&container.name);
            if !container.image_bundle.is_empty()
                && current.is_none_or(|c| c.image_bundle != container.image_bundle)
            {
                self.api
                    .apply_image_bundle_to_container(&container.name, &container.image_bundle)
                    .await?;
            }
            let missing: Vec<String> = container
                .configlets
                .iter()
                .filter(|name| current.is_none_or(|c| !c.configlets.contains(name)))
                .cloned()
                .collect();
            if !missing.is_empty() {
                self.api
                    .apply_configlets_to_container(&container.name, &missing)
                    .await?;
            }
        }
        Ok(())
    }

    // ── Devices ──────────────────────────────────────────────────────

    async fn devices(&mut self) -> Result<(), CoreError> {
        let document = self.document;
        let devices = self.section(document.devices.as_ref(), EntityType::Devices);
        if devices.is_empty() {
            return Ok(());
        }
        let outcome = self.api.add_devices(devices).await?;
        for device in &outcome.unauthorized {
            self.report.warn(format!(
                "device {} rejected the controller's credentials",
                device.ip_address
            ));
        }
        for device in &outcome.unreachable {
            self.report
                .warn(format!("device {} could not be reached", device.ip_address));
        }

        for added in &outcome.connected {
            // The snapshot record carries the configlets and bundle to replay.
            let device = devices
                .iter()
                .find(|d| d.mac_address == added.mac_address || d.ip_address == added.ip_address)
                .unwrap_or(added);
            self.report.created(EntityType::Devices, &device.fqdn);

            self.replay_configlets(device).await;
            if !device.image_bundle.is_empty() {
                if let Err(e) = self
                    .api
                    .apply_image_bundle_to_device(device, &device.image_bundle)
                    .await
                {
                    self.report.warn(format!(
                        "image bundle {} for device {} not attached: {e}",
                        device.image_bundle, device.ip_address
                    ));
                }
            }
        }
        self.report.devices = outcome;
        Ok(())
    }

    /// Recreate the device's derived configlets, then attach the rest by
    /// name. A failure on one configlet is a warning; the others still go.
    async fn replay_configlets(&mut self, device: &Device) {
        let document = self.document;
        let mut by_reference = Vec::new();
        for name in &device.configlets {
            let added = match document.configlet(name).map(|c| (c, &c.kind)) {
                Some((configlet, ConfigletKind::Generated { .. })) => {
                    self.api.add_generated_configlet(configlet).await
                }
                Some((configlet, ConfigletKind::Reconciled { .. })) if configlet.reconciled => {
                    self.api.add_reconciled_configlet(configlet).await
                }
                _ => {
                    by_reference.push(name.clone());
                    continue;
                }
            };
            // The device MAC may have changed since the snapshot was taken.
            if let Err(e) = added {
                self.report.warn(format!(
                    "configlet {name} not added to device {}: {e}",
                    device.ip_address
                ));
            }
        }
        if by_reference.is_empty() {
            return;
        }
        if let Err(e) = self
            .api
            .apply_configlets_to_device(device, &by_reference)
            .await
        {
            self.report.warn(format!(
                "configlets for device {} not attached: {e}",
                device.ip_address
            ));
        }
    }

    // ── Tasks ────────────────────────────────────────────────────────

    async fn tasks(&mut self, policy: TaskPolicy) -> Result<(), CoreError> {
        let pending = self.api.list_tasks(Some(TaskStatus::Pending)).await?;
        let ids: Vec<u64> = pending.iter().map(|t| t.task_id).collect();
        info!(count = ids.len(), "executing pending tasks");
        for id in &ids {
            self.api.execute_task(*id).await?;
        }
        wait_for_tasks(self.api, &ids, policy).await?;
        self.report.tasks = ids;
        Ok(())
    }
}

/// Poll each task until it completes. One deadline covers all of them.
///
/// Failed or cancelled tasks and an expired deadline are errors.
pub async fn wait_for_tasks(
    api: &dyn ControllerApi,
    task_ids: &[u64],
    policy: TaskPolicy,
) -> Result<(), CoreError> {
    let deadline = Instant::now() + policy.timeout;
    for &task_id in task_ids {
        loop {
            let task = api.get_task(task_id).await?;
            match task.status {
                TaskStatus::Completed => break,
                TaskStatus::Failed | TaskStatus::Cancelled => {
                    return Err(CoreError::TaskFailed {
                        task_id,
                        status: task.status.to_string(),
                    });
                }
                TaskStatus::Pending => {
                    if Instant::now() >= deadline {
                        return Err(CoreError::TaskTimeout {
                            task_id,
                            timeout_secs: policy.timeout.as_secs(),
                        });
                    }
                    sleep(policy.interval).await;
                }
            }
        }
    }
    Ok(())
}

fn same_content(live: &Configlet, wanted: &Configlet) -> Result<bool, CoreError> {
    Ok(serde_json::to_value(live)? == serde_json::to_value(wanted)?)
}

fn same_bundle(live: &ImageBundle, wanted: &ImageBundle) -> bool {
    let live_images: BTreeSet<&str> = live.image_names.iter().map(String::as_str).collect();
    let wanted_images: BTreeSet<&str> = wanted.image_names.iter().map(String::as_str).collect();
    live.certified == wanted.certified && live_images == wanted_images
}
