// ── Live controller ──
//
// `ControllerApi` over the HTTP client. The controller addresses most
// objects by opaque keys while snapshots use names, so nearly every call
// here resolves names to keys first. Image uploads read from a staging
// directory that holds the files extracted from an archive.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use cvpkit_api::models::{BundleImage, ConfigletInfo, ConfigletMappers, ContainerNode, TempDevice};
use cvpkit_api::{ConfigletRefs, CvpClient};

use crate::api::{ControllerApi, DeviceAddReport, Outcome};
use crate::config::{ControllerConfig, TaskPolicy};
use crate::error::CoreError;
use crate::model::{
    Configlet, ConfigletKind, Container, Device, Image, ImageBundle, Role, Task, TaskStatus,
    UNDEFINED_CONTAINER,
};

/// Key the controller uses for the undefined container.
const UNDEFINED_CONTAINER_KEY: &str = "undefined_container";

const STATUS_CONNECTING: &str = "Connecting";
const STATUS_CONNECTED: &str = "Connected";
const STATUS_DUPLICATE: &str = "Duplicate";
const STATUS_UNAUTHORIZED: &str = "Unauthorized access";

pub struct CvpController {
    client: CvpClient,
    staging: PathBuf,
    policy: TaskPolicy,
}

impl CvpController {
    pub fn new(client: CvpClient, staging: impl Into<PathBuf>, policy: TaskPolicy) -> Self {
        Self {
            client,
            staging: staging.into(),
            policy,
        }
    }

    /// Build a client from `config` and log in.
    pub async fn connect(
        config: &ControllerConfig,
        staging: impl Into<PathBuf>,
    ) -> Result<Self, CoreError> {
        let client = CvpClient::new(config.url.clone(), &config.transport())?;
        info!(url = %config.url, user = %config.username, "logging in");
        client.login(&config.username, &config.password).await?;
        Ok(Self::new(client, staging, config.task_policy))
    }

    pub async fn logout(&self) -> Result<(), CoreError> {
        Ok(self.client.logout().await?)
    }

    pub fn client(&self) -> &CvpClient {
        &self.client
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging
    }

    pub fn task_policy(&self) -> TaskPolicy {
        self.policy
    }

    // ── Name to key resolution ───────────────────────────────────────

    async fn container_key(&self, name: &str) -> Result<String, CoreError> {
        if name == UNDEFINED_CONTAINER {
            return Ok(UNDEFINED_CONTAINER_KEY.into());
        }
        self.client
            .search_containers(name)
            .await?
            .into_iter()
            .find(|c| c.name == name)
            .map(|c| c.key)
            .ok_or_else(|| CoreError::not_found("container", name))
    }

    async fn configlet_key(&self, name: &str) -> Result<String, CoreError> {
        Ok(self.client.get_configlet_by_name(name).await?.key)
    }

    async fn image_bundle_key(&self, name: &str) -> Result<String, CoreError> {
        let info = self.client.get_image_bundle_by_name(name).await?;
        if info.id.is_empty() {
            return Err(CoreError::not_found("image bundle", name));
        }
        Ok(info.id)
    }

    async fn role_key(&self, name: &str) -> Result<String, CoreError> {
        self.client
            .list_roles()
            .await?
            .into_iter()
            .find(|r| r.name == name)
            .map(|r| r.key)
            .ok_or_else(|| CoreError::not_found("role", name))
    }

    /// Name to (key, type) for every configlet on the controller.
    async fn configlet_index(&self) -> Result<HashMap<String, (String, String)>, CoreError> {
        Ok(self
            .client
            .list_configlets()
            .await?
            .into_iter()
            .map(|c| (c.name, (c.key, c.configlet_type)))
            .collect())
    }

    // ── Conversions ──────────────────────────────────────────────────

    async fn configlet_from_info(
        &self,
        info: ConfigletInfo,
        mappers: &ConfigletMappers,
    ) -> Result<Configlet, CoreError> {
        match info.configlet_type.as_str() {
            "Static" if !info.reconciled => Ok(Configlet::new_static(info.name, info.config)),
            "Static" => {
                // Reconciled configlets outlive their device, so the mapper
                // can be missing.
                let device_mac = mappers
                    .configlet_mappers
                    .iter()
                    .find(|m| m.configlet_id == info.key)
                    .map(|m| m.object_id.clone())
                    .unwrap_or_default();
                Ok(Configlet::new_reconciled(info.name, info.config, device_mac))
            }
            "Generated" => {
                let Some(mapper) = mappers
                    .generated_configlet_mappers
                    .iter()
                    .find(|m| m.configlet_id == info.key)
                else {
                    debug!(configlet = %info.name, "generated configlet has no mapper");
                    return Ok(Configlet::new_generated(info.name, info.config, "", "", ""));
                };
                let builder = self
                    .client
                    .get_configlet_builder(&mapper.configlet_builder_id)
                    .await?;
                let container = self.client.container_by_id(&mapper.container_id).await?;
                Ok(Configlet::new_generated(
                    info.name,
                    info.config,
                    builder.name,
                    container.name,
                    mapper.net_element_id.clone(),
                ))
            }
            "Builder" => {
                let builder = self.client.get_configlet_builder(&info.key).await?;
                let form_list = builder
                    .form_list
                    .into_iter()
                    .map(|mut form| {
                        form.remove("configletBuilderId");
                        form.remove("key");
                        form
                    })
                    .collect();
                Ok(Configlet::new_builder(
                    info.name,
                    form_list,
                    builder.main_script.data,
                ))
            }
            other => Err(CoreError::UnknownConfigletType {
                name: info.name,
                configlet_type: other.to_owned(),
            }),
        }
    }

    /// Give every submitted form the key of the live form with the same
    /// `fieldId`, so the update edits forms in place.
    async fn with_live_form_keys(
        &self,
        form_list: &[Map<String, Value>],
        builder_key: &str,
    ) -> Result<Vec<Map<String, Value>>, CoreError> {
        let live = self.client.get_configlet_builder(builder_key).await?;
        let keys: HashMap<String, Value> = live
            .form_list
            .iter()
            .filter_map(|form| {
                let field = form.get("fieldId")?.as_str()?;
                Some((field.to_owned(), form.get("key")?.clone()))
            })
            .collect();
        Ok(form_list
            .iter()
            .cloned()
            .map(|mut form| {
                let key = form
                    .get("fieldId")
                    .and_then(Value::as_str)
                    .and_then(|field| keys.get(field))
                    .cloned();
                if let Some(key) = key {
                    form.insert("key".into(), key);
                }
                form
            })
            .collect())
    }

    /// Bundle entries for `images`, uploading any image the controller
    /// does not have yet from the staging directory.
    async fn bundle_images(&self, images: &[Image]) -> Result<Vec<BundleImage>, CoreError> {
        let live = self.client.list_images().await?;
        let mut out = Vec::with_capacity(images.len());
        for image in images {
            let reboot = if image.reboot_required { "true" } else { "false" };
            let entry = if let Some(info) = live.iter().find(|i| i.name == image.name) {
                BundleImage {
                    name: info.name.clone(),
                    image_size: info.image_size.clone(),
                    image_id: info.image_id.clone(),
                    md5: info.md5.clone(),
                    version: info.version.clone(),
                    key: info.key.clone(),
                    is_reboot_required: reboot.into(),
                }
            } else {
                let path = self.staging.join(&image.name);
                info!(image = %image.name, "uploading image");
                let info = self.client.upload_image(&path).await?;
                BundleImage {
                    name: image.name.clone(),
                    image_size: info.image_size,
                    image_id: info.image_id,
                    md5: info.md5,
                    version: info.version,
                    key: None,
                    is_reboot_required: reboot.into(),
                }
            };
            out.push(entry);
        }
        Ok(out)
    }

    /// Bundle name by container name and by device IP address.
    async fn applied_bundles(
        &self,
    ) -> Result<(HashMap<String, String>, HashMap<String, String>), CoreError> {
        let mut containers = HashMap::new();
        let mut devices = HashMap::new();
        for bundle in self.client.list_image_bundles().await? {
            for c in self.client.image_bundle_containers(&bundle.name).await? {
                containers.insert(c.container_name, bundle.name.clone());
            }
            for d in self.client.image_bundle_devices(&bundle.name).await? {
                devices.insert(d.ip_address, bundle.name.clone());
            }
        }
        Ok((containers, devices))
    }

    async fn temp_status(&self, device: &Device) -> Result<Option<TempDevice>, CoreError> {
        let short_name = device.fqdn.split('.').next().unwrap_or_default();
        Ok(self
            .client
            .retrieve_inventory()
            .await?
            .temp_net_element
            .into_iter()
            .find(|t| t.fqdn == short_name || t.ip_address == device.ip_address))
    }

    /// Poll a device's temp entry until it leaves `Connecting` or the poll
    /// deadline passes.
    async fn wait_for_connection(&self, device: &Device) -> Result<Option<TempDevice>, CoreError> {
        let deadline = Instant::now() + self.policy.timeout;
        loop {
            let status = self.temp_status(device).await?;
            let connecting = status.as_ref().is_some_and(|s| s.status == STATUS_CONNECTING);
            if !connecting || Instant::now() >= deadline {
                return Ok(status);
            }
            sleep(self.policy.interval).await;
        }
    }

    async fn device_configlet_refs(
        &self,
        names: &[String],
        index: &HashMap<String, (String, String)>,
    ) -> Result<ConfigletRefs, CoreError> {
        let mut refs = ConfigletRefs::default();
        for name in names {
            let (key, _) = index
                .get(name)
                .ok_or_else(|| CoreError::not_found("configlet", name.as_str()))?;
            refs.names.push(name.clone());
            refs.keys.push(key.clone());
        }
        Ok(refs)
    }
}

fn task_from_info(info: &cvpkit_api::models::TaskInfo) -> Option<Task> {
    Some(Task {
        task_id: info.id()?,
        status: TaskStatus::from_controller(&info.work_order_user_defined_status),
        description: info.description.clone(),
    })
}

#[async_trait]
impl ControllerApi for CvpController {
    async fn version(&self) -> Result<String, CoreError> {
        Ok(self.client.version().await?)
    }

    // ── Configlets ───────────────────────────────────────────────────

    async fn list_configlets(&self) -> Result<Vec<Configlet>, CoreError> {
        let infos = self.client.list_configlets().await?;
        let mappers = self.client.get_configlet_mappers().await?;
        let mut out = Vec::with_capacity(infos.len());
        for info in infos {
            out.push(self.configlet_from_info(info, &mappers).await?);
        }
        Ok(out)
    }

    async fn get_configlet(&self, name: &str) -> Result<Configlet, CoreError> {
        let info = self.client.get_configlet_by_name(name).await?;
        let mappers = self.client.get_configlet_mappers().await?;
        self.configlet_from_info(info, &mappers).await
    }

    async fn create_configlet(&self, configlet: &Configlet) -> Result<Outcome, CoreError> {
        match &configlet.kind {
            ConfigletKind::Static => Outcome::from_result(
                self.client
                    .add_configlet(&configlet.name, &configlet.config)
                    .await,
            ),
            ConfigletKind::Builder {
                form_list,
                main_script,
            } => Outcome::from_result(
                self.client
                    .add_configlet_builder(&configlet.name, form_list, main_script)
                    .await,
            ),
            ConfigletKind::Generated { .. } => self.add_generated_configlet(configlet).await,
            ConfigletKind::Reconciled { .. } => self.add_reconciled_configlet(configlet).await,
        }
    }

    async fn update_configlet(&self, configlet: &Configlet) -> Result<(), CoreError> {
        let key = self.configlet_key(&configlet.name).await?;
        match &configlet.kind {
            ConfigletKind::Builder {
                form_list,
                main_script,
            } => {
                let forms = self.with_live_form_keys(form_list, &key).await?;
                self.client
                    .update_configlet_builder(&configlet.name, &forms, main_script, &key)
                    .await?;
            }
            ConfigletKind::Static
            | ConfigletKind::Generated { .. }
            | ConfigletKind::Reconciled { .. } => {
                self.client
                    .update_configlet(&configlet.name, &configlet.config, &key)
                    .await?;
            }
        }
        Ok(())
    }

    async fn delete_configlet(&self, name: &str) -> Result<(), CoreError> {
        let key = self.configlet_key(name).await?;
        Ok(self.client.delete_configlet(name, &key).await?)
    }

    async fn add_generated_configlet(&self, configlet: &Configlet) -> Result<Outcome, CoreError> {
        let ConfigletKind::Generated {
            builder_name,
            container_name,
            device_mac,
        } = &configlet.kind
        else {
            return Err(CoreError::Validation {
                message: format!("configlet {} is not a generated configlet", configlet.name),
            });
        };
        let container_key = self.container_key(container_name).await?;
        let builder_key = self.configlet_key(builder_name).await?;
        Outcome::from_result(
            self.client
                .add_generated_configlet(
                    &configlet.name,
                    &configlet.config,
                    &container_key,
                    device_mac,
                    &builder_key,
                )
                .await,
        )
    }

    async fn add_reconciled_configlet(&self, configlet: &Configlet) -> Result<Outcome, CoreError> {
        let ConfigletKind::Reconciled { device_mac } = &configlet.kind else {
            return Err(CoreError::Validation {
                message: format!("configlet {} is not a reconciled configlet", configlet.name),
            });
        };
        Outcome::from_result(
            self.client
                .add_reconciled_configlet(&configlet.name, &configlet.config, device_mac)
                .await,
        )
    }

    // ── Images ───────────────────────────────────────────────────────

    async fn list_images(&self) -> Result<Vec<Image>, CoreError> {
        Ok(self
            .client
            .list_images()
            .await?
            .into_iter()
            .map(|i| Image {
                reboot_required: i.reboot_required(),
                name: i.name,
            })
            .collect())
    }

    async fn download_image(&self, name: &str, dir: &Path) -> Result<(), CoreError> {
        let info = self
            .client
            .list_images()
            .await?
            .into_iter()
            .find(|i| i.name == name)
            .ok_or_else(|| CoreError::not_found("image", name))?;
        let file_name = Path::new(name)
            .file_name()
            .ok_or_else(|| CoreError::Validation {
                message: format!("image name {name:?} is not a file name"),
            })?;
        let dest = dir.join(file_name);
        debug!(image = name, dest = %dest.display(), "downloading image");
        Ok(self.client.download_image(&info.image_id, &dest).await?)
    }

    async fn list_image_bundles(&self) -> Result<Vec<ImageBundle>, CoreError> {
        let mut out = Vec::new();
        for summary in self.client.list_image_bundles().await? {
            out.push(self.get_image_bundle(&summary.name).await?);
        }
        Ok(out)
    }

    async fn get_image_bundle(&self, name: &str) -> Result<ImageBundle, CoreError> {
        let info = self.client.get_image_bundle_by_name(name).await?;
        Ok(ImageBundle {
            name: name.to_owned(),
            certified: info.certified(),
            image_names: info.images.into_iter().map(|i| i.name).collect(),
        })
    }

    async fn create_image_bundle(
        &self,
        bundle: &ImageBundle,
        images: &[Image],
    ) -> Result<Outcome, CoreError> {
        let entries = self.bundle_images(images).await?;
        Outcome::from_result(
            self.client
                .save_image_bundle(&bundle.name, bundle.certified, &entries)
                .await,
        )
    }

    async fn update_image_bundle(
        &self,
        bundle: &ImageBundle,
        images: &[Image],
    ) -> Result<(), CoreError> {
        let key = self.image_bundle_key(&bundle.name).await?;
        let entries = self.bundle_images(images).await?;
        Ok(self
            .client
            .update_image_bundle(&bundle.name, bundle.certified, &entries, &key)
            .await?)
    }

    async fn delete_image_bundle(&self, name: &str) -> Result<(), CoreError> {
        let key = self.image_bundle_key(name).await?;
        Ok(self.client.delete_image_bundle(name, &key).await?)
    }

    // ── Containers ───────────────────────────────────────────────────

    async fn list_containers(&self) -> Result<Vec<Container>, CoreError> {
        let (bundles, _) = self.applied_bundles().await?;
        let tree = self.client.retrieve_inventory().await?.containers;

        let mut out = Vec::new();
        let mut stack: Vec<(&ContainerNode, String)> = vec![(&tree, String::new())];
        while let Some((node, parent_name)) = stack.pop() {
            let configlets = self
                .client
                .container_configlets(&node.key)
                .await?
                .into_iter()
                .map(|c| c.name)
                .collect();
            out.push(Container {
                name: node.name.clone(),
                parent_name,
                configlets,
                image_bundle: bundles.get(&node.name).cloned().unwrap_or_default(),
            });
            for child in node.child_container_list.iter().rev() {
                stack.push((child, node.name.clone()));
            }
        }
        Ok(out)
    }

    async fn create_container(&self, name: &str, parent_name: &str) -> Result<Outcome, CoreError> {
        let parent_key = self.container_key(parent_name).await?;
        Outcome::from_result(
            self.client
                .add_container(name, parent_name, &parent_key)
                .await,
        )
    }

    async fn delete_container(&self, name: &str, parent_name: &str) -> Result<(), CoreError> {
        let key = self.container_key(name).await?;
        let parent_key = self.container_key(parent_name).await?;
        Ok(self
            .client
            .delete_container(name, &key, parent_name, &parent_key)
            .await?)
    }

    async fn rename_container(&self, old_name: &str, new_name: &str) -> Result<(), CoreError> {
        let key = self.container_key(old_name).await?;
        Ok(self.client.rename_container(old_name, new_name, &key).await?)
    }

    async fn apply_configlets_to_container(
        &self,
        container: &str,
        configlets: &[String],
    ) -> Result<(), CoreError> {
        let key = self.container_key(container).await?;
        let attached: Vec<String> = self
            .client
            .container_configlets(&key)
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect();
        let index = self.configlet_index().await?;

        let mut plain = ConfigletRefs::default();
        let mut builders = ConfigletRefs::default();
        let new = configlets.iter().filter(|n| !attached.contains(n));
        for name in new.chain(attached.iter()) {
            let (configlet_key, kind) = index
                .get(name)
                .ok_or_else(|| CoreError::not_found("configlet", name.as_str()))?;
            let target = if kind == "Builder" && !attached.contains(name) {
                &mut builders
            } else {
                &mut plain
            };
            target.names.push(name.clone());
            target.keys.push(configlet_key.clone());
        }
        Ok(self
            .client
            .apply_configlets_to_container(container, &key, &plain, &builders)
            .await?)
    }

    async fn remove_configlets_from_container(
        &self,
        container: &str,
        configlets: &[String],
    ) -> Result<(), CoreError> {
        if configlets.is_empty() {
            return Ok(());
        }
        let key = self.container_key(container).await?;
        let index = self.configlet_index().await?;
        let refs = self.device_configlet_refs(configlets, &index).await?;
        Ok(self
            .client
            .remove_configlets_from_container(container, &key, &refs)
            .await?)
    }

    async fn apply_image_bundle_to_container(
        &self,
        container: &str,
        bundle: &str,
    ) -> Result<(), CoreError> {
        let key = self.container_key(container).await?;
        let bundle_key = self.image_bundle_key(bundle).await?;
        Ok(self
            .client
            .apply_image_bundle_to_container(container, &key, bundle, &bundle_key)
            .await?)
    }

    async fn remove_image_bundle_from_container(
        &self,
        container: &str,
        bundle: &str,
    ) -> Result<(), CoreError> {
        let key = self.container_key(container).await?;
        let bundle_key = self.image_bundle_key(bundle).await?;
        Ok(self
            .client
            .remove_image_bundle_from_container(container, &key, bundle, &bundle_key)
            .await?)
    }

    // ── Devices ──────────────────────────────────────────────────────

    async fn list_devices(&self) -> Result<Vec<Device>, CoreError> {
        let (_, bundles) = self.applied_bundles().await?;
        let inventory = self.client.get_inventory().await?;
        let mut out = Vec::with_capacity(inventory.net_element_list.len());
        for element in inventory.net_element_list {
            let container_name = inventory
                .container_list
                .get(&element.key)
                .and_then(Value::as_str)
                .ok_or_else(|| CoreError::not_found("container of device", element.fqdn.as_str()))?
                .to_owned();
            let configlets = self
                .client
                .device_configlets(&element.system_mac_address)
                .await?
                .into_iter()
                .map(|c| c.name)
                .collect();
            out.push(Device {
                image_bundle: bundles.get(&element.ip_address).cloned().unwrap_or_default(),
                ip_address: element.ip_address,
                fqdn: element.fqdn,
                mac_address: element.system_mac_address,
                container_name,
                configlets,
            });
        }
        Ok(out)
    }

    async fn add_devices(&self, devices: &[Device]) -> Result<DeviceAddReport, CoreError> {
        for device in devices {
            let container_key = self.container_key(&device.container_name).await?;
            let mut status = self.temp_status(device).await?;
            // Clear any earlier, incomplete attempt for this device.
            if let Some(stale) = &status {
                debug!(device = %device.ip_address, status = %stale.status, "deleting stale temp device");
                self.client.delete_temp_device(&stale.key).await?;
                status = self.temp_status(device).await?;
            }
            if status.is_none() {
                self.client
                    .add_to_inventory(&device.ip_address, &device.container_name, &container_key)
                    .await?;
            } else {
                warn!(device = %device.ip_address, "temp device entry persists after delete");
            }
        }

        let mut report = DeviceAddReport::default();
        for device in devices {
            let status = self.wait_for_connection(device).await?;
            match status.as_ref().map(|s| s.status.as_str()) {
                Some(STATUS_CONNECTED) => report.connected.push(device.clone()),
                Some(STATUS_UNAUTHORIZED) => report.unauthorized.push(device.clone()),
                Some(STATUS_DUPLICATE) => {
                    if let Some(dup) = &status {
                        warn!(device = %device.ip_address, "device already in inventory");
                        self.client.delete_temp_device(&dup.key).await?;
                    }
                    report.connected.push(device.clone());
                }
                other => {
                    debug!(device = %device.ip_address, status = ?other, "device connection failed");
                    report.unreachable.push(device.clone());
                }
            }
        }
        self.client.save_inventory().await?;
        Ok(report)
    }

    async fn delete_device(&self, device: &Device) -> Result<(), CoreError> {
        let container_key = self.container_key(&device.container_name).await?;
        Ok(self
            .client
            .remove_device(&device.mac_address, &device.container_name, &container_key)
            .await?)
    }

    async fn apply_configlets_to_device(
        &self,
        device: &Device,
        configlets: &[String],
    ) -> Result<(), CoreError> {
        let mut names: Vec<String> = self
            .client
            .device_configlets(&device.mac_address)
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect();
        for name in configlets {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        let index = self.configlet_index().await?;
        let refs = self.device_configlet_refs(&names, &index).await?;
        Ok(self
            .client
            .apply_configlets_to_device(&device.ip_address, &device.fqdn, &device.mac_address, &refs)
            .await?)
    }

    async fn apply_image_bundle_to_device(
        &self,
        device: &Device,
        bundle: &str,
    ) -> Result<(), CoreError> {
        let bundle_key = self.image_bundle_key(bundle).await?;
        Ok(self
            .client
            .apply_image_bundle_to_device(&device.mac_address, &device.fqdn, bundle, &bundle_key)
            .await?)
    }

    async fn run_compliance_check(&self, device_mac: &str) -> Result<bool, CoreError> {
        let report = self.client.check_compliance(device_mac).await?;
        Ok(report.compliance_indication == "NONE")
    }

    // ── Roles ────────────────────────────────────────────────────────

    async fn list_roles(&self) -> Result<Vec<Role>, CoreError> {
        Ok(self
            .client
            .list_roles()
            .await?
            .into_iter()
            .map(|r| Role {
                name: r.name,
                description: r.description,
                module_list: r.module_list,
            })
            .collect())
    }

    async fn create_role(&self, role: &Role) -> Result<Outcome, CoreError> {
        Outcome::from_result(self.client.create_role(&role.name, &role.module_list).await)
    }

    async fn update_role(&self, role: &Role) -> Result<(), CoreError> {
        let key = self.role_key(&role.name).await?;
        Ok(self
            .client
            .update_role(&key, &role.name, &role.description, &role.module_list)
            .await?)
    }

    async fn delete_role(&self, name: &str) -> Result<(), CoreError> {
        let key = self.role_key(name).await?;
        Ok(self.client.delete_role(&key).await?)
    }

    // ── Tasks ────────────────────────────────────────────────────────

    async fn list_tasks(&self, status: Option<TaskStatus>) -> Result<Vec<Task>, CoreError> {
        let filter = status.map(|s| s.to_string());
        let infos = self.client.list_tasks(filter.as_deref()).await?;
        Ok(infos
            .iter()
            .filter_map(|info| {
                let task = task_from_info(info);
                if task.is_none() {
                    warn!(work_order = %info.work_order_id, "task without a numeric id");
                }
                task
            })
            .collect())
    }

    async fn execute_task(&self, task_id: u64) -> Result<(), CoreError> {
        Ok(self.client.execute_task(task_id).await?)
    }

    async fn get_task(&self, task_id: u64) -> Result<Task, CoreError> {
        let info = self.client.get_task(task_id).await?;
        Ok(Task {
            task_id,
            status: TaskStatus::from_controller(&info.work_order_user_defined_status),
            description: info.description,
        })
    }

    async fn cancel_task(&self, task_id: u64) -> Result<(), CoreError> {
        Ok(self.client.cancel_task(task_id).await?)
    }

    async fn add_note_to_task(&self, task_id: u64, note: &str) -> Result<(), CoreError> {
        Ok(self.client.add_note_to_task(task_id, note).await?)
    }
}
