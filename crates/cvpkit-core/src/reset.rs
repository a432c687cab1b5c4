// ── Reset engine ──
//
// Deletes inventory in the reverse of restore order. Built-in roles and
// the root container survive; the root is stripped of its associations
// and renamed back to the default. Every failure is fatal.

use std::cmp::Reverse;
use std::collections::HashMap;

use serde::Serialize;
use tracing::info;

use crate::api::ControllerApi;
use crate::error::CoreError;
use crate::model::{Container, DEFAULT_ROOT_CONTAINER, EntityType, is_builtin_role};
use crate::restore::EntityRef;
use crate::version::gate_controller;

#[derive(Debug, Clone, Default)]
pub struct ResetOptions {
    pub types: Vec<EntityType>,
    pub skip_version_check: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ResetReport {
    pub deleted: Vec<EntityRef>,
    /// Root container renamed from this name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renamed_root: Option<String>,
}

impl ResetReport {
    fn deleted(&mut self, entity_type: EntityType, name: &str) {
        self.deleted.push(EntityRef {
            entity_type,
            name: name.to_owned(),
        });
    }
}

pub async fn reset(
    api: &dyn ControllerApi,
    options: &ResetOptions,
) -> Result<ResetReport, CoreError> {
    gate_controller(api, options.skip_version_check).await?;
    let wants = |t: EntityType| options.types.contains(&t);
    let mut report = ResetReport::default();

    if wants(EntityType::Devices) {
        for device in api.list_devices().await? {
            info!(device = %device.ip_address, "deleting device");
            api.delete_device(&device).await?;
            report.deleted(EntityType::Devices, &device.fqdn);
        }
    }

    if wants(EntityType::Containers) {
        reset_containers(api, &mut report).await?;
    }

    if wants(EntityType::ImageBundles) {
        for bundle in api.list_image_bundles().await? {
            info!(bundle = %bundle.name, "deleting image bundle");
            api.delete_image_bundle(&bundle.name).await?;
            report.deleted(EntityType::ImageBundles, &bundle.name);
        }
    }

    if wants(EntityType::Configlets) {
        for configlet in api.list_configlets().await? {
            info!(configlet = %configlet.name, "deleting configlet");
            api.delete_configlet(&configlet.name).await?;
            report.deleted(EntityType::Configlets, &configlet.name);
        }
    }

    if wants(EntityType::Roles) {
        for role in api.list_roles().await? {
            if is_builtin_role(&role.name) {
                continue;
            }
            info!(role = %role.name, "deleting role");
            api.delete_role(&role.name).await?;
            report.deleted(EntityType::Roles, &role.name);
        }
    }

    Ok(report)
}

async fn reset_containers(
    api: &dyn ControllerApi,
    report: &mut ResetReport,
) -> Result<(), CoreError> {
    let containers = api.list_containers().await?;
    let root = containers.iter().find(|c| c.is_root());

    if let Some(root) = root {
        if !root.configlets.is_empty() {
            api.remove_configlets_from_container(&root.name, &root.configlets)
                .await?;
        }
        if !root.image_bundle.is_empty() {
            api.remove_image_bundle_from_container(&root.name, &root.image_bundle)
                .await?;
        }
    }

    for container in deepest_first(&containers) {
        info!(container = %container.name, "deleting container");
        api.delete_container(&container.name, &container.parent_name)
            .await?;
        report.deleted(EntityType::Containers, &container.name);
    }

    if let Some(root) = root {
        if root.name != DEFAULT_ROOT_CONTAINER {
            info!(from = %root.name, "renaming root container");
            api.rename_container(&root.name, DEFAULT_ROOT_CONTAINER)
                .await?;
            report.renamed_root = Some(root.name.clone());
        }
    }
    Ok(())
}

/// Non-root containers ordered so children come before their parents.
fn deepest_first(containers: &[Container]) -> Vec<&Container> {
    let parents: HashMap<&str, &str> = containers
        .iter()
        .map(|c| (c.name.as_str(), c.parent_name.as_str()))
        .collect();
    let depth = |container: &Container| {
        let mut depth = 0usize;
        let mut current = container.parent_name.as_str();
        // Bounded by the container count in case of a parent cycle.
        while !current.is_empty() && depth < containers.len() {
            depth += 1;
            current = parents.get(current).copied().unwrap_or_default();
        }
        depth
    };

    let mut ordered: Vec<(usize, &Container)> = containers
        .iter()
        .filter(|c| !c.is_root())
        .map(|c| (depth(c), c))
        .collect();
    ordered.sort_by_key(|(depth, _)| Reverse(*depth));
    ordered.into_iter().map(|(_, c)| c).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container(name: &str, parent: &str) -> Container {
        Container {
            name: name.into(),
            parent_name: parent.into(),
            configlets: Vec::new(),
            image_bundle: String::new(),
        }
    }

    #[test]
    fn children_before_parents() {
        let tree = vec![
            container("Tenant", ""),
            container("DC1", "Tenant"),
            container("Leaf", "Spine"),
            container("Spine", "DC1"),
        ];
        let names: Vec<&str> = deepest_first(&tree)
            .into_iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, ["Leaf", "Spine", "DC1"]);
    }
}
