// Wire types for the controller web API
//
// Only the fields the toolkit reads are modelled; unknown fields are
// ignored by serde. Opaque structures (builder forms, role modules,
// topology actions) stay as `serde_json` values.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `{ "data": [...] }` list wrapper used by most list endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct DataList<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// `{ "data": {...} }` single-object wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct DataObject<T> {
    pub data: T,
}

/// `GET cvpInfo/getCvpInfo.do`
#[derive(Debug, Clone, Deserialize)]
pub struct CvpInfo {
    pub version: String,
}

// ── Configlets ───────────────────────────────────────────────────────

/// A configlet as listed by `getConfiglets.do` / `getConfigletByName.do`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigletInfo {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub config: String,
    /// `Static`, `Builder`, or `Generated`.
    #[serde(rename = "type", default)]
    pub configlet_type: String,
    #[serde(default)]
    pub reconciled: bool,
}

/// Configlet builder detail from `getConfigletBuilder.do`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigletBuilderInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub form_list: Vec<Map<String, Value>>,
    #[serde(rename = "main_script", default)]
    pub main_script: MainScript,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MainScript {
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub key: Option<String>,
}

/// `getConfigletsAndAssociatedMappers.do` payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigletMappers {
    #[serde(default)]
    pub configlet_mappers: Vec<ConfigletMapper>,
    #[serde(default)]
    pub generated_configlet_mappers: Vec<GeneratedConfigletMapper>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigletMapper {
    pub configlet_id: String,
    #[serde(default)]
    pub object_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedConfigletMapper {
    pub configlet_id: String,
    #[serde(default)]
    pub configlet_builder_id: String,
    #[serde(default)]
    pub container_id: String,
    #[serde(default)]
    pub net_element_id: String,
}

/// Configlets attached to a container or device (`configletList`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigletList {
    #[serde(default)]
    pub configlet_list: Vec<ConfigletInfo>,
}

// ── Inventory ────────────────────────────────────────────────────────

/// A node of the container tree returned by `retrieveInventory.do`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerNode {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub child_container_list: Vec<ContainerNode>,
}

/// A device that is not (yet) fully provisioned.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TempDevice {
    pub key: String,
    #[serde(default)]
    pub ip_address: String,
    #[serde(default)]
    pub fqdn: String,
    /// `Connecting`, `Connected`, `Duplicate`, `Unauthorized access`, ...
    #[serde(default)]
    pub status: String,
}

/// `retrieveInventory.do`: the container tree plus temp devices.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievedInventory {
    pub containers: ContainerNode,
    #[serde(default)]
    pub temp_net_element: Vec<TempDevice>,
}

/// A provisioned device from `getInventory.do`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetElement {
    pub key: String,
    #[serde(default)]
    pub system_mac_address: String,
    #[serde(default)]
    pub ip_address: String,
    #[serde(default)]
    pub fqdn: String,
}

/// `getInventory.do`: devices plus a device-key → container-name map.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inventory {
    #[serde(default)]
    pub net_element_list: Vec<NetElement>,
    #[serde(default)]
    pub container_list: Map<String, Value>,
}

/// Result row of `searchContainers.do` / `getContainerInfoById.do`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerInfo {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
}

/// Compliance report from `checkCompliance.do`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceReport {
    #[serde(default)]
    pub compliance_indication: String,
}

// ── Images ───────────────────────────────────────────────────────────

/// An image known to the controller.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInfo {
    pub name: String,
    #[serde(default)]
    pub image_id: String,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub image_size: Value,
    #[serde(default)]
    pub md5: Value,
    #[serde(default)]
    pub version: Value,
    /// `"true"` / `"false"` on the wire.
    #[serde(default)]
    pub is_reboot_required: Value,
}

impl ImageInfo {
    pub fn reboot_required(&self) -> bool {
        match &self.is_reboot_required {
            Value::Bool(b) => *b,
            Value::String(s) => s == "true",
            _ => false,
        }
    }
}

/// Image bundle summary row from `getImageBundles.do`.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageBundleSummary {
    pub name: String,
}

/// Image bundle detail from `getImageBundleByName.do`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageBundleInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub images: Vec<ImageInfo>,
    /// `"true"` / `"false"` on the wire.
    #[serde(default)]
    pub is_certified_image: Value,
}

impl ImageBundleInfo {
    pub fn certified(&self) -> bool {
        match &self.is_certified_image {
            Value::Bool(b) => *b,
            Value::String(s) => s == "true",
            _ => false,
        }
    }
}

/// Image entry submitted in a bundle save/update.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleImage {
    pub name: String,
    pub image_size: Value,
    pub image_id: String,
    pub md5: Value,
    pub version: Value,
    pub key: Option<String>,
    pub is_reboot_required: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedContainer {
    pub container_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedDevice {
    pub ip_address: String,
}

// ── Roles ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleInfo {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub module_list: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleList {
    #[serde(default)]
    pub roles: Vec<RoleInfo>,
}

// ── Tasks ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInfo {
    /// Numeric, but some controller builds send it as a string.
    pub work_order_id: Value,
    #[serde(default)]
    pub work_order_user_defined_status: String,
    #[serde(default)]
    pub description: String,
}

impl TaskInfo {
    pub fn id(&self) -> Option<u64> {
        match &self.work_order_id {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s
                .chars()
                .filter(char::is_ascii_digit)
                .collect::<String>()
                .parse()
                .ok(),
            _ => None,
        }
    }
}
