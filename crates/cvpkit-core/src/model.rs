// ── Inventory domain types ──
//
// Value snapshots of controller objects in their archive (wire) shape.
// Every field is serialized; there is no hidden state. A fresh fetch is
// needed to observe controller-side changes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

/// Reserved container name for devices that have not been placed yet.
pub const UNDEFINED_CONTAINER: &str = "Undefined";

/// Roles that always exist on a controller and are never created or deleted.
pub const BUILTIN_ROLES: [&str; 2] = ["network-admin", "network-operator"];

/// Name the root container is given back on reset.
pub const DEFAULT_ROOT_CONTAINER: &str = "Tenant";

pub fn is_builtin_role(name: &str) -> bool {
    BUILTIN_ROLES.contains(&name)
}

// ── EntityType ───────────────────────────────────────────────────────

/// Object kinds an operation can be scoped to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Configlets,
    Containers,
    Devices,
    Images,
    ImageBundles,
    Roles,
    /// Restore only: execute the pending tasks produced by the restore.
    Tasks,
}

impl EntityType {
    /// Every type that can be captured in a snapshot (all but `tasks`).
    pub fn inventory() -> Vec<Self> {
        Self::iter().filter(|t| *t != Self::Tasks).collect()
    }

    /// Key under which this type is stored in a snapshot document.
    pub fn document_key(self) -> Option<&'static str> {
        match self {
            Self::Configlets => Some("configlets"),
            Self::Containers => Some("Tree"),
            Self::Devices => Some("inventory"),
            Self::Images => Some("images"),
            Self::ImageBundles => Some("imageBundle"),
            Self::Roles => Some("Roles"),
            Self::Tasks => None,
        }
    }
}

// ── Containers and devices ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub name: String,
    /// Empty for the root container.
    #[serde(default)]
    pub parent_name: String,
    #[serde(default)]
    pub configlets: Vec<String>,
    /// Bundle name, or empty.
    #[serde(default)]
    pub image_bundle: String,
}

impl Container {
    pub fn is_root(&self) -> bool {
        self.parent_name.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub ip_address: String,
    #[serde(default)]
    pub fqdn: String,
    /// Stable identity; survives IP changes.
    pub mac_address: String,
    pub container_name: String,
    #[serde(default)]
    pub image_bundle: String,
    /// Inherited and device-specific configlet names.
    #[serde(default)]
    pub configlets: Vec<String>,
}

impl Device {
    pub fn is_undefined(&self) -> bool {
        self.container_name == UNDEFINED_CONTAINER
    }
}

// ── Configlets ───────────────────────────────────────────────────────

/// A configlet: shared fields plus the variant-specific part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configlet {
    pub name: String,
    /// Text body; empty for builders.
    #[serde(default)]
    pub config: String,
    #[serde(default)]
    pub reconciled: bool,
    #[serde(flatten)]
    pub kind: ConfigletKind,
}

/// Variant data, tagged by `configletType` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "configletType", rename_all_fields = "camelCase")]
pub enum ConfigletKind {
    Static,
    Builder {
        #[serde(default)]
        form_list: Vec<Map<String, Value>>,
        #[serde(default)]
        main_script: String,
    },
    /// Output of a builder for one device under one container.
    Generated {
        builder_name: String,
        container_name: String,
        device_mac: String,
    },
    /// Synthesized from a device's running config during reconciliation.
    Reconciled { device_mac: String },
}

impl ConfigletKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Static => "Static",
            Self::Builder { .. } => "Builder",
            Self::Generated { .. } => "Generated",
            Self::Reconciled { .. } => "Reconciled",
        }
    }
}

impl Configlet {
    pub fn new_static(name: impl Into<String>, config: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: config.into(),
            reconciled: false,
            kind: ConfigletKind::Static,
        }
    }

    pub fn new_builder(
        name: impl Into<String>,
        form_list: Vec<Map<String, Value>>,
        main_script: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            config: String::new(),
            reconciled: false,
            kind: ConfigletKind::Builder {
                form_list,
                main_script: main_script.into(),
            },
        }
    }

    pub fn new_generated(
        name: impl Into<String>,
        config: impl Into<String>,
        builder_name: impl Into<String>,
        container_name: impl Into<String>,
        device_mac: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            config: config.into(),
            reconciled: false,
            kind: ConfigletKind::Generated {
                builder_name: builder_name.into(),
                container_name: container_name.into(),
                device_mac: device_mac.into(),
            },
        }
    }

    pub fn new_reconciled(
        name: impl Into<String>,
        config: impl Into<String>,
        device_mac: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            config: config.into(),
            reconciled: true,
            kind: ConfigletKind::Reconciled {
                device_mac: device_mac.into(),
            },
        }
    }

    /// Whether restore creates this configlet directly.
    ///
    /// Generated and reconciled configlets are derived objects; they are
    /// only recreated through device replay.
    pub fn is_restorable(&self) -> bool {
        match self.kind {
            ConfigletKind::Static | ConfigletKind::Builder { .. } => true,
            ConfigletKind::Generated { .. } | ConfigletKind::Reconciled { .. } => false,
        }
    }
}

// ── Images ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub name: String,
    #[serde(default)]
    pub reboot_required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageBundle {
    pub name: String,
    /// Ordered references to `Image::name`.
    #[serde(default)]
    pub image_names: Vec<String>,
    #[serde(default)]
    pub certified: bool,
}

// ── Roles ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Permission entries, kept opaque.
    #[serde(default)]
    pub module_list: Vec<Value>,
}

// ── Tasks ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    /// Parse the controller's status string. Anything not terminal is
    /// treated as still pending.
    pub fn from_controller(raw: &str) -> Self {
        match raw {
            "Completed" => Self::Completed,
            "Failed" => Self::Failed,
            "Cancelled" | "Canceled" => Self::Cancelled,
            _ => Self::Pending,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub task_id: u64,
    pub status: TaskStatus,
    #[serde(default)]
    pub description: String,
}

// ── Snapshot document ────────────────────────────────────────────────

/// The unit of backup and restore.
///
/// An absent section means the type was not captured; an empty one means
/// it was captured and nothing was present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDocument {
    #[serde(rename = "CVP-Version")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configlets: Option<Vec<Configlet>>,
    #[serde(rename = "imageBundle", default, skip_serializing_if = "Option::is_none")]
    pub image_bundles: Option<Vec<ImageBundle>>,
    #[serde(rename = "inventory", default, skip_serializing_if = "Option::is_none")]
    pub devices: Option<Vec<Device>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<Image>>,
    #[serde(rename = "Tree", default, skip_serializing_if = "Option::is_none")]
    pub containers: Option<Vec<Container>>,
    #[serde(rename = "Roles", default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<Role>>,
}

impl SnapshotDocument {
    pub fn configlet(&self, name: &str) -> Option<&Configlet> {
        self.configlets.as_deref()?.iter().find(|c| c.name == name)
    }

    /// Names of the entities stored under `entity_type`, if captured.
    pub fn names_of(&self, entity_type: EntityType) -> Option<Vec<String>> {
        fn names<T>(items: Option<&Vec<T>>, name: impl Fn(&T) -> &str) -> Option<Vec<String>> {
            items.map(|v| v.iter().map(|i| name(i).to_owned()).collect())
        }
        match entity_type {
            EntityType::Configlets => names(self.configlets.as_ref(), |c| c.name.as_str()),
            EntityType::Containers => names(self.containers.as_ref(), |c| c.name.as_str()),
            EntityType::Devices => names(self.devices.as_ref(), |d| d.fqdn.as_str()),
            EntityType::Images => names(self.images.as_ref(), |i| i.name.as_str()),
            EntityType::ImageBundles => names(self.image_bundles.as_ref(), |b| b.name.as_str()),
            EntityType::Roles => names(self.roles.as_ref(), |r| r.name.as_str()),
            EntityType::Tasks => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn entity_type_parses_cli_names() {
        assert_eq!("imagebundles".parse::<EntityType>().unwrap(), EntityType::ImageBundles);
        assert_eq!("Configlets".parse::<EntityType>().unwrap(), EntityType::Configlets);
        assert_eq!(EntityType::ImageBundles.to_string(), "imagebundles");
        assert!("widgets".parse::<EntityType>().is_err());
        assert!(!EntityType::inventory().contains(&EntityType::Tasks));
    }

    #[test]
    fn static_configlet_wire_shape() {
        let c = Configlet::new_static("c1", "interface Eth1");
        let v = serde_json::to_value(&c).unwrap();
        assert_eq!(
            v,
            json!({
                "name": "c1",
                "config": "interface Eth1",
                "reconciled": false,
                "configletType": "Static"
            })
        );
        let back: Configlet = serde_json::from_value(v).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn generated_configlet_reads_camel_case_fields() {
        let c: Configlet = serde_json::from_value(json!({
            "name": "gen-leaf1",
            "config": "hostname leaf1",
            "reconciled": false,
            "configletType": "Generated",
            "builderName": "hostnames",
            "containerName": "Leaf",
            "deviceMac": "00:1c:73:00:00:01"
        }))
        .unwrap();
        assert!(!c.is_restorable());
        match c.kind {
            ConfigletKind::Generated {
                builder_name,
                container_name,
                device_mac,
            } => {
                assert_eq!(builder_name, "hostnames");
                assert_eq!(container_name, "Leaf");
                assert_eq!(device_mac, "00:1c:73:00:00:01");
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn builder_keeps_form_list_order() {
        let c: Configlet = serde_json::from_value(json!({
            "name": "b1",
            "config": "",
            "configletType": "Builder",
            "formList": [{"fieldId": "b"}, {"fieldId": "a"}],
            "mainScript": "print 1"
        }))
        .unwrap();
        let ConfigletKind::Builder { form_list, main_script } = &c.kind else {
            panic!("expected builder");
        };
        assert_eq!(form_list[0]["fieldId"], "b");
        assert_eq!(main_script, "print 1");
        assert!(c.is_restorable());
    }

    #[test]
    fn document_omits_uncaptured_sections() {
        let doc = SnapshotDocument {
            version: "2016.1.2".into(),
            roles: Some(Vec::new()),
            ..SnapshotDocument::default()
        };
        let v = serde_json::to_value(&doc).unwrap();
        assert_eq!(v, json!({"CVP-Version": "2016.1.2", "Roles": []}));
    }

    #[test]
    fn task_status_terminal_states() {
        assert_eq!(TaskStatus::from_controller("Completed"), TaskStatus::Completed);
        assert_eq!(TaskStatus::from_controller("In-Progress"), TaskStatus::Pending);
        assert!(TaskStatus::Failed.is_terminal());
        assert!(!TaskStatus::Pending.is_terminal());
    }
}
