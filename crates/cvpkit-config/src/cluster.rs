// ── Controller cluster file ──
//
// The appliance describes its 1- or 3-node cluster in a YAML file: a
// `version`, a `common` section, and one `nodeN` section per node. Every
// setting is looked up on the node first, then in `common`, then in a
// small table of built-in defaults.

use std::fmt;
use std::path::Path;

use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use thiserror::Error;

/// Newest cluster file layout this crate understands.
pub const CLUSTER_FORMAT_CURRENT: u32 = 2;

const DEFAULTS: &[(&str, &str)] = &[("cluster_interface", "eth0"), ("device_interface", "eth0")];

#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("cannot read cluster file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed cluster file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("unsupported cluster file version {found}, expected at most {CLUSTER_FORMAT_CURRENT}")]
    UnsupportedVersion { found: u32 },

    #[error("cluster must define one or three nodes, found {0}")]
    NodeCount(usize),

    #[error("IP address {0} not in the cluster configuration")]
    UnknownAddress(String),
}

/// A node's position in the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum NodeRole {
    Primary,
    Secondary,
    Tertiary,
}

impl NodeRole {
    fn from_index(index: usize) -> Option<Self> {
        match index {
            1 => Some(Self::Primary),
            2 => Some(Self::Secondary),
            3 => Some(Self::Tertiary),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterMode {
    SingleNode,
    MultiNode,
}

impl fmt::Display for ClusterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SingleNode => "singlenode",
            Self::MultiNode => "multinode",
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawCluster {
    version: u32,
    #[serde(default)]
    common: Mapping,
    node1: Option<Mapping>,
    node2: Option<Mapping>,
    node3: Option<Mapping>,
}

/// Parsed cluster file.
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    version: u32,
    common: Mapping,
    nodes: Vec<Mapping>,
}

impl ClusterConfig {
    pub fn load(path: &Path) -> Result<Self, ClusterError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, ClusterError> {
        let raw: RawCluster = serde_yaml::from_str(text)?;
        if raw.version > CLUSTER_FORMAT_CURRENT {
            return Err(ClusterError::UnsupportedVersion { found: raw.version });
        }
        let nodes: Vec<Mapping> = [raw.node1, raw.node2, raw.node3]
            .into_iter()
            .flatten()
            .collect();
        if nodes.len() != 1 && nodes.len() != 3 {
            return Err(ClusterError::NodeCount(nodes.len()));
        }
        Ok(Self {
            version: raw.version,
            common: raw.common,
            nodes,
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn mode(&self) -> ClusterMode {
        if self.nodes.len() == 1 {
            ClusterMode::SingleNode
        } else {
            ClusterMode::MultiNode
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Settings view for node `index` (1-based).
    pub fn node(&self, index: usize) -> Option<NodeView<'_>> {
        let node = self.nodes.get(index.checked_sub(1)?)?;
        Some(NodeView {
            version: self.version,
            node,
            common: &self.common,
        })
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeRole, NodeView<'_>)> {
        (1..=self.nodes.len()).filter_map(move |i| Some((NodeRole::from_index(i)?, self.node(i)?)))
    }

    pub fn primary(&self) -> Option<NodeView<'_>> {
        self.node(1)
    }

    /// Role of the node whose management address is `ip`.
    pub fn role_of(&self, ip: &str) -> Result<NodeRole, ClusterError> {
        self.nodes()
            .find(|(_, view)| view.mgmt_ip().as_deref() == Some(ip))
            .map(|(role, _)| role)
            .ok_or_else(|| ClusterError::UnknownAddress(ip.to_owned()))
    }
}

/// Lookup of one node's settings with `common` and built-in fallbacks.
#[derive(Debug, Clone, Copy)]
pub struct NodeView<'a> {
    version: u32,
    node: &'a Mapping,
    common: &'a Mapping,
}

impl NodeView<'_> {
    /// Resolve `path` (`a/b/c` walks nested maps) on the node, then in
    /// `common`, then in the built-in defaults. Placeholders such as
    /// `<dns1 ip>` count as absent.
    pub fn get(&self, path: &str) -> Option<Value> {
        [self.node, self.common]
            .into_iter()
            .find_map(|section| walk(section, path))
            .and_then(strip_placeholders)
            .or_else(|| {
                DEFAULTS
                    .iter()
                    .find(|(key, _)| *key == path)
                    .map(|(_, value)| Value::String((*value).to_owned()))
            })
    }

    /// Scalar setting rendered as text.
    pub fn get_str(&self, path: &str) -> Option<String> {
        match self.get(path)? {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn hostname(&self) -> Option<String> {
        self.get_str("hostname")
    }

    /// Address on the cluster interface.
    pub fn mgmt_ip(&self) -> Option<String> {
        self.interface_ip("cluster_interface")
    }

    /// Address on the interface facing managed devices.
    pub fn device_ip(&self) -> Option<String> {
        self.interface_ip("device_interface")
    }

    fn interface_ip(&self, selector: &str) -> Option<String> {
        if self.version == 1 {
            return self.get_str("ip_address");
        }
        let interface = self.get_str(selector)?;
        self.get_str(&format!("interfaces/{interface}/ip_address"))
    }
}

fn walk(section: &Mapping, path: &str) -> Option<Value> {
    let mut parts = path.split('/');
    let mut current = section.get(parts.next()?)?;
    for part in parts {
        current = current.as_mapping()?.get(part)?;
    }
    Some(current.clone())
}

fn is_placeholder(s: &str) -> bool {
    s.starts_with('<') && s.ends_with('>')
}

fn strip_placeholders(value: Value) -> Option<Value> {
    match value {
        Value::String(s) if is_placeholder(&s) => None,
        Value::Sequence(items) => Some(Value::Sequence(
            items
                .into_iter()
                .filter(|v| !v.as_str().is_some_and(is_placeholder))
                .collect(),
        )),
        Value::Null => None,
        other => Some(other),
    }
}
