// ── Snapshot writer ──
//
// Captures the requested entity types from a live controller into a
// `SnapshotDocument`. Images are downloaded into a staging directory as a
// side effect so the archive writer can bundle them next to the document.

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::api::ControllerApi;
use crate::error::CoreError;
use crate::model::{EntityType, SnapshotDocument};
use crate::version::{CURRENT_FORMAT, gate_controller};

/// What to capture.
#[derive(Debug, Clone, Default)]
pub struct CaptureOptions {
    pub types: Vec<EntityType>,
    /// Lowercased names; valid only with a single requested type.
    pub name_filter: Option<Vec<String>>,
    pub skip_version_check: bool,
}

/// A captured document plus the non-fatal conditions met along the way.
#[derive(Debug, Clone)]
pub struct Capture {
    pub document: SnapshotDocument,
    pub warnings: Vec<String>,
}

/// Case-insensitive name filter for the single filtered type.
struct NameFilter {
    wanted: HashSet<String>,
    seen: HashSet<String>,
}

impl NameFilter {
    fn new(names: &[String]) -> Self {
        Self {
            wanted: names.iter().map(|n| n.to_lowercase()).collect(),
            seen: HashSet::new(),
        }
    }

    fn retain<T>(&mut self, items: &mut Vec<T>, name: impl Fn(&T) -> &str) {
        items.retain(|item| {
            let lowered = name(item).to_lowercase();
            let keep = self.wanted.contains(&lowered);
            if keep {
                self.seen.insert(lowered);
            }
            keep
        });
    }

    /// Requested names that matched nothing, sorted.
    fn missing(&self) -> Vec<String> {
        let mut missing: Vec<String> = self.wanted.difference(&self.seen).cloned().collect();
        missing.sort();
        missing
    }
}

/// Capture `options.types` from the controller.
///
/// Any controller failure aborts the capture; no partial document is
/// returned.
pub async fn capture_snapshot(
    api: &dyn ControllerApi,
    options: &CaptureOptions,
    staging: &Path,
) -> Result<Capture, CoreError> {
    if options.name_filter.is_some() && options.types.len() != 1 {
        return Err(CoreError::Validation {
            message: "a name filter requires exactly one object type".into(),
        });
    }
    gate_controller(api, options.skip_version_check).await?;

    let mut filter = options.name_filter.as_deref().map(NameFilter::new);
    let mut document = SnapshotDocument {
        version: CURRENT_FORMAT.to_owned(),
        ..SnapshotDocument::default()
    };

    for entity_type in &options.types {
        info!(entity_type = %entity_type, "capturing");
        match entity_type {
            EntityType::Configlets => {
                let mut items = api.list_configlets().await?;
                if let Some(f) = filter.as_mut() {
                    f.retain(&mut items, |c| c.name.as_str());
                }
                document.configlets = Some(items);
            }
            EntityType::Containers => {
                let mut items = api.list_containers().await?;
                if let Some(f) = filter.as_mut() {
                    f.retain(&mut items, |c| c.name.as_str());
                }
                document.containers = Some(items);
            }
            EntityType::Devices => {
                let mut items = api.list_devices().await?;
                items.retain(|d| !d.is_undefined());
                if let Some(f) = filter.as_mut() {
                    f.retain(&mut items, |d| d.fqdn.as_str());
                }
                document.devices = Some(items);
            }
            EntityType::Images => {
                let mut items = api.list_images().await?;
                if let Some(f) = filter.as_mut() {
                    f.retain(&mut items, |i| i.name.as_str());
                }
                tokio::fs::create_dir_all(staging).await?;
                for image in &items {
                    debug!(image = %image.name, "staging image");
                    api.download_image(&image.name, staging).await?;
                }
                document.images = Some(items);
            }
            EntityType::ImageBundles => {
                let mut items = api.list_image_bundles().await?;
                if let Some(f) = filter.as_mut() {
                    f.retain(&mut items, |b| b.name.as_str());
                }
                document.image_bundles = Some(items);
            }
            EntityType::Roles => {
                let mut items = api.list_roles().await?;
                if let Some(f) = filter.as_mut() {
                    f.retain(&mut items, |r| r.name.as_str());
                }
                document.roles = Some(items);
            }
            EntityType::Tasks => debug!("tasks are not captured"),
        }
    }

    let warnings = filter
        .map(|f| f.missing())
        .unwrap_or_default()
        .into_iter()
        .map(|name| {
            let message = format!("{name} not found on the controller");
            warn!("{message}");
            message
        })
        .collect();

    Ok(Capture { document, warnings })
}
