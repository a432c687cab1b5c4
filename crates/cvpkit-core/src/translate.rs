// ── Snapshot compatibility translation ──
//
// Older archives store records in shapes that predate the current model.
// Translation runs over the raw JSON document before typed decoding: a
// static table of rules, each scoped to one or more document sections and
// each a no-op on records that are already current. Adding a format
// version means adding rules, never editing unrelated ones.

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::model::SnapshotDocument;
use crate::version::{FormatVersion, OLDEST_FORMAT, SUPPORTED_FORMATS};

const VERSION_KEY: &str = "CVP-Version";
const CONFIGLET_TYPES: [&str; 4] = ["Static", "Builder", "Generated", "Reconciled"];

#[derive(Debug, Clone, Copy, Default)]
pub struct TranslateOptions {
    /// Accept documents newer than the known maximum format.
    pub skip_version_check: bool,
}

/// Facts about the whole document that record-level rules may consult.
struct DocContext {
    /// Image key (or id) to image name, from the document's own `images`.
    image_names: HashMap<String, String>,
}

struct Rule {
    name: &'static str,
    sections: &'static [&'static str],
    /// Rewrites one record in place; returns whether anything changed.
    apply: fn(&mut Map<String, Value>, &DocContext) -> bool,
}

static RULES: &[Rule] = &[
    Rule {
        name: "configlet-type-default",
        sections: &["configlets"],
        apply: configlet_type_default,
    },
    Rule {
        name: "generated-without-builder",
        sections: &["configlets"],
        apply: generated_without_builder,
    },
    Rule {
        name: "builder-script-text",
        sections: &["configlets"],
        apply: builder_script_text,
    },
    Rule {
        name: "reconciled-default",
        sections: &["configlets"],
        apply: reconciled_default,
    },
    Rule {
        name: "bundle-legacy-shape",
        sections: &["imageBundle"],
        apply: bundle_legacy_shape,
    },
    Rule {
        name: "image-reboot-default",
        sections: &["images"],
        apply: image_reboot_default,
    },
    Rule {
        name: "device-key-to-mac",
        sections: &["inventory"],
        apply: device_key_to_mac,
    },
    Rule {
        name: "empty-image-bundle",
        sections: &["inventory", "Tree"],
        apply: empty_image_bundle,
    },
];

/// Translate a raw snapshot document into the current typed model.
pub fn normalize(mut doc: Value, opts: TranslateOptions) -> Result<SnapshotDocument, CoreError> {
    normalize_value(&mut doc, opts)?;
    Ok(serde_json::from_value(doc)?)
}

/// Rewrite a raw document in place into the current shape.
///
/// The version gate runs first: a document newer than the known maximum is
/// rejected untouched.
pub fn normalize_value(doc: &mut Value, opts: TranslateOptions) -> Result<(), CoreError> {
    let Some(root) = doc.as_object_mut() else {
        return Err(CoreError::invalid_snapshot("document is not a JSON object"));
    };

    let version = match root.get(VERSION_KEY) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            return Err(CoreError::invalid_snapshot(format!(
                "{VERSION_KEY} must be a string, found {other}"
            )));
        }
    };

    if let Some(version) = &version {
        let parsed: FormatVersion = version.parse()?;
        if !opts.skip_version_check && parsed > FormatVersion::known_max() {
            return Err(CoreError::UnsupportedSnapshotVersion {
                version: version.clone(),
                supported: SUPPORTED_FORMATS.join(", "),
            });
        }
    } else {
        debug!("document has no format version, assuming {OLDEST_FORMAT}");
        root.insert(VERSION_KEY.into(), Value::String(OLDEST_FORMAT.into()));
    }

    let ctx = DocContext {
        image_names: image_name_index(root),
    };

    for rule in RULES {
        for section in rule.sections {
            let Some(Value::Array(records)) = root.get_mut(*section) else {
                continue;
            };
            let mut fired = 0usize;
            for record in records.iter_mut().filter_map(Value::as_object_mut) {
                if (rule.apply)(record, &ctx) {
                    fired += 1;
                }
            }
            if fired > 0 {
                debug!(rule = rule.name, section, records = fired, "translation rule applied");
            }
        }
    }

    validate_configlet_types(root)
}

fn image_name_index(root: &Map<String, Value>) -> HashMap<String, String> {
    let mut index = HashMap::new();
    let Some(Value::Array(images)) = root.get("images") else {
        return index;
    };
    for image in images.iter().filter_map(Value::as_object) {
        let Some(name) = image.get("name").and_then(Value::as_str) else {
            continue;
        };
        for id_field in ["key", "imageId"] {
            if let Some(id) = image.get(id_field).and_then(Value::as_str) {
                index.insert(id.to_owned(), name.to_owned());
            }
        }
    }
    index
}

fn validate_configlet_types(root: &Map<String, Value>) -> Result<(), CoreError> {
    let Some(Value::Array(configlets)) = root.get("configlets") else {
        return Ok(());
    };
    for record in configlets.iter().filter_map(Value::as_object) {
        let kind = record.get("configletType").and_then(Value::as_str).unwrap_or("");
        if !CONFIGLET_TYPES.contains(&kind) {
            return Err(CoreError::UnknownConfigletType {
                name: record
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_owned(),
                configlet_type: kind.to_owned(),
            });
        }
    }
    Ok(())
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

// ── Rules ────────────────────────────────────────────────────────────

fn configlet_type_default(record: &mut Map<String, Value>, _: &DocContext) -> bool {
    if record.contains_key("configletType") {
        return false;
    }
    record.insert("configletType".into(), "Static".into());
    true
}

fn generated_without_builder(record: &mut Map<String, Value>, _: &DocContext) -> bool {
    if record.get("configletType").and_then(Value::as_str) != Some("Generated")
        || !is_blank(record.get("builderName"))
    {
        return false;
    }
    record.insert("configletType".into(), "Static".into());
    true
}

fn builder_script_text(record: &mut Map<String, Value>, _: &DocContext) -> bool {
    if record.get("configletType").and_then(Value::as_str) != Some("Builder") {
        return false;
    }
    let Some(Value::Object(script)) = record.get("mainScript") else {
        return false;
    };
    let text = script.get("data").cloned().unwrap_or_else(|| Value::String(String::new()));
    record.insert("mainScript".into(), text);
    true
}

fn reconciled_default(record: &mut Map<String, Value>, _: &DocContext) -> bool {
    if record.contains_key("reconciled") {
        return false;
    }
    record.insert("reconciled".into(), Value::Bool(false));
    true
}

/// String certification flags and key-referenced images come together in
/// old bundles; a boolean flag marks the record as already current.
fn bundle_legacy_shape(record: &mut Map<String, Value>, ctx: &DocContext) -> bool {
    let certified = match record.get("certified") {
        Some(Value::Bool(_)) => return false,
        Some(Value::String(s)) => s == "true",
        _ => false,
    };
    record.insert("certified".into(), Value::Bool(certified));

    if let Some(Value::Array(keys)) = record.remove("imageKeys") {
        let bundle = record
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        let names: Vec<Value> = keys
            .iter()
            .filter_map(Value::as_str)
            .filter_map(|key| {
                let name = ctx.image_names.get(key);
                if name.is_none() {
                    warn!(bundle = %bundle, image_key = key, "image key not found in snapshot images");
                }
                name.cloned().map(Value::String)
            })
            .collect();
        record.insert("imageNames".into(), Value::Array(names));
    }
    true
}

fn image_reboot_default(record: &mut Map<String, Value>, _: &DocContext) -> bool {
    match record.get("rebootRequired") {
        Some(Value::Bool(_)) => false,
        Some(Value::String(s)) => {
            let flag = s == "true";
            record.insert("rebootRequired".into(), Value::Bool(flag));
            true
        }
        _ => {
            record.insert("rebootRequired".into(), Value::Bool(false));
            true
        }
    }
}

fn device_key_to_mac(record: &mut Map<String, Value>, _: &DocContext) -> bool {
    let Some(key) = record.remove("key") else {
        return false;
    };
    record.insert("macAddress".into(), key);
    true
}

fn empty_image_bundle(record: &mut Map<String, Value>, _: &DocContext) -> bool {
    let empty = match record.get("imageBundle") {
        Some(Value::Null) => true,
        Some(Value::Array(a)) => a.is_empty(),
        _ => false,
    };
    if empty {
        record.insert("imageBundle".into(), Value::String(String::new()));
    }
    empty
}
