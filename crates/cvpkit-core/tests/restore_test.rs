#![allow(clippy::unwrap_used)]

mod common;

use std::collections::HashMap;
use std::time::Duration;

use pretty_assertions::assert_eq;

use common::{FakeController, container, device, role};
use cvpkit_core::{
    Configlet, CoreError, EntityType, Image, ImageBundle, RestoreOptions, SnapshotDocument, Task,
    TaskPolicy, TaskStatus, restore,
};

fn options(types: &[EntityType]) -> RestoreOptions {
    RestoreOptions {
        types: types.to_vec(),
        ..RestoreOptions::default()
    }
}

fn document() -> SnapshotDocument {
    SnapshotDocument {
        version: "2016.1.2".into(),
        ..SnapshotDocument::default()
    }
}

// ── Configlets ───────────────────────────────────────────────────────

#[tokio::test]
async fn restoring_twice_creates_once_and_never_updates() {
    let api = FakeController::fresh();
    let doc = SnapshotDocument {
        configlets: Some(vec![Configlet::new_static("c1", "interface Eth1")]),
        ..document()
    };
    let opts = options(&[EntityType::Configlets]);

    let first = restore(&api, &doc, &opts).await.unwrap();
    let second = restore(&api, &doc, &opts).await.unwrap();

    assert_eq!(api.calls_to("create_configlet"), ["create_configlet:c1"]);
    assert!(api.calls_to("update_configlet").is_empty());
    assert_eq!(first.created.len(), 1);
    assert_eq!(second.unchanged.len(), 1);
    assert_eq!(api.state().configlets, doc.configlets.unwrap());
}

#[tokio::test]
async fn changed_configlet_is_updated() {
    let api = FakeController::fresh();
    api.with_state(|s| s.configlets.push(Configlet::new_static("c1", "interface Eth1")));
    let doc = SnapshotDocument {
        configlets: Some(vec![Configlet::new_static("c1", "interface Eth2")]),
        ..document()
    };

    let report = restore(&api, &doc, &options(&[EntityType::Configlets]))
        .await
        .unwrap();

    assert_eq!(api.calls_to("update_configlet"), ["update_configlet:c1"]);
    assert_eq!(report.updated[0].name, "c1");
    assert_eq!(api.state().configlets[0].config, "interface Eth2");
}

#[tokio::test]
async fn derived_configlets_are_not_created_directly() {
    let api = FakeController::fresh();
    let doc = SnapshotDocument {
        configlets: Some(vec![
            Configlet::new_static("a", "x"),
            Configlet::new_generated("b", "x", "builder", "Leaf", "00:00:00:00:00:01"),
            Configlet::new_static("c", "x"),
            Configlet::new_reconciled("d", "x", "00:00:00:00:00:01"),
            Configlet::new_static("e", "x"),
            Configlet::new_generated("f", "x", "builder", "Leaf", "00:00:00:00:00:02"),
        ]),
        ..document()
    };

    let report = restore(&api, &doc, &options(&[EntityType::Configlets]))
        .await
        .unwrap();

    assert_eq!(
        api.calls_to("create_configlet"),
        ["create_configlet:a", "create_configlet:c", "create_configlet:e"]
    );
    let skipped: Vec<&str> = report.skipped.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(skipped, ["b", "d", "f"]);
    assert_eq!(report.warnings.len(), 3);
}

#[tokio::test]
async fn name_filter_is_case_insensitive_and_warns_on_missing() {
    let api = FakeController::fresh();
    let doc = SnapshotDocument {
        configlets: Some(vec![
            Configlet::new_static("Base-Config", "x"),
            Configlet::new_static("other", "y"),
        ]),
        ..document()
    };
    let opts = RestoreOptions {
        name_filter: Some(vec!["base-config".into(), "ghost".into()]),
        ..options(&[EntityType::Configlets, EntityType::Tasks])
    };

    let report = restore(&api, &doc, &opts).await.unwrap();

    assert_eq!(api.calls_to("create_configlet"), ["create_configlet:Base-Config"]);
    assert_eq!(report.warnings, ["configlet ghost is not in the snapshot"]);
}

#[tokio::test]
async fn name_filter_requires_configlets_alone() {
    let api = FakeController::fresh();
    let opts = RestoreOptions {
        name_filter: Some(vec!["c1".into()]),
        ..options(&[EntityType::Configlets, EntityType::Containers])
    };

    let err = restore(&api, &document(), &opts).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation { .. }));
    assert!(api.calls().is_empty());
}

// ── Roles and image bundles ──────────────────────────────────────────

#[tokio::test]
async fn roles_skip_builtins_and_update_on_mismatch() {
    let api = FakeController::fresh();
    api.with_state(|s| {
        let mut stale = role("auditor", "read only");
        stale.module_list.clear();
        s.roles.push(stale);
    });
    let doc = SnapshotDocument {
        roles: Some(vec![
            role("network-admin", "admin"),
            role("auditor", "read only"),
            role("deployer", "pushes changes"),
        ]),
        ..document()
    };

    let report = restore(&api, &doc, &options(&[EntityType::Roles]))
        .await
        .unwrap();

    assert_eq!(api.calls_to("create_role"), ["create_role:deployer"]);
    assert_eq!(api.calls_to("update_role"), ["update_role:auditor"]);
    assert_eq!(report.skipped[0].name, "network-admin");
}

#[tokio::test]
async fn image_bundles_compare_image_sets() {
    let api = FakeController::fresh();
    let doc = SnapshotDocument {
        images: Some(vec![
            Image {
                name: "EOS-4.17.swi".into(),
                reboot_required: true,
            },
            Image {
                name: "TerminAttr.rpm".into(),
                reboot_required: false,
            },
        ]),
        image_bundles: Some(vec![ImageBundle {
            name: "prod".into(),
            image_names: vec!["EOS-4.17.swi".into(), "TerminAttr.rpm".into()],
            certified: true,
        }]),
        ..document()
    };
    let opts = options(&[EntityType::ImageBundles]);

    restore(&api, &doc, &opts).await.unwrap();
    let again = restore(&api, &doc, &opts).await.unwrap();

    assert_eq!(api.calls_to("create_image_bundle").len(), 1);
    assert!(api.calls_to("update_image_bundle").is_empty());
    assert_eq!(again.unchanged[0].name, "prod");
    let reboot: HashMap<String, bool> = api
        .state()
        .images
        .into_iter()
        .map(|i| (i.name, i.reboot_required))
        .collect();
    assert!(reboot["EOS-4.17.swi"]);
    assert!(!reboot["TerminAttr.rpm"]);
}

// ── Containers ───────────────────────────────────────────────────────

#[tokio::test]
async fn container_tree_is_built_parents_first() {
    let api = FakeController::fresh();
    let mut leaf = container("Leaf", "Pod1");
    leaf.configlets = vec!["c1".into()];
    leaf.image_bundle = "prod".into();
    let doc = SnapshotDocument {
        containers: Some(vec![
            leaf,
            container("Spine", "Pod1"),
            container("Pod1", "DC1"),
            container("DC1", ""),
            container("Pod2", "DC1"),
        ]),
        ..document()
    };

    restore(&api, &doc, &options(&[EntityType::Containers]))
        .await
        .unwrap();

    assert_eq!(api.calls_to("rename_container"), ["rename_container:Tenant->DC1"]);
    let creates = api.calls_to("create_container");
    assert_eq!(creates.len(), 4);

    let calls = api.calls();
    let position = |name: &str| {
        calls
            .iter()
            .position(|c| *c == format!("create_container:{name}"))
            .unwrap()
    };
    assert!(position("Pod1") < position("Leaf"));
    assert!(position("Pod1") < position("Spine"));

    let state = api.state();
    let parents: HashMap<&str, &str> = state
        .containers
        .iter()
        .map(|c| (c.name.as_str(), c.parent_name.as_str()))
        .collect();
    for start in parents.keys() {
        let mut current = *start;
        let mut hops = 0;
        while let Some(parent) = parents.get(current).filter(|p| !p.is_empty()) {
            current = *parent;
            hops += 1;
            assert!(hops <= parents.len());
        }
        assert_eq!(current, "DC1");
    }

    let leaf = state.containers.iter().find(|c| c.name == "Leaf").unwrap();
    assert_eq!(leaf.configlets, ["c1"]);
    assert_eq!(leaf.image_bundle, "prod");
}

#[tokio::test]
async fn existing_containers_are_tolerated() {
    let api = FakeController::fresh();
    api.with_state(|s| s.containers.push(container("Pod1", "Tenant")));
    let doc = SnapshotDocument {
        containers: Some(vec![container("Tenant", ""), container("Pod1", "Tenant")]),
        ..document()
    };

    let report = restore(&api, &doc, &options(&[EntityType::Containers]))
        .await
        .unwrap();

    assert!(api.calls_to("rename_container").is_empty());
    assert!(report.created.is_empty());
    assert_eq!(report.unchanged.len(), 2);
}

#[tokio::test]
async fn matching_container_attachments_are_not_resent() {
    let api = FakeController::fresh();
    let mut pod = container("Pod1", "Tenant");
    pod.configlets = vec!["c1".into(), "c2".into()];
    pod.image_bundle = "prod".into();
    let doc = SnapshotDocument {
        containers: Some(vec![container("Tenant", ""), pod]),
        ..document()
    };
    let opts = options(&[EntityType::Containers]);

    restore(&api, &doc, &opts).await.unwrap();
    assert_eq!(api.calls_to("apply_image_bundle_to_container").len(), 1);
    assert_eq!(api.calls_to("apply_configlets_to_container").len(), 1);

    api.clear_calls();
    restore(&api, &doc, &opts).await.unwrap();
    assert!(api.calls_to("apply_image_bundle_to_container").is_empty());
    assert!(api.calls_to("apply_configlets_to_container").is_empty());

    // Only the configlet the live container lacks is sent.
    api.with_state(|s| {
        let live = s.containers.iter_mut().find(|c| c.name == "Pod1").unwrap();
        live.configlets.retain(|n| n != "c2");
    });
    api.clear_calls();
    restore(&api, &doc, &opts).await.unwrap();
    assert_eq!(api.calls_to("apply_configlets_to_container").len(), 1);
    let pod = api.state().containers.into_iter().find(|c| c.name == "Pod1").unwrap();
    assert_eq!(pod.configlets, ["c1", "c2"]);
}

// ── Devices ──────────────────────────────────────────────────────────

fn leaf_device(n: u8) -> cvpkit_core::Device {
    let mut d = device(
        &format!("10.0.0.{n}"),
        &format!("leaf{n}.lab"),
        &format!("00:1c:73:00:00:0{n}"),
        "Tenant",
    );
    d.configlets = vec!["base".into()];
    d
}

#[tokio::test]
async fn one_failing_device_does_not_stop_the_others() {
    let api = FakeController::fresh();
    api.with_state(|s| {
        s.failing_attach.insert("10.0.0.2".into());
    });
    let doc = SnapshotDocument {
        devices: Some(vec![leaf_device(1), leaf_device(2), leaf_device(3)]),
        ..document()
    };

    let report = restore(&api, &doc, &options(&[EntityType::Devices]))
        .await
        .unwrap();

    assert_eq!(api.calls_to("add_devices"), ["add_devices:3"]);
    let state = api.state();
    for ip in ["10.0.0.1", "10.0.0.3"] {
        let d = state.devices.iter().find(|d| d.ip_address == ip).unwrap();
        assert_eq!(d.configlets, ["base"]);
    }
    let d2_warnings: Vec<&String> = report
        .warnings
        .iter()
        .filter(|w| w.contains("10.0.0.2"))
        .collect();
    assert_eq!(d2_warnings.len(), 1);
    assert_eq!(report.devices.connected.len(), 3);
}

#[tokio::test]
async fn device_outcomes_are_reported() {
    let api = FakeController::fresh();
    api.with_state(|s| {
        s.unreachable.insert("10.0.0.2".into());
    });
    let doc = SnapshotDocument {
        devices: Some(vec![leaf_device(1), leaf_device(2)]),
        ..document()
    };

    let report = restore(&api, &doc, &options(&[EntityType::Devices]))
        .await
        .unwrap();

    assert_eq!(report.devices.connected.len(), 1);
    assert_eq!(report.devices.unreachable[0].ip_address, "10.0.0.2");
    assert!(report.warnings.iter().any(|w| w.contains("could not be reached")));
    assert_eq!(api.calls_to("apply_configlets_to_device").len(), 1);
}

#[tokio::test]
async fn derived_configlets_are_replayed_per_device() {
    let api = FakeController::fresh();
    let mut d = leaf_device(1);
    d.configlets = vec!["gen-leaf1".into(), "rec-leaf1".into(), "base".into()];
    d.image_bundle = "prod".into();
    let doc = SnapshotDocument {
        configlets: Some(vec![
            Configlet::new_static("base", "x"),
            Configlet::new_generated(
                "gen-leaf1",
                "hostname leaf1",
                "hostnames",
                "Tenant",
                &d.mac_address,
            ),
            Configlet::new_reconciled("rec-leaf1", "ntp server 1.1.1.1", &d.mac_address),
        ]),
        devices: Some(vec![d]),
        ..document()
    };

    restore(&api, &doc, &options(&[EntityType::Devices]))
        .await
        .unwrap();

    assert_eq!(api.calls_to("add_generated_configlet"), ["add_generated_configlet:gen-leaf1"]);
    assert_eq!(api.calls_to("add_reconciled_configlet"), ["add_reconciled_configlet:rec-leaf1"]);
    let state = api.state();
    assert_eq!(state.devices[0].configlets, ["base"]);
    assert_eq!(state.devices[0].image_bundle, "prod");
}

#[tokio::test]
async fn failing_derived_configlet_leaves_the_rest_attached() {
    let api = FakeController::fresh();
    api.with_state(|s| {
        s.failing_derived.insert("gen-stale".into());
    });
    let mut d = leaf_device(1);
    d.configlets = vec!["gen-stale".into(), "rec-leaf1".into(), "base".into()];
    let doc = SnapshotDocument {
        configlets: Some(vec![
            Configlet::new_static("base", "x"),
            Configlet::new_generated("gen-stale", "hostname old", "hostnames", "Tenant", "aa:bb"),
            Configlet::new_reconciled("rec-leaf1", "ntp server 1.1.1.1", &d.mac_address),
        ]),
        devices: Some(vec![d]),
        ..document()
    };

    let report = restore(&api, &doc, &options(&[EntityType::Devices]))
        .await
        .unwrap();

    assert_eq!(api.calls_to("add_reconciled_configlet"), ["add_reconciled_configlet:rec-leaf1"]);
    assert_eq!(api.state().devices[0].configlets, ["base"]);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("configlet gen-stale not added to device 10.0.0.1"));
}

#[tokio::test]
async fn unreconciled_configlet_is_attached_by_name() {
    let api = FakeController::fresh();
    let mut d = leaf_device(1);
    d.configlets = vec!["rec-draft".into()];
    let mut draft = Configlet::new_reconciled("rec-draft", "ntp server 1.1.1.1", &d.mac_address);
    draft.reconciled = false;
    let doc = SnapshotDocument {
        configlets: Some(vec![draft]),
        devices: Some(vec![d]),
        ..document()
    };

    restore(&api, &doc, &options(&[EntityType::Devices]))
        .await
        .unwrap();

    assert!(api.calls_to("add_reconciled_configlet").is_empty());
    assert_eq!(api.state().devices[0].configlets, ["rec-draft"]);
}

// ── Tasks and version gate ───────────────────────────────────────────

fn pending(task_id: u64) -> Task {
    Task {
        task_id,
        status: TaskStatus::Pending,
        description: String::new(),
    }
}

#[tokio::test]
async fn pending_tasks_are_executed_and_awaited() {
    let api = FakeController::fresh();
    api.with_state(|s| s.tasks = vec![pending(12), pending(13)]);

    let report = restore(&api, &document(), &options(&[EntityType::Tasks]))
        .await
        .unwrap();

    assert_eq!(report.tasks, [12, 13]);
    assert_eq!(api.calls_to("execute_task"), ["execute_task:12", "execute_task:13"]);
}

#[tokio::test]
async fn failed_task_is_fatal() {
    let api = FakeController::fresh();
    api.with_state(|s| {
        s.tasks = vec![pending(7)];
        s.task_outcome = Some(TaskStatus::Failed);
    });

    let err = restore(&api, &document(), &options(&[EntityType::Tasks]))
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::TaskFailed { task_id: 7, .. }));
}

#[tokio::test(start_paused = true)]
async fn stuck_task_times_out() {
    let api = FakeController::fresh();
    api.with_state(|s| {
        s.tasks = vec![pending(9)];
        s.task_outcome = None;
    });
    let opts = RestoreOptions {
        task_policy: TaskPolicy {
            interval: Duration::from_secs(1),
            timeout: Duration::from_secs(5),
        },
        ..options(&[EntityType::Tasks])
    };

    let err = restore(&api, &document(), &opts).await.unwrap_err();

    assert!(matches!(
        err,
        CoreError::TaskTimeout {
            task_id: 9,
            timeout_secs: 5
        }
    ));
}

#[tokio::test]
async fn unsupported_controller_stops_before_any_change() {
    let api = FakeController::fresh();
    api.with_state(|s| s.version = "2017.2.0".into());
    let doc = SnapshotDocument {
        configlets: Some(vec![Configlet::new_static("c1", "x")]),
        ..document()
    };

    let err = restore(&api, &doc, &options(&[EntityType::Configlets]))
        .await
        .unwrap_err();
    assert!(err.is_version_gate());
    assert_eq!(api.calls(), ["version:"]);

    let opts = RestoreOptions {
        skip_version_check: true,
        ..options(&[EntityType::Configlets])
    };
    restore(&api, &doc, &opts).await.unwrap();
    assert_eq!(api.calls_to("create_configlet").len(), 1);
}

#[tokio::test]
async fn unsupported_snapshot_version_is_rejected() {
    let api = FakeController::fresh();
    let doc = SnapshotDocument {
        version: "2014.1.0".into(),
        ..SnapshotDocument::default()
    };

    let err = restore(&api, &doc, &options(&[EntityType::Roles]))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::UnsupportedSnapshotVersion { .. }));
}
