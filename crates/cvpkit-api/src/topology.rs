// Topology change endpoints
//
// Container and association changes are staged as temp actions and then
// committed with `saveTopology`, which may spawn tasks on the controller.

use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::client::CvpClient;
use crate::error::Error;

/// Configlet names and keys for an associate action.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigletRefs {
    pub names: Vec<String>,
    pub keys: Vec<String>,
}

impl CvpClient {
    async fn add_temp_action(&self, node_id: &str, action: Value) -> Result<(), Error> {
        let url = self.web_url_with(
            "ztp/addTempAction.do",
            &[("format", "topology"), ("queryParam", ""), ("nodeId", node_id)],
        )?;
        let _: Value = self.post(url, &json!({ "data": [action] })).await?;
        Ok(())
    }

    /// Commit staged actions (plus `actions`); returns the `data` payload,
    /// which carries the ids of any spawned tasks.
    async fn save_topology(&self, actions: Vec<Value>) -> Result<Value, Error> {
        let url = self.web_url("ztp/v2/saveTopology.do")?;
        let resp: Value = self.post(url, &actions).await?;
        let data = resp.get("data").cloned().unwrap_or(Value::Null);
        debug!(response = %data, "topology saved");
        Ok(data)
    }

    pub async fn add_container(
        &self,
        name: &str,
        parent_name: &str,
        parent_key: &str,
    ) -> Result<(), Error> {
        self.add_temp_action(
            "root",
            json!({
                "info": format!("Container {name} created"),
                "infoPreview": format!("Container {name} created"),
                "action": "add",
                "nodeType": "container",
                "nodeId": "New_container1",
                "toId": parent_key,
                "fromId": "",
                "nodeName": name,
                "fromName": "",
                "toName": parent_name,
            }),
        )
        .await?;
        self.save_topology(Vec::new()).await?;
        Ok(())
    }

    pub async fn delete_container(
        &self,
        name: &str,
        key: &str,
        parent_name: &str,
        parent_key: &str,
    ) -> Result<(), Error> {
        self.add_temp_action(
            "root",
            json!({
                "id": 1,
                "info": format!("Container {name} deleted"),
                "action": "delete",
                "nodeType": "container",
                "nodeId": key,
                "toId": "",
                "fromId": parent_key,
                "nodeName": name,
                "fromName": parent_name,
                "toName": "",
                "childTasks": [],
                "parentTask": "",
                "toIdType": "container",
            }),
        )
        .await?;
        self.save_topology(Vec::new()).await?;
        Ok(())
    }

    pub async fn rename_container(&self, old_name: &str, new_name: &str, key: &str) -> Result<(), Error> {
        let info = format!("Container {new_name} renamed from {old_name}");
        self.add_temp_action(
            key,
            json!({
                "info": info,
                "infoPreview": info,
                "action": "update",
                "nodeType": "container",
                "nodeId": key,
                "toId": "",
                "fromId": "",
                "nodeName": new_name,
                "fromName": "",
                "toName": "",
                "toIdType": "container",
                "oldNodeName": old_name,
            }),
        )
        .await?;
        self.save_topology(Vec::new()).await?;
        Ok(())
    }

    /// Remove a provisioned device from its container.
    pub async fn remove_device(
        &self,
        device_mac: &str,
        container_name: &str,
        container_key: &str,
    ) -> Result<(), Error> {
        self.add_temp_action(
            "root",
            json!({
                "id": 1,
                "info": format!("Device Remove: undefined - To be Removed from Container {container_name}"),
                "infoPreview": format!("Device Remove: undefined - To be Removed from Container {container_name}"),
                "note": "",
                "action": "remove",
                "nodeType": "netelement",
                "nodeId": device_mac,
                "toId": "",
                "fromId": container_key,
                "fromName": container_name,
                "toName": "",
                "childTasks": [],
                "parentTask": "",
                "toIdType": "container",
            }),
        )
        .await?;
        self.save_topology(Vec::new()).await?;
        Ok(())
    }

    /// Associate configlets (and builders) with a container.
    pub async fn apply_configlets_to_container(
        &self,
        name: &str,
        key: &str,
        configlets: &ConfigletRefs,
        builders: &ConfigletRefs,
    ) -> Result<(), Error> {
        self.add_temp_action(
            "root",
            json!({
                "info": format!("Configlet Assign: to container {name}"),
                "infoPreview": format!("Configlet Assign: to container {name}"),
                "action": "associate",
                "nodeType": "configlet",
                "nodeId": "",
                "toId": key,
                "toIdType": "container",
                "fromId": "",
                "nodeName": "",
                "fromName": "",
                "toName": name,
                "configletList": configlets.keys,
                "configletNamesList": configlets.names,
                "ignoreConfigletList": [],
                "ignoreConfigletNamesList": [],
                "configletBuilderList": builders.keys,
                "configletBuilderNamesList": builders.names,
                "ignoreConfigletBuilderList": [],
                "ignoreConfigletBuilderNamesList": [],
            }),
        )
        .await?;
        self.save_topology(Vec::new()).await?;
        Ok(())
    }

    pub async fn remove_configlets_from_container(
        &self,
        name: &str,
        key: &str,
        configlets: &ConfigletRefs,
    ) -> Result<(), Error> {
        self.add_temp_action(
            "root",
            json!({
                "id": 1,
                "info": format!("Configlet Removal: from container {name}"),
                "infoPreview": format!("Configlet Removal: from container {name}"),
                "note": "",
                "action": "associate",
                "nodeType": "configlet",
                "nodeId": "",
                "configletList": [],
                "configletNamesList": [],
                "configletBuilderList": [],
                "configletBuilderNameList": [],
                "ignoreConfigletList": configlets.keys,
                "ignoreConfigletNamesList": configlets.names,
                "ignoreConfigletBuilderList": [],
                "ignoreConfigletBuilderNameList": [],
                "toId": key,
                "toIdType": "container",
                "fromId": "",
                "nodeName": "",
                "fromName": "",
                "toName": name,
                "childTasks": [],
                "parentTask": "",
            }),
        )
        .await?;
        self.save_topology(Vec::new()).await?;
        Ok(())
    }

    /// Associate configlets with a device.
    pub async fn apply_configlets_to_device(
        &self,
        ip_address: &str,
        fqdn: &str,
        device_mac: &str,
        configlets: &ConfigletRefs,
    ) -> Result<(), Error> {
        self.add_temp_action(
            "root",
            json!({
                "info": format!("Configlet Assign: to Device {fqdn}"),
                "infoPreview": format!("Configlet Assign: to Device {fqdn}"),
                "action": "associate",
                "nodeType": "configlet",
                "nodeId": null,
                "toId": device_mac,
                "toIdType": "netelement",
                "fromId": null,
                "nodeName": null,
                "fromName": null,
                "toName": fqdn,
                "nodeIpAddress": ip_address,
                "nodeTargetIpAddress": ip_address,
                "configletList": configlets.keys,
                "configletNamesList": configlets.names,
                "ignoreConfigletList": [],
                "ignoreConfigletNamesList": [],
                "configletBuilderList": [],
                "configletBuilderNamesList": [],
                "ignoreConfigletBuilderList": [],
                "ignoreConfigletBuilderNamesList": [],
            }),
        )
        .await?;
        self.save_topology(Vec::new()).await?;
        Ok(())
    }

    pub async fn apply_image_bundle_to_device(
        &self,
        device_mac: &str,
        fqdn: &str,
        bundle_name: &str,
        bundle_key: &str,
    ) -> Result<(), Error> {
        self.save_topology(vec![json!({
            "id": 1,
            "info": format!("Image Bundle Assign:{bundle_name} - To be assigned to Device {fqdn}"),
            "infoPreview": format!("Image Bundle Assign:{bundle_name} - To be assigned to Device {fqdn}"),
            "note": "",
            "action": "associate",
            "nodeType": "imagebundle",
            "nodeId": bundle_key,
            "toId": device_mac,
            "toIdType": "netelement",
            "fromId": "",
            "nodeName": bundle_name,
            "fromName": "",
            "toName": fqdn,
            "childTasks": [],
            "parentTask": "",
        })])
        .await?;
        Ok(())
    }

    pub async fn apply_image_bundle_to_container(
        &self,
        container_name: &str,
        container_key: &str,
        bundle_name: &str,
        bundle_key: &str,
    ) -> Result<(), Error> {
        self.save_topology(vec![json!({
            "id": 1,
            "info": format!("Image Bundle Assign:{bundle_name} - To be assigned to devices under Container {container_name}"),
            "infoPreview": format!("Image Bundle Assign:{bundle_name} - To be assigned to devices under Container {container_name}"),
            "action": "associate",
            "nodeType": "imagebundle",
            "nodeId": bundle_key,
            "toId": container_key,
            "toIdType": "container",
            "fromId": "",
            "nodeName": bundle_name,
            "fromName": "",
            "childTasks": [],
            "parentTask": "",
        })])
        .await?;
        Ok(())
    }

    pub async fn remove_image_bundle_from_container(
        &self,
        container_name: &str,
        container_key: &str,
        bundle_name: &str,
        bundle_key: &str,
    ) -> Result<(), Error> {
        self.save_topology(vec![json!({
            "info": format!("Image Bundle Removal: from container {container_name}"),
            "infoPreview": format!("Image Bundle Removal: from container {container_name}"),
            "action": "associate",
            "nodeType": "imagebundle",
            "nodeId": "",
            "toId": container_key,
            "fromId": "",
            "nodeName": "",
            "fromName": "",
            "toName": container_name,
            "toIdType": "container",
            "ignoreNodeId": bundle_key,
            "ignoreNodeName": bundle_name,
        })])
        .await?;
        Ok(())
    }
}
