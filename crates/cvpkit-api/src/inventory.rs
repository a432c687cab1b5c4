// Inventory endpoints
//
// Container tree, provisioned devices, temp (onboarding) devices, and the
// add-to-inventory pipeline.

use serde_json::{Value, json};

use crate::client::CvpClient;
use crate::error::Error;
use crate::models::{ComplianceReport, ContainerInfo, DataList, Inventory, RetrievedInventory};

impl CvpClient {
    /// Container tree rooted at the tenant container, plus temp devices.
    pub async fn retrieve_inventory(&self) -> Result<RetrievedInventory, Error> {
        let url = self.web_url_with(
            "inventory/add/retrieveInventory.do",
            &[("startIndex", "0"), ("endIndex", "0")],
        )?;
        self.get(url).await
    }

    /// Provisioned devices and their parent container names.
    pub async fn get_inventory(&self) -> Result<Inventory, Error> {
        let url = self.web_url_with(
            "inventory/getInventory.do",
            &[("queryparam", "."), ("startIndex", "0"), ("endIndex", "0")],
        )?;
        self.get(url).await
    }

    /// Substring search over container names.
    pub async fn search_containers(&self, name: &str) -> Result<Vec<ContainerInfo>, Error> {
        let url = self.web_url_with(
            "inventory/add/searchContainers.do",
            &[("queryparam", name), ("startIndex", "0"), ("endIndex", "0")],
        )?;
        let list: DataList<ContainerInfo> = self.get(url).await?;
        Ok(list.data)
    }

    pub async fn container_by_id(&self, key: &str) -> Result<ContainerInfo, Error> {
        let url = self.web_url_with(
            "provisioning/getContainerInfoById.do",
            &[("containerId", key)],
        )?;
        self.get(url).await
    }

    /// Start onboarding a device at `ip_address` under the given container.
    pub async fn add_to_inventory(
        &self,
        ip_address: &str,
        container_name: &str,
        container_key: &str,
    ) -> Result<(), Error> {
        let url = self.web_url_with(
            "inventory/add/addToInventory.do",
            &[("startIndex", "0"), ("endIndex", "0")],
        )?;
        let _: Value = self
            .post(
                url,
                &json!({ "data": [{
                    "containerName": container_name,
                    "containerId": container_key,
                    "containerType": "Existing",
                    "ipAddress": ip_address,
                    "containerList": [],
                }] }),
            )
            .await?;
        Ok(())
    }

    pub async fn save_inventory(&self) -> Result<(), Error> {
        let url = self.web_url("inventory/add/saveInventory.do")?;
        let _: Value = self.post_empty(url).await?;
        Ok(())
    }

    /// Drop a temp device entry (Connecting, Duplicate, Unauthorized, ...).
    pub async fn delete_temp_device(&self, key: &str) -> Result<(), Error> {
        let url = self.web_url_with(
            "inventory/add/deleteFromInventory.do",
            &[("netElementId", key)],
        )?;
        let _: Value = self.get(url).await?;
        Ok(())
    }

    pub async fn check_compliance(&self, device_mac: &str) -> Result<ComplianceReport, Error> {
        let url = self.web_url("ztp/checkCompliance.do")?;
        self.post(
            url,
            &json!({ "nodeId": device_mac, "nodeType": "netelement" }),
        )
        .await
    }
}
