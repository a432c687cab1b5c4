// Configlet endpoints
//
// Static configlets, configlet builders, and the mapper endpoint used to
// create Generated and Reconciled configlets together with their links.

use serde_json::{Map, Value, json};
use tracing::debug;

use crate::client::CvpClient;
use crate::error::Error;
use crate::models::{
    ConfigletBuilderInfo, ConfigletInfo, ConfigletList, ConfigletMappers, DataList, DataObject,
};

impl CvpClient {
    /// List every configlet (summary rows, including builders).
    pub async fn list_configlets(&self) -> Result<Vec<ConfigletInfo>, Error> {
        let url = self.web_url_with(
            "configlet/getConfiglets.do",
            &[("startIndex", "0"), ("endIndex", "0")],
        )?;
        let list: DataList<ConfigletInfo> = self.get(url).await?;
        Ok(list.data)
    }

    pub async fn get_configlet_by_name(&self, name: &str) -> Result<ConfigletInfo, Error> {
        let url = self.web_url_with("configlet/getConfigletByName.do", &[("name", name)])?;
        self.get(url).await
    }

    pub async fn add_configlet(&self, name: &str, config: &str) -> Result<(), Error> {
        let url = self.web_url("configlet/addConfiglet.do")?;
        let _: Value = self
            .post(url, &json!({ "config": config, "name": name }))
            .await?;
        Ok(())
    }

    pub async fn update_configlet(&self, name: &str, config: &str, key: &str) -> Result<(), Error> {
        let url = self.web_url("configlet/updateConfiglet.do")?;
        let _: Value = self
            .post(url, &json!({ "config": config, "name": name, "key": key }))
            .await?;
        Ok(())
    }

    pub async fn delete_configlet(&self, name: &str, key: &str) -> Result<(), Error> {
        let url = self.web_url("configlet/deleteConfiglet.do")?;
        let _: Value = self
            .post(url, &json!([{ "key": key, "name": name }]))
            .await?;
        Ok(())
    }

    // ── Builders ─────────────────────────────────────────────────────

    pub async fn get_configlet_builder(&self, key: &str) -> Result<ConfigletBuilderInfo, Error> {
        let url = self.web_url_with(
            "configlet/getConfigletBuilder.do",
            &[("type", ""), ("id", key)],
        )?;
        let wrapped: DataObject<ConfigletBuilderInfo> = self.get(url).await?;
        Ok(wrapped.data)
    }

    pub async fn add_configlet_builder(
        &self,
        name: &str,
        form_list: &[Map<String, Value>],
        main_script: &str,
    ) -> Result<(), Error> {
        let url = self.web_url_with("configlet/addConfigletBuilder.do", &[("isDraft", "false")])?;
        let _: Value = self
            .post(url, &builder_body(name, form_list, main_script))
            .await?;
        Ok(())
    }

    pub async fn update_configlet_builder(
        &self,
        name: &str,
        form_list: &[Map<String, Value>],
        main_script: &str,
        key: &str,
    ) -> Result<(), Error> {
        let url = self.web_url_with(
            "configlet/updateConfigletBuilder.do",
            &[("isDraft", "false"), ("id", key)],
        )?;
        let _: Value = self
            .post(url, &builder_body(name, form_list, main_script))
            .await?;
        Ok(())
    }

    // ── Mappers ──────────────────────────────────────────────────────

    pub async fn get_configlet_mappers(&self) -> Result<ConfigletMappers, Error> {
        let url = self.web_url("configlet/getConfigletsAndAssociatedMappers.do")?;
        let wrapped: DataObject<ConfigletMappers> = self.get(url).await?;
        Ok(wrapped.data)
    }

    /// Create a Generated configlet and link it to its builder, container
    /// and device.
    pub async fn add_generated_configlet(
        &self,
        name: &str,
        config: &str,
        container_key: &str,
        device_mac: &str,
        builder_key: &str,
    ) -> Result<(), Error> {
        let url = self.web_url("configlet/addConfigletsAndAssociatedMappers.do")?;
        let _: Value = self
            .post(
                url.clone(),
                &json!({ "data": { "configlets": [
                    { "config": config, "name": name, "type": "Generated" }
                ] } }),
            )
            .await?;

        let configlet_key = self.get_configlet_by_name(name).await?.key;
        debug!(configlet = name, key = %configlet_key, "linking generated configlet");
        let _: Value = self
            .post(
                url,
                &json!({ "data": {
                    "generatedConfigletMappers": [{
                        "containerId": container_key,
                        "configletId": configlet_key,
                        "netElementId": device_mac,
                        "configletBuilderId": builder_key,
                        "action": "assign",
                        "previewValues": [],
                        "previewValuesListSize": 0,
                        "objectType": null,
                        "key": "",
                    }],
                    "configletMappers": [{
                        "objectId": device_mac,
                        "containerId": null,
                        "configletId": configlet_key,
                        "configletType": "Generated",
                        "type": "netelement",
                    }],
                } }),
            )
            .await?;
        Ok(())
    }

    /// Create a Reconciled configlet and link it to its device.
    pub async fn add_reconciled_configlet(
        &self,
        name: &str,
        config: &str,
        device_mac: &str,
    ) -> Result<(), Error> {
        let url = self.web_url("configlet/addConfigletsAndAssociatedMappers.do")?;
        let _: Value = self
            .post(
                url.clone(),
                &json!({ "data": { "configlets": [
                    { "config": config, "name": name, "type": "Static", "reconciled": true }
                ] } }),
            )
            .await?;

        let configlet_key = self.get_configlet_by_name(name).await?.key;
        let _: Value = self
            .post(
                url,
                &json!({ "data": { "configletMappers": [{
                    "objectId": device_mac,
                    "containerId": null,
                    "configletId": configlet_key,
                    "configletType": "Static",
                    "type": "netelement",
                }] } }),
            )
            .await?;
        Ok(())
    }

    // ── Attachments ──────────────────────────────────────────────────

    pub async fn container_configlets(&self, container_key: &str) -> Result<Vec<ConfigletInfo>, Error> {
        let url = self.web_url_with(
            "provisioning/getConfigletsByContainerId.do",
            &[
                ("containerId", container_key),
                ("queryParam", ""),
                ("startIndex", "0"),
                ("endIndex", "0"),
            ],
        )?;
        let list: ConfigletList = self.get(url).await?;
        Ok(list.configlet_list)
    }

    pub async fn device_configlets(&self, device_mac: &str) -> Result<Vec<ConfigletInfo>, Error> {
        let url = self.web_url_with(
            "provisioning/getConfigletsByNetElementId.do",
            &[
                ("netElementId", device_mac),
                ("queryParam", ""),
                ("startIndex", "0"),
                ("endIndex", "0"),
            ],
        )?;
        let list: ConfigletList = self.get(url).await?;
        Ok(list.configlet_list)
    }
}

fn builder_body(name: &str, form_list: &[Map<String, Value>], main_script: &str) -> Value {
    json!({
        "name": name,
        "data": {
            "formList": form_list,
            "main_script": { "data": main_script, "key": null },
        },
    })
}
