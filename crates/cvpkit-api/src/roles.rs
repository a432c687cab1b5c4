// Role endpoints

use serde_json::{Value, json};

use crate::client::CvpClient;
use crate::error::Error;
use crate::models::{RoleInfo, RoleList};

impl CvpClient {
    /// List roles. Module entries are returned without their
    /// controller-assigned `id`/`factoryId`, so they compare equal across
    /// controllers.
    pub async fn list_roles(&self) -> Result<Vec<RoleInfo>, Error> {
        let url = self.web_url_with(
            "role/getRoles.do",
            &[("queryParam", "null"), ("startIndex", "0"), ("endIndex", "0")],
        )?;
        let mut list: RoleList = self.get(url).await?;
        for role in &mut list.roles {
            for module in &mut role.module_list {
                if let Some(obj) = module.as_object_mut() {
                    obj.remove("factoryId");
                    obj.remove("id");
                }
            }
        }
        Ok(list.roles)
    }

    pub async fn create_role(&self, name: &str, module_list: &[Value]) -> Result<(), Error> {
        let url = self.web_url("role/createRole.do")?;
        let _: Value = self
            .post(url, &json!({ "name": name, "moduleList": module_list }))
            .await?;
        Ok(())
    }

    pub async fn update_role(
        &self,
        key: &str,
        name: &str,
        description: &str,
        module_list: &[Value],
    ) -> Result<(), Error> {
        let url = self.web_url("role/updateRole.do")?;
        let _: Value = self
            .post(
                url,
                &json!({
                    "key": key,
                    "name": name,
                    "description": description,
                    "moduleList": module_list,
                }),
            )
            .await?;
        Ok(())
    }

    pub async fn delete_role(&self, key: &str) -> Result<(), Error> {
        let url = self.web_url("role/deleteRoles.do")?;
        let _: Value = self.post(url, &json!([key])).await?;
        Ok(())
    }
}
