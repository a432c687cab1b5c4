// Image and image bundle endpoints

use std::path::Path;

use serde_json::{Value, json};
use tracing::debug;

use crate::client::CvpClient;
use crate::error::Error;
use crate::models::{
    AppliedContainer, AppliedDevice, BundleImage, DataList, ImageBundleInfo, ImageBundleSummary,
    ImageInfo,
};

impl CvpClient {
    pub async fn list_images(&self) -> Result<Vec<ImageInfo>, Error> {
        let url = self.web_url_with(
            "image/getImages.do",
            &[("queryparam", ""), ("startIndex", "0"), ("endIndex", "0")],
        )?;
        let list: DataList<ImageInfo> = self.get(url).await?;
        Ok(list.data)
    }

    /// Upload an image file; returns what the controller recorded.
    pub async fn upload_image(&self, path: &Path) -> Result<ImageInfo, Error> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_owned();
        let bytes = tokio::fs::read(path).await?;
        debug!(image = %file_name, size = bytes.len(), "uploading image");
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        let form = reqwest::multipart::Form::new().part("file", part);
        let url = self.web_url("image/addImage.do")?;
        self.post_multipart(url, form).await
    }

    /// Download an image's content by id into `dest`.
    pub async fn download_image(&self, image_id: &str, dest: &Path) -> Result<(), Error> {
        let url = self.web_url(&format!("services/image/getImagebyId/{image_id}"))?;
        let bytes = self.get_bytes(url).await?;
        tokio::fs::write(dest, bytes).await?;
        Ok(())
    }

    pub async fn list_image_bundles(&self) -> Result<Vec<ImageBundleSummary>, Error> {
        let url = self.web_url_with(
            "image/getImageBundles.do",
            &[("queryparam", ""), ("startIndex", "0"), ("endIndex", "0")],
        )?;
        let list: DataList<ImageBundleSummary> = self.get(url).await?;
        Ok(list.data)
    }

    pub async fn get_image_bundle_by_name(&self, name: &str) -> Result<ImageBundleInfo, Error> {
        let url = self.web_url_with("image/getImageBundleByName.do", &[("name", name)])?;
        self.get(url).await
    }

    pub async fn save_image_bundle(
        &self,
        name: &str,
        certified: bool,
        images: &[BundleImage],
    ) -> Result<(), Error> {
        let url = self.web_url("image/saveImageBundle.do")?;
        let _: Value = self
            .post(
                url,
                &json!({
                    "name": name,
                    "isCertifiedImage": certified.to_string(),
                    "images": images,
                }),
            )
            .await?;
        Ok(())
    }

    pub async fn update_image_bundle(
        &self,
        name: &str,
        certified: bool,
        images: &[BundleImage],
        key: &str,
    ) -> Result<(), Error> {
        let url = self.web_url("image/updateImageBundle.do")?;
        let _: Value = self
            .post(
                url,
                &json!({
                    "name": name,
                    "isCertifiedImage": certified.to_string(),
                    "images": images,
                    "id": key,
                }),
            )
            .await?;
        Ok(())
    }

    pub async fn delete_image_bundle(&self, name: &str, key: &str) -> Result<(), Error> {
        let url = self.web_url("image/deleteImageBundles.do")?;
        let _: Value = self
            .post(url, &json!({ "data": [{ "key": key, "name": name }] }))
            .await?;
        Ok(())
    }

    pub async fn image_bundle_containers(&self, name: &str) -> Result<Vec<AppliedContainer>, Error> {
        let url = self.web_url_with(
            "image/getImageBundleAppliedContainers.do",
            &[
                ("imageName", name),
                ("startIndex", "0"),
                ("endIndex", "0"),
                ("queryparam", "null"),
            ],
        )?;
        let list: DataList<AppliedContainer> = self.get(url).await?;
        Ok(list.data)
    }

    pub async fn image_bundle_devices(&self, name: &str) -> Result<Vec<AppliedDevice>, Error> {
        let url = self.web_url_with(
            "image/getImageBundleAppliedDevices.do",
            &[
                ("imageName", name),
                ("startIndex", "0"),
                ("endIndex", "0"),
                ("queryparam", "null"),
            ],
        )?;
        let list: DataList<AppliedDevice> = self.get(url).await?;
        Ok(list.data)
    }
}
