// Task (work order) endpoints

use serde_json::{Value, json};

use crate::client::CvpClient;
use crate::error::Error;
use crate::models::{DataList, TaskInfo};

impl CvpClient {
    /// List tasks, optionally filtered by status (`Pending`, `Completed`, ...).
    pub async fn list_tasks(&self, status: Option<&str>) -> Result<Vec<TaskInfo>, Error> {
        let url = self.web_url_with(
            "workflow/getTasks.do",
            &[
                ("queryparam", status.unwrap_or("")),
                ("startIndex", "0"),
                ("endIndex", "0"),
            ],
        )?;
        let list: DataList<TaskInfo> = self.get(url).await?;
        Ok(list.data)
    }

    pub async fn execute_task(&self, task_id: u64) -> Result<(), Error> {
        let url = self.web_url("workflow/executeTask.do")?;
        let _: Value = self.post(url, &json!({ "data": [task_id] })).await?;
        Ok(())
    }

    pub async fn get_task(&self, task_id: u64) -> Result<TaskInfo, Error> {
        let url = self.web_url_with("task/getTaskById.do", &[("taskId", &task_id.to_string())])?;
        self.get(url).await
    }

    pub async fn cancel_task(&self, task_id: u64) -> Result<(), Error> {
        let url = self.web_url("task/cancelTask.do")?;
        let _: Value = self.post_text(url, task_id.to_string()).await?;
        Ok(())
    }

    pub async fn add_note_to_task(&self, task_id: u64, note: &str) -> Result<(), Error> {
        let url = self.web_url("task/addNoteToTask.do")?;
        let _: Value = self
            .post(url, &json!({ "workOrderId": task_id, "note": note }))
            .await?;
        Ok(())
    }
}
