//! HTTP client for the revoice task API.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::Client;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct TaskCreated {
    pub id: String,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct TaskStatus {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub output_file: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

pub struct ServerApi {
    base: String,
    client: Client,
}

impl ServerApi {
    pub fn new(base: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("revoice-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            base: base.trim_end_matches('/').to_owned(),
            client,
        })
    }

    pub async fn create_task(&self, text: &str) -> Result<TaskCreated> {
        let resp = self
            .client
            .post(format!("{}/v1/tts", self.base))
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .context("task creation request failed")?;
        if !resp.status().is_success() {
            bail!(
                "task creation failed ({}): {}",
                resp.status(),
                resp.text().await.unwrap_or_default()
            );
        }
        Ok(resp.json().await?)
    }

    pub async fn status(&self, id: &str) -> Result<TaskStatus> {
        let resp = self
            .client
            .get(format!("{}/v1/tts/{id}", self.base))
            .send()
            .await
            .context("status request failed")?;
        if !resp.status().is_success() {
            bail!(
                "status query failed ({}): {}",
                resp.status(),
                resp.text().await.unwrap_or_default()
            );
        }
        Ok(resp.json().await?)
    }

    /// Poll until the task completes, failing fast on a failed conversion.
    pub async fn wait_for_completion(
        &self,
        id: &str,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<TaskStatus> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let status = self.status(id).await?;
            match status.status.as_str() {
                "completed" => return Ok(status),
                "failed" => bail!(
                    "task {id} failed: {}",
                    status.error.unwrap_or_else(|| "unknown error".to_owned())
                ),
                _ => {}
            }
            if tokio::time::Instant::now() >= deadline {
                bail!("task {id} did not complete within {}s", timeout.as_secs());
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    pub async fn download_result(&self, id: &str, dest: &Path) -> Result<()> {
        let resp = self
            .client
            .get(format!("{}/v1/tts/{id}/result", self.base))
            .send()
            .await
            .context("result request failed")?;
        if !resp.status().is_success() {
            bail!(
                "result download failed ({}): {}",
                resp.status(),
                resp.text().await.unwrap_or_default()
            );
        }
        let bytes = resp.bytes().await?;
        tokio::fs::write(dest, &bytes)
            .await
            .with_context(|| format!("failed to write {}", dest.display()))?;
        Ok(())
    }

    pub async fn delete_task(&self, id: &str) -> Result<()> {
        let resp = self
            .client
            .delete(format!("{}/v1/tts/{id}", self.base))
            .send()
            .await
            .context("delete request failed")?;
        if !resp.status().is_success() {
            bail!(
                "task deletion failed ({}): {}",
                resp.status(),
                resp.text().await.unwrap_or_default()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let api = ServerApi::new("http://localhost:8000/").unwrap();
        assert_eq!(api.base, "http://localhost:8000");
    }
}
