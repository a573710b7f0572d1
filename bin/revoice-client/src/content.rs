//! Minimal client for the third-party content service.
//!
//! Covers only what the conversion flow needs: searching pages by title,
//! listing child pages and extracting their plain text.

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::Value;

const API_BASE: &str = "https://api.notion.com/v1";
const API_VERSION: &str = "2022-06-28";

#[derive(Debug, Clone)]
pub struct Page {
    pub id: String,
    pub title: String,
}

pub struct ContentClient {
    client: Client,
    token: String,
}

impl ContentClient {
    pub fn new(token: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("revoice-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            token: token.to_owned(),
        })
    }

    /// Search pages whose title matches `query`.
    pub async fn search_pages(&self, query: &str) -> Result<Vec<Page>> {
        let body = self
            .client
            .post(format!("{API_BASE}/search"))
            .bearer_auth(&self.token)
            .header("Notion-Version", API_VERSION)
            .json(&serde_json::json!({
                "query": query,
                "filter": { "property": "object", "value": "page" },
            }))
            .send()
            .await
            .context("page search failed")?
            .error_for_status()
            .context("page search rejected")?
            .json::<Value>()
            .await?;

        let pages = body["results"]
            .as_array()
            .map(|results| {
                results
                    .iter()
                    .filter_map(|page| {
                        Some(Page {
                            id: page["id"].as_str()?.to_owned(),
                            title: page_title(page),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(pages)
    }

    /// Child pages directly under `page_id`.
    pub async fn child_pages(&self, page_id: &str) -> Result<Vec<Page>> {
        let body = self.block_children(page_id).await?;
        let children = body["results"]
            .as_array()
            .map(|blocks| {
                blocks
                    .iter()
                    .filter(|b| b["type"] == "child_page")
                    .filter_map(|b| {
                        Some(Page {
                            id: b["id"].as_str()?.to_owned(),
                            title: b["child_page"]["title"]
                                .as_str()
                                .unwrap_or("Untitled")
                                .to_owned(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(children)
    }

    /// Plain text of the paragraph and heading blocks of a page.
    pub async fn page_text(&self, page_id: &str) -> Result<String> {
        let body = self.block_children(page_id).await?;
        let mut lines = Vec::new();
        if let Some(blocks) = body["results"].as_array() {
            for block in blocks {
                let kind = block["type"].as_str().unwrap_or("");
                if matches!(kind, "paragraph" | "heading_1" | "heading_2" | "heading_3") {
                    if let Some(text) = block[kind]["rich_text"][0]["plain_text"].as_str() {
                        lines.push(text.to_owned());
                    }
                }
            }
        }
        Ok(lines.join("\n"))
    }

    async fn block_children(&self, page_id: &str) -> Result<Value> {
        self.client
            .get(format!("{API_BASE}/blocks/{page_id}/children"))
            .bearer_auth(&self.token)
            .header("Notion-Version", API_VERSION)
            .send()
            .await
            .context("block listing failed")?
            .error_for_status()
            .context("block listing rejected")?
            .json::<Value>()
            .await
            .context("block listing returned invalid JSON")
    }
}

/// Title of a page object; `"Untitled"` when the title property is absent.
fn page_title(page: &Value) -> String {
    page["properties"]["title"]["title"][0]["plain_text"]
        .as_str()
        .unwrap_or("Untitled")
        .to_owned()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn page_title_reads_plain_text() {
        let page = serde_json::json!({
            "properties": { "title": { "title": [{ "plain_text": "Notes" }] } }
        });
        assert_eq!(page_title(&page), "Notes");
    }

    #[test]
    fn page_title_defaults_when_missing() {
        let page = serde_json::json!({ "properties": {} });
        assert_eq!(page_title(&page), "Untitled");
    }
}
