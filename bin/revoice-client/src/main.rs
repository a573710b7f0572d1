//! revoice-client – scripted client for a revoice server.
//!
//! Fetches page text from a content service, submits conversion tasks, polls
//! until they finish and saves the resulting audio locally.

mod api;
mod content;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use crate::api::ServerApi;
use crate::content::ContentClient;

/// How often task status is polled while waiting.
const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Maximum time to wait for a single conversion.
const CONVERSION_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Parser)]
#[command(
    name = "revoice-client",
    version,
    about = "Drive a revoice server from the command line"
)]
struct Cli {
    /// Base URL of the revoice server.
    #[arg(long, default_value = "http://localhost:8000", env = "REVOICE_SERVER")]
    server: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert every child page of the named content page into audio files.
    Page {
        /// Exact title of the parent page to look up.
        query: String,

        /// Content-service integration token.
        #[arg(long, env = "REVOICE_CONTENT_TOKEN")]
        token: String,

        /// Directory for the downloaded audio files.
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Convert a single piece of text.
    Text {
        text: String,

        /// Output file path.
        #[arg(long, default_value = "output.wav")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let server = ServerApi::new(&cli.server)?;

    match cli.command {
        Command::Page {
            query,
            token,
            out_dir,
        } => convert_page(&server, &token, &query, &out_dir).await,
        Command::Text { text, output } => convert_one(&server, &text, &output).await,
    }
}

/// Submit one text, wait for it and save the audio to `output`.
async fn convert_one(server: &ServerApi, text: &str, output: &Path) -> Result<()> {
    let task = server.create_task(text).await?;
    println!("task {} accepted", task.id);

    server
        .wait_for_completion(&task.id, POLL_INTERVAL, CONVERSION_TIMEOUT)
        .await?;
    server.download_result(&task.id, output).await?;
    server.delete_task(&task.id).await?;

    println!("saved {}", output.display());
    Ok(())
}

async fn convert_page(
    server: &ServerApi,
    token: &str,
    query: &str,
    out_dir: &Path,
) -> Result<()> {
    let content = ContentClient::new(token)?;

    let pages = content.search_pages(query).await?;
    if pages.is_empty() {
        bail!("no page found for '{query}'");
    }
    let parent = pages
        .iter()
        .find(|p| p.title == query)
        .with_context(|| format!("no page titled exactly '{query}'"))?;

    let children = content.child_pages(&parent.id).await?;
    if children.is_empty() {
        println!("no child pages under '{query}'");
        return Ok(());
    }

    for child in children {
        let text = content.page_text(&child.id).await?;
        if text.trim().is_empty() {
            println!("skipping '{}': no text to convert", child.title);
            continue;
        }
        let output = out_dir.join(format!("{query}_{}.wav", child.title));
        convert_one(server, &text, &output).await?;
    }

    Ok(())
}
