// MCP server over newline-delimited stdio

use crate::gateway::McpGateway;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Serves the gateway one JSON message per line
///
/// stdout carries protocol messages only, so logging must go to stderr.
pub struct McpServer {
    gateway: Arc<McpGateway>,
}

impl McpServer {
    pub fn new(gateway: Arc<McpGateway>) -> Self {
        Self { gateway }
    }

    /// Serve stdin/stdout until stdin closes
    pub async fn start(&self) -> Result<()> {
        tracing::info!("MCP server listening on stdio");
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Answer every non-blank line read from `reader` with one line on `writer`
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await.context("Failed to read request")? {
            if line.trim().is_empty() {
                continue;
            }

            let response = self.gateway.handle_bytes(line.as_bytes()).await;
            writer
                .write_all(&response)
                .await
                .context("Failed to write response")?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }

        tracing::info!("stdin closed, MCP server stopping");
        Ok(())
    }
}
