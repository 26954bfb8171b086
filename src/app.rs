//! Request loop serving the vault over newline-delimited JSON

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::api::{self, Response};
use crate::core::file_system::Vault;

/// Serves one vault to a single client stream
pub struct VaultApp {
    vault: Vault,
}

impl VaultApp {
    pub fn new(vault: Vault) -> Self {
        Self { vault }
    }

    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    /// Serve requests from stdin, answering on stdout
    pub async fn run_stdio(&self) -> Result<()> {
        let reader = BufReader::new(tokio::io::stdin());
        let writer = tokio::io::stdout();
        self.serve(reader, writer).await
    }

    /// Answer each request line with one response line, in order, until EOF
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        let mut served = 0usize;

        while let Some(line) = lines.next_line().await.context("Failed to read request")? {
            if line.trim().is_empty() {
                continue;
            }

            let response = self.handle(line).await?;
            let mut encoded =
                serde_json::to_string(&response).context("Failed to encode response")?;
            encoded.push('\n');

            writer
                .write_all(encoded.as_bytes())
                .await
                .context("Failed to write response")?;
            writer.flush().await.context("Failed to flush response")?;
            served += 1;
        }

        tracing::info!("Client disconnected after {} requests", served);
        Ok(())
    }

    /// Vault operations block on storage, so they run on the blocking pool
    async fn handle(&self, line: String) -> Result<Response> {
        let vault = self.vault.clone();
        tokio::task::spawn_blocking(move || api::handle_line(&vault, &line))
            .await
            .context("Request handler panicked")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[tokio::test]
    async fn test_serve_answers_each_line_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let app = VaultApp::new(Vault::open(dir.path()).unwrap());

        let input = concat!(
            r#"{"id":1,"op":"write","path":"a.md","content":"hello"}"#,
            "\n\n",
            r#"{"id":2,"op":"read","path":"a.md"}"#,
            "\n",
            r#"{"id":3,"op":"read","path":"../a.md"}"#,
            "\n",
        );
        let mut output = Vec::new();
        app.serve(input.as_bytes(), &mut output).await.unwrap();

        let responses: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[0]["status"], 200);
        assert_eq!(responses[1]["body"]["content"], "hello");
        assert_eq!(responses[2]["status"], 403);
    }
}
