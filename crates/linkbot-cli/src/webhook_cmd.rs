//! `linkbot webhook --file <json>` — feed one inbound payload to the dispatcher.
//!
//! Prints the JSON answer a webhook endpoint would return. Exits non-zero
//! only when the binding store failed.

use std::io::Read;

use anyhow::{bail, Context, Result};
use serde_json::Value;
use tracing::warn;

use linkbot_hub::{Disposition, Notice};
use linkbot_line::WebhookBody;

use crate::context::AppContext;
use crate::helpers::print_json;

pub async fn run(file: &str, token: Option<&str>) -> Result<()> {
    let raw = read_payload(file)?;
    let value: Value = serde_json::from_str(&raw).context("webhook payload is not valid JSON")?;
    let body = WebhookBody::from_value(&value);

    let ctx = AppContext::load().await?;
    let report = ctx.dispatcher()?.dispatch(&body, token).await;

    print_json(&report.response());
    if let Notice::Failed { reason } = &report.notice {
        warn!(reason = %reason, "notice was not delivered");
    }

    if report.disposition() == Disposition::HardFailure {
        bail!("webhook dispatch failed");
    }
    Ok(())
}

fn read_payload(file: &str) -> Result<String> {
    if file == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read payload from stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(file).with_context(|| format!("failed to read {file}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_payload_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("event.json");
        std::fs::write(&path, r#"{"events": []}"#).unwrap();

        let raw = read_payload(path.to_str().unwrap()).unwrap();
        assert_eq!(raw, r#"{"events": []}"#);
    }

    #[test]
    fn missing_payload_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        assert!(read_payload(path.to_str().unwrap()).is_err());
    }
}
