//! Supervisord XML-RPC client
//!
//! Speaks just enough XML-RPC to call `getProcessInfo`, `startProcess` and
//! `stopProcess` for a single process and read back the `statename` member or
//! the fault code.

use super::traits::{SupervisorClient, SupervisorError};
use async_trait::async_trait;
use bridge_shared::{defaults, ProcessState};
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::debug;

/// Supervisord fault codes the bridge cares about
mod fault {
    pub const BAD_NAME: i32 = 10;
    pub const ALREADY_STARTED: i32 = 60;
    pub const NOT_RUNNING: i32 = 70;
}

/// Configuration for the supervisord connection
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// XML-RPC endpoint
    pub url: String,
    /// Name of the supervised program
    pub process: String,
    /// HTTP request timeout
    pub request_timeout: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            url: defaults::SUPERVISOR_URL.into(),
            process: "vstream".into(),
            request_timeout: Duration::from_millis(defaults::CALL_TIMEOUT_MS),
        }
    }
}

/// [`SupervisorClient`] backed by supervisord's XML-RPC interface
pub struct SupervisordClient {
    config: SupervisorConfig,
    http: reqwest::Client,
}

impl SupervisordClient {
    pub fn new(config: SupervisorConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { config, http })
    }

    /// Invoke `method` with the process name as its only argument and return
    /// the raw response body, mapping faults to errors
    async fn call(&self, method: &str) -> Result<String, SupervisorError> {
        debug!("[SUPERVISOR] {}({})", method, self.config.process);

        let response = self
            .http
            .post(&self.config.url)
            .header(CONTENT_TYPE, "text/xml")
            .body(method_call(method, &self.config.process))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SupervisorError::Unreachable(format!(
                "HTTP {} from {}",
                status, self.config.url
            )));
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if let Some((code, message)) = parse_fault(&body) {
            return Err(match code {
                fault::BAD_NAME => SupervisorError::UnknownProcess(self.config.process.clone()),
                _ => SupervisorError::Fault { code, message },
            });
        }

        Ok(body)
    }

    fn transport_error(&self, e: reqwest::Error) -> SupervisorError {
        if e.is_timeout() {
            SupervisorError::Timeout(self.config.request_timeout)
        } else {
            SupervisorError::Unreachable(e.to_string())
        }
    }
}

#[async_trait]
impl SupervisorClient for SupervisordClient {
    async fn status(&self) -> Result<ProcessState, SupervisorError> {
        let body = self.call("supervisor.getProcessInfo").await?;
        member_value(&body, "statename")
            .map(|name| ProcessState::from_supervisor(&name))
            .ok_or_else(|| SupervisorError::Malformed("missing statename".into()))
    }

    async fn start(&self) -> Result<(), SupervisorError> {
        match self.call("supervisor.startProcess").await {
            Ok(_) => Ok(()),
            Err(SupervisorError::Fault { code: fault::ALREADY_STARTED, .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn stop(&self) -> Result<(), SupervisorError> {
        match self.call("supervisor.stopProcess").await {
            Ok(_) => Ok(()),
            Err(SupervisorError::Fault { code: fault::NOT_RUNNING, .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Build a `methodCall` body with a single string parameter
fn method_call(method: &str, arg: &str) -> String {
    format!(
        "<?xml version=\"1.0\"?>\
         <methodCall><methodName>{}</methodName>\
         <params><param><value><string>{}</string></value></param></params>\
         </methodCall>",
        method,
        escape(arg)
    )
}

/// Extract `(faultCode, faultString)` from a fault response
fn parse_fault(body: &str) -> Option<(i32, String)> {
    if !body.contains("<fault>") {
        return None;
    }
    let code = member_value(body, "faultCode")
        .and_then(|c| c.trim().parse().ok())
        .unwrap_or(0);
    let message = member_value(body, "faultString").unwrap_or_default();
    Some((code, message))
}

/// Scalar value of the first struct member called `name`
fn member_value(body: &str, name: &str) -> Option<String> {
    let marker = format!("<name>{}</name>", name);
    let after_name = &body[body.find(&marker)? + marker.len()..];

    let value_start = after_name.find("<value>")? + "<value>".len();
    let value_len = after_name[value_start..].find("</value>")?;
    let inner = after_name[value_start..value_start + value_len].trim();

    // Untyped values are strings; otherwise unwrap one type element
    let scalar = match inner.strip_prefix('<') {
        Some(rest) => {
            let open_end = rest.find('>')?;
            let tag = &rest[..open_end];
            if tag.ends_with('/') {
                ""
            } else {
                let content = &rest[open_end + 1..];
                let close = content.find(&format!("</{}>", tag))?;
                &content[..close]
            }
        }
        None => inner,
    };

    Some(unescape(scalar))
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn unescape(raw: &str) -> String {
    raw.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
