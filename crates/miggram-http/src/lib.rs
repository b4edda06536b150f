//! HTTPS transport adapter (reqwest).
//!
//! Implements the `miggram-core` [`Transport`] port: GET with a query string
//! for scalar calls, multipart POST for binary uploads, streamed file download.

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    StatusCode,
};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use miggram_core::{
    config::Config,
    errors::Error,
    params::{ParamValue, Params},
    transport::{ApiResponse, Transport},
    Result,
};

/// Upper bound on how much of an undecodable body is quoted in errors.
const BODY_PREVIEW_CHARS: usize = 200;

#[derive(Clone, Debug)]
pub struct HttpTransport {
    cfg: Config,
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new(cfg: Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(cfg.request_timeout)
            .build()
            .map_err(|e| Error::Config(format!("http client build failed: {e}")))?;
        Ok(Self { cfg, http })
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// The request URL carries the bot token, so it is stripped before the
    /// error is rendered.
    fn map_err(method: &str, e: reqwest::Error) -> Error {
        let e = e.without_url();
        if e.is_timeout() {
            Error::Timeout(format!("{method}: {e}"))
        } else {
            Error::Transport(format!("{method}: {e}"))
        }
    }

    fn form(params: &Params) -> Form {
        let mut form = Form::new();
        for (name, value) in params.iter() {
            form = match value {
                ParamValue::File(file) => {
                    let mut part = Part::bytes(file.bytes.clone());
                    if let Some(file_name) = &file.file_name {
                        part = part.file_name(file_name.clone());
                    }
                    form.part(name.to_string(), part)
                }
                other => match other.as_field() {
                    Some(text) => form.text(name.to_string(), text),
                    None => form,
                },
            };
        }
        form
    }
}

/// Decode the response envelope regardless of HTTP status: the API reports
/// structured errors under 4xx/5xx as well as 2xx.
pub fn decode_envelope(method: &str, status: StatusCode, body: &[u8]) -> Result<serde_json::Value> {
    match serde_json::from_slice::<ApiResponse>(body) {
        Ok(envelope) => envelope.into_result(),
        Err(e) => {
            let preview: String = String::from_utf8_lossy(body)
                .chars()
                .take(BODY_PREVIEW_CHARS)
                .collect();
            if status.is_success() {
                Err(Error::Transport(format!(
                    "{method}: undecodable response: {e}: {preview}"
                )))
            } else {
                Err(Error::Transport(format!("{method}: HTTP {status}: {preview}")))
            }
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(&self, method: &str, params: Params) -> Result<serde_json::Value> {
        let url = self.cfg.method_url(method);

        let request = if params.is_multipart() {
            self.http.post(&url).multipart(Self::form(&params))
        } else {
            self.http.get(&url).query(&params.query_pairs())
        };

        let resp = request
            .send()
            .await
            .map_err(|e| Self::map_err(method, e))?;
        let status = resp.status();
        let body = resp.bytes().await.map_err(|e| Self::map_err(method, e))?;

        let result = decode_envelope(method, status, &body);
        if let Err(e) = &result {
            tracing::debug!(method, %status, error = %e, "api call failed");
        }
        result
    }

    async fn download(
        &self,
        file_path: &str,
        out: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64> {
        let url = self.cfg.file_url(file_path);
        let mut resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Self::map_err("download", e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.bytes().await.unwrap_or_default();
            return match decode_envelope("download", status, &body) {
                Err(e) => Err(e),
                Ok(_) => Err(Error::Transport(format!("download: HTTP {status}"))),
            };
        }

        let mut written = 0u64;
        while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|e| Self::map_err("download", e))?
        {
            out.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        out.flush().await?;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_is_read_even_on_error_status() {
        let body = br#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#;
        let err = decode_envelope("sendMessage", StatusCode::BAD_REQUEST, body).unwrap_err();
        assert_eq!(err.remote_code(), Some(400));
    }

    #[test]
    fn non_json_error_body_is_a_transport_error() {
        let err =
            decode_envelope("getMe", StatusCode::BAD_GATEWAY, b"<html>502</html>").unwrap_err();
        match err {
            Error::Transport(s) => {
                assert!(s.contains("502"));
                assert!(s.contains("<html>"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn ok_body_yields_result() {
        let body = br#"{"ok":true,"result":{"id":1}}"#;
        let v = decode_envelope("getMe", StatusCode::OK, body).unwrap();
        assert_eq!(v["id"], 1);
    }

    #[test]
    fn debug_output_hides_the_token() {
        let t = HttpTransport::new(Config::new("123456:SECRETTOKEN")).unwrap();
        assert!(!format!("{t:?}").contains("SECRETTOKEN"));
    }
}
