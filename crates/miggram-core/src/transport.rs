use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize};
use tokio::io::AsyncWrite;

use crate::{errors::Error, params::Params, Result};

/// Envelope every API method answers with.
#[derive(Clone, Debug, Deserialize)]
pub struct ApiResponse {
    pub ok: bool,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ApiResponse {
    /// Branch on `ok`: the result payload, or the remote's own diagnostic.
    pub fn into_result(self) -> Result<serde_json::Value> {
        if self.ok {
            return Ok(self.result.unwrap_or(serde_json::Value::Null));
        }
        let description = self
            .description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| match self.error_code {
                Some(code) => format!("request rejected with error code {code}"),
                None => "request rejected without description".to_string(),
            });
        Err(Error::Remote {
            code: self.error_code,
            description,
        })
    }
}

/// Decode a method result into its typed record.
pub fn decode<T: DeserializeOwned>(method: &str, value: serde_json::Value) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| Error::External(format!("unexpected {method} result: {e}")))
}

/// Port for talking to the remote bot API.
///
/// Implementations authenticate every call with the bot token, choose GET or
/// multipart POST from [`Params::is_multipart`], and map failures into
/// [`Error`] instead of panicking.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Invoke `method`; returns the envelope's `result` when `ok` is true.
    async fn call(&self, method: &str, params: Params) -> Result<serde_json::Value>;

    /// Stream the file at `file_path` (from `getFile`) into `out`.
    /// Returns the number of bytes written.
    async fn download(
        &self,
        file_path: &str,
        out: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ok_envelope_yields_result() {
        let env: ApiResponse =
            serde_json::from_value(json!({ "ok": true, "result": [1, 2] })).unwrap();
        assert_eq!(env.into_result().unwrap(), json!([1, 2]));
    }

    #[test]
    fn rejected_envelope_keeps_remote_diagnostic() {
        let env: ApiResponse = serde_json::from_value(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: chat not found"
        }))
        .unwrap();
        match env.into_result() {
            Err(Error::Remote { code, description }) => {
                assert_eq!(code, Some(400));
                assert_eq!(description, "Bad Request: chat not found");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn rejected_envelope_without_description_is_still_described() {
        let env: ApiResponse =
            serde_json::from_value(json!({ "ok": false, "error_code": 409 })).unwrap();
        let err = env.into_result().unwrap_err();
        assert!(err.is_poll_conflict());
        assert!(err.to_string().contains("409"));
    }
}
