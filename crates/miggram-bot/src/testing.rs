//! In-memory transport fake for unit tests.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use miggram_core::{errors::Error, params::Params, transport::Transport, Result};

/// Scripted responses per method, consumed in order, plus a log of every call.
///
/// An unscripted `getUpdates` returns an empty batch; any other unscripted
/// method fails with a transport error.
#[derive(Default)]
pub struct FakeTransport {
    responses: Mutex<HashMap<String, VecDeque<Result<Value>>>>,
    calls: Mutex<Vec<(String, Params)>>,
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, method: &str, response: Result<Value>) {
        self.responses
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn serve_file(&self, path: &str, bytes: &[u8]) {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), bytes.to_vec());
    }

    pub fn calls(&self) -> Vec<(String, Params)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, method: &str) -> Vec<Params> {
        self.calls()
            .into_iter()
            .filter(|(m, _)| m == method)
            .map(|(_, p)| p)
            .collect()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn call(&self, method: &str, params: Params) -> Result<Value> {
        self.calls
            .lock()
            .unwrap()
            .push((method.to_string(), params));

        let scripted = self
            .responses
            .lock()
            .unwrap()
            .get_mut(method)
            .and_then(VecDeque::pop_front);
        match scripted {
            Some(r) => r,
            None if method == "getUpdates" => Ok(Value::Array(Vec::new())),
            None => Err(Error::Transport(format!("{method}: no scripted response"))),
        }
    }

    async fn download(
        &self,
        file_path: &str,
        out: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64> {
        let bytes = self.files.lock().unwrap().get(file_path).cloned();
        let Some(bytes) = bytes else {
            return Err(Error::remote(Some(404), "Not Found"));
        };
        out.write_all(&bytes).await?;
        Ok(bytes.len() as u64)
    }
}
