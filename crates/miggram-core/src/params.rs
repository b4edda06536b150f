//! Request parameters for one API call.

use serde::Serialize;

use crate::Result;

/// A binary multipart part.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilePart {
    pub bytes: Vec<u8>,
    pub file_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
    Text(String),
    /// Structured value; encoded as its compact JSON string.
    Json(serde_json::Value),
    File(FilePart),
}

impl ParamValue {
    /// String form used for query strings and plain form fields.
    ///
    /// Returns `None` for file parts, which only travel as multipart.
    pub fn as_field(&self) -> Option<String> {
        match self {
            ParamValue::Text(s) => Some(s.clone()),
            ParamValue::Json(v) => Some(v.to_string()),
            ParamValue::File(_) => None,
        }
    }
}

/// Something that is either already on the platform (file id / URL) or raw
/// bytes to upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputFile {
    Reference(String),
    Bytes {
        bytes: Vec<u8>,
        file_name: Option<String>,
    },
}

impl InputFile {
    pub fn reference(id_or_url: impl Into<String>) -> Self {
        InputFile::Reference(id_or_url.into())
    }

    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        InputFile::Bytes {
            bytes: bytes.into(),
            file_name: None,
        }
    }

    pub fn named(bytes: impl Into<Vec<u8>>, file_name: impl Into<String>) -> Self {
        InputFile::Bytes {
            bytes: bytes.into(),
            file_name: Some(file_name.into()),
        }
    }
}

/// Ordered parameter list for a single call.
///
/// A call whose params carry a file part (or that is marked multipart) is
/// sent as a multipart POST; anything else goes as a GET with a query string.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Params {
    entries: Vec<(String, ParamValue)>,
    multipart: bool,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force multipart encoding even without a file part.
    pub fn multipart(mut self) -> Self {
        self.multipart = true;
        self
    }

    pub fn text(mut self, name: &str, value: impl ToString) -> Self {
        self.set(name, ParamValue::Text(value.to_string()));
        self
    }

    pub fn opt_text<T: ToString>(self, name: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.text(name, v),
            None => self,
        }
    }

    pub fn json<T: Serialize + ?Sized>(mut self, name: &str, value: &T) -> Result<Self> {
        let v = serde_json::to_value(value)?;
        self.set(name, ParamValue::Json(v));
        Ok(self)
    }

    pub fn opt_json<T: Serialize>(self, name: &str, value: Option<&T>) -> Result<Self> {
        match value {
            Some(v) => self.json(name, v),
            None => Ok(self),
        }
    }

    pub fn file(mut self, name: &str, bytes: Vec<u8>, file_name: Option<String>) -> Self {
        self.set(name, ParamValue::File(FilePart { bytes, file_name }));
        self
    }

    /// Reference → text field, bytes → file part.
    pub fn input_file(self, name: &str, file: InputFile) -> Self {
        match file {
            InputFile::Reference(r) => self.text(name, r),
            InputFile::Bytes { bytes, file_name } => self.file(name, bytes, file_name),
        }
    }

    /// Later values replace earlier ones under the same name, keeping the
    /// original position.
    fn set(&mut self, name: &str, value: ParamValue) {
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| n == name) {
            slot.1 = value;
        } else {
            self.entries.push((name.to_string(), value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_files(&self) -> bool {
        self.entries
            .iter()
            .any(|(_, v)| matches!(v, ParamValue::File(_)))
    }

    pub fn is_multipart(&self) -> bool {
        self.multipart || self.has_files()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Scalar `(name, value)` pairs, with structured values flattened to JSON.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .filter_map(|(n, v)| v.as_field().map(|s| (n.clone(), s)))
            .collect()
    }
}
