//! Emitted files keyed by output name.
//!
//! Serializes with the bundler's field names so a bundle dumped by the build
//! pipeline can be read back as-is.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use sourcemap::SourceMap;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bundle {
    pub files: BTreeMap<String, EmittedFile>,
}

impl Bundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, file: EmittedFile) -> Option<EmittedFile> {
        self.files.insert(key.into(), file)
    }

    pub fn get(&self, key: &str) -> Option<&EmittedFile> {
        self.files.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.files.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| Error::validation_invalid_json(e, Some("parse bundle".to_string())))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::internal_json(e.to_string(), Some("serialize bundle".to_string())))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmittedFile {
    /// Source module the file was generated from.
    #[serde(
        rename = "facadeModuleId",
        alias = "facadeIdentifier",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub facade_id: Option<String>,
    #[serde(alias = "outputName")]
    pub file_name: String,
    #[serde(default, alias = "importedNames")]
    pub imports: Vec<String>,
    /// Absent for assets; those are renamed but never parsed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, with = "map_json", skip_serializing_if = "Option::is_none")]
    pub map: Option<SourceMap>,
}

impl EmittedFile {
    pub fn chunk(file_name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            code: Some(code.into()),
            ..Self::default()
        }
    }

    pub fn asset(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            ..Self::default()
        }
    }

    pub fn with_facade(mut self, facade_id: impl Into<String>) -> Self {
        self.facade_id = Some(facade_id.into());
        self
    }

    pub fn with_imports<I, S>(mut self, imports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.imports = imports.into_iter().map(Into::into).collect();
        self
    }
}

/// Source maps travel as JSON objects (or JSON strings holding one).
mod map_json {
    use serde::{de, ser, Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::Value;
    use sourcemap::SourceMap;

    pub fn serialize<S: Serializer>(map: &Option<SourceMap>, serializer: S) -> Result<S::Ok, S::Error> {
        let Some(map) = map else {
            return serializer.serialize_none();
        };

        let mut buf = Vec::new();
        map.to_writer(&mut buf).map_err(ser::Error::custom)?;
        let value: Value = serde_json::from_slice(&buf).map_err(ser::Error::custom)?;
        Some(value).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<SourceMap>, D::Error> {
        let bytes = match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::String(raw)) => raw.into_bytes(),
            Some(value) => serde_json::to_vec(&value).map_err(de::Error::custom)?,
        };

        SourceMap::from_slice(&bytes).map(Some).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUNDLE: &str = r#"{
        "index.js": {
            "facadeModuleId": "/src/index.js",
            "fileName": "index.js",
            "imports": ["dep.js"],
            "code": "import './dep.js';\n",
            "map": {"version": 3, "sources": ["index.js"], "names": [], "mappings": "AAAA"}
        },
        "logo.svg": {
            "fileName": "logo.svg"
        }
    }"#;

    #[test]
    fn reads_bundler_field_names() {
        let bundle = Bundle::from_json(BUNDLE).unwrap();
        assert_eq!(bundle.len(), 2);

        let index = bundle.get("index.js").unwrap();
        assert_eq!(index.facade_id.as_deref(), Some("/src/index.js"));
        assert_eq!(index.imports, vec!["dep.js".to_string()]);
        assert_eq!(index.map.as_ref().unwrap().get_source(0), Some("index.js"));

        let logo = bundle.get("logo.svg").unwrap();
        assert!(logo.code.is_none());
        assert!(logo.imports.is_empty());
    }

    #[test]
    fn accepts_descriptive_aliases() {
        let bundle = Bundle::from_json(
            r#"{"a.js": {"facadeIdentifier": "a", "outputName": "a.js", "importedNames": ["b.js"]}}"#,
        )
        .unwrap();
        let file = bundle.get("a.js").unwrap();
        assert_eq!(file.file_name, "a.js");
        assert_eq!(file.imports.len(), 1);
    }

    #[test]
    fn map_survives_serialization() {
        let bundle = Bundle::from_json(BUNDLE).unwrap();
        let json = bundle.to_json_pretty().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["index.js"]["map"]["version"], 3);
        assert!(value["logo.svg"].get("map").is_none());
        assert!(value["logo.svg"].get("code").is_none());
    }

    #[test]
    fn map_may_be_a_json_string() {
        let bundle = Bundle::from_json(
            r#"{"a.js": {"fileName": "a.js", "map": "{\"version\":3,\"sources\":[\"a.js\"],\"names\":[],\"mappings\":\"\"}"}}"#,
        )
        .unwrap();
        assert!(bundle.get("a.js").unwrap().map.is_some());
    }

    #[test]
    fn invalid_bundle_is_validation_error() {
        let err = Bundle::from_json("[1, 2]").unwrap_err();
        assert_eq!(err.code.as_str(), "validation.invalid_json");
    }
}
