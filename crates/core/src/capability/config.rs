//! Serde model of the transform service configuration document.
//!
//! Only the parts needed for discovery are modelled strictly. Everything is
//! optional and unknown fields are ignored, so newer service versions that
//! add fields keep parsing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root of `GET /transform/config`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformCoreConfig {
    /// Option groups keyed by name (e.g. `pdfRendererOptions`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform_options: Option<BTreeMap<String, Vec<TransformOptionEntry>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transformers: Option<Vec<Transformer>>,
}

/// A single transformer engine and the conversions it supports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transformer {
    #[serde(default)]
    pub transformer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_version: Option<String>,
    /// Names of the option groups this transformer accepts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform_options: Option<Vec<String>>,
    #[serde(default)]
    pub supported_source_and_target_list: Option<Vec<SupportedSourceAndTarget>>,
}

impl Transformer {
    /// Name for logging; transformers without a name are reported as `<unnamed>`.
    pub fn display_name(&self) -> &str {
        self.transformer_name.as_deref().unwrap_or("<unnamed>")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportedSourceAndTarget {
    #[serde(default)]
    pub source_media_type: Option<String>,
    #[serde(default)]
    pub target_media_type: Option<String>,
    /// -1 or absent means unlimited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_source_size_bytes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
}

/// Either a single option or a nested group of options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformOptionEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<OptionDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<OptionGroup>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionDescriptor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionGroup {
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub transform_options: Vec<TransformOptionEntry>,
}
