use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::export::error::ConversionFailure;
use crate::export::naming::{base_name, remote_key};

/// Fixed AI disclaimer appended verbatim to every generated document.
/// Omitting it from an export is a defect.
pub const DISCLAIMER_TEXT: &str = "⚠️ Disclaimer: This document was generated using artificial intelligence (AI). It is not legal advice and must be reviewed and approved by a licensed attorney before being used for any legal purpose. Submitting AI-generated documents directly to a court may result in sanctions. Paths Apart LLC assumes no responsibility for the content, interpretations, or outcomes resulting from this document. This document is for informational purposes only and intended solely to assist in seeking legal representation.";

/// 保持插入顺序的接案字段表。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeFields(Vec<(String, String)>);

impl IntakeFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.0.push((key.into(), value.into()));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn client_name(&self) -> &str {
        self.get("name").unwrap_or("anonymous")
    }

    pub fn case_type(&self) -> &str {
        self.get("case_type").unwrap_or("general")
    }

    pub fn client_email(&self) -> Option<&str> {
        self.get("email")
    }

    /// JSON object view for webhook payloads. Receivers key by name, so the
    /// insertion order guarantee is not carried through here.
    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .0
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();
        serde_json::Value::Object(map)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for IntakeFields {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// 渲染器消费的文档块序列。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocBlock {
    Heading(String),
    Paragraph(String),
    Divider,
    /// Always the final block of a composed intake document.
    Disclaimer(String),
}

/// The assembled document plus its two storage destinations. Immutable after
/// upload; corrections produce a new artifact, never mutate a prior one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntakeArtifact {
    pub base_name: String,
    pub docx_path: PathBuf,
    pub pdf_path: PathBuf,
    pub remote_docx: String,
    pub remote_pdf: String,
    pub bucket: String,
}

impl IntakeArtifact {
    /// Compute paths and remote keys for one intake request.
    pub fn plan(fields: &IntakeFields, at: DateTime<Utc>, bucket: &str, out_dir: &Path) -> Self {
        let base = base_name(fields.client_name(), fields.case_type(), at);
        Self {
            docx_path: out_dir.join(format!("{base}.docx")),
            pdf_path: out_dir.join(format!("{base}.pdf")),
            remote_docx: remote_key(fields.case_type(), &base, "docx"),
            remote_pdf: remote_key(fields.case_type(), &base, "pdf"),
            bucket: bucket.to_string(),
            base_name: base,
        }
    }
}

/// 一次导出的最终产出；非致命失败在此报告而非抛出。
#[derive(Debug, Clone)]
pub struct ExportOutcome {
    pub artifact: IntakeArtifact,
    pub conversion_failure: Option<ConversionFailure>,
    pub pdf_uploaded: bool,
    pub notified: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn fields_preserve_insertion_order() {
        let fields: IntakeFields = vec![("zeta", "1"), ("alpha", "2"), ("mid", "3")]
            .into_iter()
            .collect();

        let keys: Vec<&str> = fields.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
        assert_eq!(fields.get("alpha"), Some("2"));
    }

    #[test]
    fn missing_identity_fields_fall_back_to_defaults() {
        let fields = IntakeFields::new();
        assert_eq!(fields.client_name(), "anonymous");
        assert_eq!(fields.case_type(), "general");
        assert_eq!(fields.client_email(), None);
    }

    #[test]
    fn artifact_plan_derives_paths_and_keys() {
        let fields: IntakeFields = vec![("name", "Jane Doe"), ("case_type", "Divorce")]
            .into_iter()
            .collect();
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 0).unwrap();

        let artifact = IntakeArtifact::plan(&fields, at, "intake-bucket", Path::new("/tmp"));

        assert_eq!(artifact.base_name, "jane_doe_divorce_20240102-0304");
        assert_eq!(
            artifact.docx_path,
            PathBuf::from("/tmp/jane_doe_divorce_20240102-0304.docx")
        );
        assert_eq!(
            artifact.remote_pdf,
            "intakes/divorce/jane_doe_divorce_20240102-0304.pdf"
        );
        assert_eq!(artifact.bucket, "intake-bucket");
    }
}
