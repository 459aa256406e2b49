//! Object storage buckets provisioned for the deployment.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::{
    loader::{self, Residual},
    schema::{FieldKind, RecordSchema, field, hidden},
    validate::Report,
};

const SCOPE: &str = "config.storage";

static BUCKET_SCHEMA: RecordSchema = RecordSchema {
    doc: "",
    base: None,
    fields: &[
        field("auto_delete_objects", FieldKind::Bool),
        field("removal_policy_destroy", FieldKind::Bool),
        hidden("sse_kms_key_id", FieldKind::Str),
    ],
};

pub(crate) static SCHEMA: RecordSchema = RecordSchema {
    doc: "\
Storage buckets, keyed by short name. Bucket names are prefixed with the
deployment name on provisioning. Objects are encrypted at rest, either with
the per-bucket KMS key or the provider-managed default.",
    base: None,
    fields: &[field("buckets", FieldKind::RecordMap(&BUCKET_SCHEMA))],
};

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(default)]
pub struct BucketConfig {
    pub auto_delete_objects: bool,
    pub removal_policy_destroy: bool,
    pub sse_kms_key_id: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    #[serde(skip_deserializing)]
    pub buckets: BTreeMap<String, BucketConfig>,
}

impl StorageConfig {
    pub fn from_0_0_0(raw: Mapping) -> Result<Self, super::Error> {
        super::load_standalone(SCOPE, &SCHEMA, raw, Report::default(), |raw, report| {
            Self::load(SCOPE, raw, report)
        })
    }

    pub(crate) fn load(
        scope: &str,
        mut raw: Mapping,
        report: &mut Report,
    ) -> Result<Self, loader::Error> {
        let mut buckets = BTreeMap::new();
        if let Some(value) = raw.remove(&Value::from("buckets")) {
            if !value.is_null() {
                let entries = loader::expect_mapping(&format!("{scope}.buckets"), value)?;
                for (name, bucket_raw) in entries {
                    let name = crate::schema::key_string(&name);
                    let bucket_scope = format!("{scope}.buckets.{name}");
                    let bucket_raw = loader::expect_mapping(&bucket_scope, bucket_raw)?;
                    let (bucket, residual): (BucketConfig, Residual) =
                        loader::load_record(&bucket_scope, &BUCKET_SCHEMA, bucket_raw)?;
                    report.unused_keys(&bucket_scope, &residual);
                    buckets.insert(name, bucket);
                }
            }
        }

        let (mut storage, residual): (Self, Residual) = loader::load_record(scope, &SCHEMA, raw)?;
        report.unused_keys(scope, &residual);
        storage.buckets = buckets;
        Ok(storage)
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn omitted_buckets_load_as_an_empty_map() {
        let storage = StorageConfig::from_0_0_0(Mapping::new()).unwrap();
        assert!(storage.buckets.is_empty());
    }

    #[test]
    fn buckets_load_with_per_bucket_scopes() {
        let raw = serde_yaml::from_str(indoc! {"
            buckets:
              blobs:
                removal_policy_destroy: true
              logs:
                sse_kms_key_id: arn:aws:kms:us-east-1:123456789012:key/abc
                color: mauve
        "})
        .unwrap();

        let mut report = Report::default();
        let storage = StorageConfig::load(SCOPE, raw, &mut report).unwrap();

        assert_eq!(storage.buckets.len(), 2);
        assert!(storage.buckets["blobs"].removal_policy_destroy);
        assert!(storage.buckets["logs"].sse_kms_key_id.is_some());
        assert_eq!(report.warnings().len(), 1);
        assert!(report.warnings()[0].contains("config.storage.buckets.logs"));
        assert!(report.warnings()[0].contains("color"));
    }
}
