//! The field-loader primitive.
//!
//! Loading a record from a raw mapping is an allow-list projection with a
//! tracked complement: every key naming a declared field is moved out of the
//! raw mapping into the typed record, and whatever keys remain afterwards are
//! returned to the caller as [`Residual`]. The loader itself never logs and
//! never fails on unknown keys; the caller decides how to surface them
//! (historically warn-only, to tolerate forward/backward config drift).

use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};
use snafu::{ResultExt, Snafu};

use crate::schema::RecordSchema;

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to load {scope}"))]
    Deserialize {
        scope: String,
        source: serde_yaml::Error,
    },
}

/// Keys of a raw mapping that no loader pass consumed.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Residual(Vec<String>);

impl Residual {
    pub(crate) fn of(raw: &Mapping) -> Self {
        Self(
            raw.keys()
                .map(|key| match key {
                    Value::String(key) => key.clone(),
                    other => crate::schema::value_repr(other),
                })
                .collect(),
        )
    }

    pub fn keys(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Moves every key of `raw` naming a field declared directly on `schema`
/// (base fields are not considered) into a new mapping.
///
/// Explicit nulls are dropped instead of moved: an unset field and a field
/// set to `null` load identically, with the field's declared default.
pub fn split_fields(raw: &mut Mapping, schema: &RecordSchema) -> Mapping {
    let mut recognized = Mapping::new();
    for spec in schema.fields {
        let key = Value::from(spec.name);
        if let Some(value) = raw.remove(&key) {
            if !value.is_null() {
                recognized.insert(key, value);
            }
        }
    }
    recognized
}

/// Loads the fields declared directly on `schema` out of `raw` into a typed
/// record, returning the record together with the keys left unconsumed.
///
/// `scope` names the record in error messages, e.g. `config.network`.
pub fn load_record<T>(scope: &str, schema: &RecordSchema, mut raw: Mapping) -> Result<(T, Residual)>
where
    T: DeserializeOwned,
{
    let recognized = split_fields(&mut raw, schema);
    let record = from_mapping(scope, recognized)?;
    Ok((record, Residual::of(&raw)))
}

/// Deserializes an already-projected mapping into a typed record.
pub fn from_mapping<T>(scope: &str, recognized: Mapping) -> Result<T>
where
    T: DeserializeOwned,
{
    serde_yaml::from_value(Value::Mapping(recognized)).context(DeserializeSnafu { scope })
}

/// Coerces a raw value into a mapping, failing with an error naming `scope`.
pub fn expect_mapping(scope: &str, value: Value) -> Result<Mapping> {
    serde_yaml::from_value(value).context(DeserializeSnafu { scope })
}

/// Coerces a raw value into a sequence, failing with an error naming `scope`.
pub fn expect_sequence(scope: &str, value: Value) -> Result<Vec<Value>> {
    serde_yaml::from_value(value).context(DeserializeSnafu { scope })
}

/// Pops a nested record field out of `raw` and loads it with its own
/// residual-key scope. Absent and null fields load as [`None`].
pub fn take_section<T>(
    raw: &mut Mapping,
    name: &str,
    parent_scope: &str,
    schema: &RecordSchema,
    report: &mut crate::validate::Report,
) -> Result<Option<T>>
where
    T: DeserializeOwned,
{
    let key = Value::from(name);
    let Some(value) = raw.remove(&key) else {
        return Ok(None);
    };
    if value.is_null() {
        return Ok(None);
    }

    let scope = format!("{parent_scope}.{name}");
    let nested = expect_mapping(&scope, value)?;
    let (section, residual) = load_record(&scope, schema, nested)?;
    report.unused_keys(&scope, &residual);
    Ok(Some(section))
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::{
        schema::{FieldKind, RecordSchema, field},
        validate::Report,
    };

    #[derive(Debug, Default, Deserialize, PartialEq, Eq)]
    #[serde(default)]
    struct Sample {
        name: String,
        replicas: u64,
        labels: Vec<String>,
    }

    static SAMPLE: RecordSchema = RecordSchema {
        doc: "",
        base: None,
        fields: &[
            field("name", FieldKind::Str),
            field("replicas", FieldKind::Int),
            field("labels", FieldKind::StrSeq),
        ],
    };

    fn mapping(yaml: &str) -> Mapping {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn known_fields_are_consumed() {
        let raw = mapping("name: web\nreplicas: 3\nlabels: [a]\n");
        let (sample, residual) = load_record::<Sample>("config.sample", &SAMPLE, raw).unwrap();
        assert_eq!(
            sample,
            Sample {
                name: "web".to_owned(),
                replicas: 3,
                labels: vec!["a".to_owned()],
            }
        );
        assert!(residual.is_empty());
    }

    #[test]
    fn missing_fields_take_declared_defaults() {
        let raw = mapping("name: web\n");
        let (sample, _) = load_record::<Sample>("config.sample", &SAMPLE, raw).unwrap();
        assert_eq!(sample.replicas, 0);
        assert!(sample.labels.is_empty());
    }

    #[test]
    fn explicit_null_loads_like_an_absent_field() {
        let raw = mapping("name: web\nreplicas: null\n");
        let (sample, residual) = load_record::<Sample>("config.sample", &SAMPLE, raw).unwrap();
        assert_eq!(sample.replicas, 0);
        assert!(residual.is_empty());
    }

    #[test]
    fn unknown_keys_become_one_warning_naming_the_key() {
        let raw = mapping("name: web\nflavor: spicy\n");
        let (sample, residual) = load_record::<Sample>("config.sample", &SAMPLE, raw).unwrap();
        assert_eq!(sample.name, "web");
        assert_eq!(residual.keys(), ["flavor".to_owned()]);

        let mut report = Report::default();
        report.unused_keys("config.sample", &residual);
        assert_eq!(report.warnings().len(), 1);
        assert!(report.warnings()[0].contains("config.sample"));
        assert!(report.warnings()[0].contains("flavor"));
    }

    #[test]
    fn type_mismatch_is_fatal_and_names_the_scope() {
        let raw = mapping("name: web\nreplicas: [3]\n");
        let error = load_record::<Sample>("config.sample", &SAMPLE, raw).unwrap_err();
        assert!(error.to_string().contains("config.sample"));
    }
}
