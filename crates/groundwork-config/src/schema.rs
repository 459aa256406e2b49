//! Static schema descriptors for configuration records.
//!
//! Every configuration record declares a [`RecordSchema`] listing its field
//! names and kinds. The descriptors drive three independent concerns: the
//! [field loader](crate::loader) (allow-list projection of raw mappings), the
//! structural pre-flight check performed before typed construction, and the
//! [renderer](crate::render) (field order, hidden fields, section comments).

use serde_yaml::{Mapping, Value};

use crate::validate::{Report, Violation};

/// The declared kind of a single configuration field.
///
/// This is deliberately coarse: container kinds are only checked for being
/// the right *kind* of container, their scalar element types are left to the
/// typed deserialization step.
#[derive(Clone, Copy, Debug)]
pub enum FieldKind {
    Bool,
    Int,
    Str,
    /// A sequence of scalar values.
    StrSeq,
    /// A mapping from scalar keys to scalar values.
    StrMap,
    /// A free-form mapping that is carried through without inspection.
    RawMap,
    /// A nested record with its own schema.
    Record(&'static RecordSchema),
    /// A mapping from user-chosen names to records of the given schema.
    RecordMap(&'static RecordSchema),
    /// A sequence of records of the given schema.
    RecordSeq(&'static RecordSchema),
}

impl FieldKind {
    /// The name used in structural error messages.
    fn expected(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Str => "str",
            Self::StrSeq | Self::RecordSeq(_) => "sequence",
            Self::StrMap | Self::RawMap | Self::RecordMap(_) => "mapping",
            Self::Record(_) => "record",
        }
    }
}

/// A single declared field of a configuration record.
#[derive(Clone, Copy, Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,

    /// Hidden fields are omitted from rendered output while they hold an
    /// empty or default value.
    pub hidden: bool,

    /// An extra comment emitted immediately before this field's key when
    /// rendering with comments enabled.
    pub comment: Option<&'static str>,
}

/// Shorthand for a regular, always-rendered field.
pub const fn field(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        hidden: false,
        comment: None,
    }
}

/// Shorthand for a field omitted from rendered output while unset.
pub const fn hidden(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        hidden: true,
        comment: None,
    }
}

/// Shorthand for a field carrying an extra rendered comment.
pub const fn commented(
    name: &'static str,
    kind: FieldKind,
    comment: &'static str,
) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        hidden: false,
        comment: Some(comment),
    }
}

/// The declared shape of one configuration record.
#[derive(Debug)]
pub struct RecordSchema {
    /// Documentation rendered as a comment above the record's key.
    /// An empty string suppresses the comment.
    pub doc: &'static str,

    /// Fields shared with a base record, loaded in a separate pass before
    /// [`Self::fields`].
    pub base: Option<&'static RecordSchema>,

    pub fields: &'static [FieldSpec],
}

impl RecordSchema {
    /// All fields of this record, base fields first.
    pub fn all_fields(&self) -> impl Iterator<Item = &'static FieldSpec> {
        self.base
            .into_iter()
            .flat_map(|base| base.fields.iter())
            .chain(self.fields.iter())
    }
}

/// Walks a raw mapping against a schema descriptor, recording a
/// [`Violation::TypeMismatch`] for every field whose value has the wrong
/// shape. Violations are collected, never raised per field, so one pass
/// reports every mismatch in the document.
///
/// Absent and explicit-null fields are skipped; required fields are enforced
/// later by typed construction. Keys without a declared field are ignored
/// here, the loader reports them as residual warnings.
pub fn check_record(path: &str, schema: &RecordSchema, raw: &Mapping, report: &mut Report) {
    for spec in schema.all_fields() {
        let key = Value::from(spec.name);
        let Some(value) = raw.get(&key) else {
            continue;
        };
        if value.is_null() {
            continue;
        }
        check_field(&format!("{path}.{name}", name = spec.name), spec.kind, value, report);
    }
}

fn check_field(path: &str, kind: FieldKind, value: &Value, report: &mut Report) {
    let matches = match kind {
        FieldKind::Bool => value.is_bool(),
        FieldKind::Int => value.is_i64() || value.is_u64(),
        FieldKind::Str => value.is_string(),
        FieldKind::StrSeq => value.is_sequence(),
        FieldKind::StrMap | FieldKind::RawMap => value.is_mapping(),
        FieldKind::Record(schema) => {
            if let Value::Mapping(mapping) = value {
                check_record(path, schema, mapping, report);
                return;
            }
            false
        }
        FieldKind::RecordMap(schema) => {
            if let Value::Mapping(mapping) = value {
                for (name, entry) in mapping {
                    let path = format!("{path}.{name}", name = key_string(name));
                    check_field(&path, FieldKind::Record(schema), entry, report);
                }
                return;
            }
            false
        }
        FieldKind::RecordSeq(schema) => {
            if let Value::Sequence(entries) = value {
                for (index, entry) in entries.iter().enumerate() {
                    let path = format!("{path}.[{index}]");
                    check_field(&path, FieldKind::Record(schema), entry, report);
                }
                return;
            }
            false
        }
    };

    if !matches {
        report.violation(Violation::TypeMismatch {
            path: path.to_owned(),
            expected: kind.expected(),
            value: value_repr(value),
        });
    }
}

/// Mapping keys are almost always strings; anything else is rendered like a
/// value for error and warning messages.
pub(crate) fn key_string(key: &Value) -> String {
    match key {
        Value::String(key) => key.clone(),
        other => value_repr(other),
    }
}

/// Compact single-line rendering of a raw value for error messages.
pub(crate) fn value_repr(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "<opaque>".to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    static INNER: RecordSchema = RecordSchema {
        doc: "",
        base: None,
        fields: &[field("threshold", FieldKind::Int)],
    };

    static OUTER: RecordSchema = RecordSchema {
        doc: "",
        base: None,
        fields: &[
            field("name", FieldKind::Str),
            field("enabled", FieldKind::Bool),
            field("items", FieldKind::StrSeq),
            field("inner", FieldKind::Record(&INNER)),
            field("groups", FieldKind::RecordMap(&INNER)),
        ],
    };

    fn check(yaml: &str) -> Vec<String> {
        let raw: Mapping = serde_yaml::from_str(yaml).unwrap();
        let mut report = Report::default();
        check_record("config", &OUTER, &raw, &mut report);
        report
            .violations()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn valid_document_has_no_violations() {
        let violations = check(
            "name: test\nenabled: true\nitems: [a, b]\ninner:\n  threshold: 3\n",
        );
        assert!(violations.is_empty());
    }

    #[test]
    fn every_mismatch_is_reported_in_one_pass() {
        let violations = check("name: 42\nenabled: yes-please\nitems: {}\n");
        assert_eq!(violations.len(), 3);
        assert!(violations[0].contains("config.name"));
        assert!(violations[0].contains("(str)"));
        assert!(violations[0].contains("42"));
        assert!(violations[1].contains("config.enabled"));
        assert!(violations[2].contains("config.items"));
    }

    #[test]
    fn nested_records_use_dotted_paths() {
        let violations = check("inner:\n  threshold: high\n");
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("config.inner.threshold"));
    }

    #[test]
    fn record_maps_recurse_into_values() {
        let violations = check("groups:\n  alpha:\n    threshold: [1]\n  beta: 7\n");
        assert_eq!(violations.len(), 2);
        assert!(violations[0].contains("config.groups.alpha.threshold"));
        assert!(violations[1].contains("config.groups.beta"));
    }

    #[test]
    fn null_and_absent_fields_are_skipped() {
        let violations = check("name: null\n");
        assert!(violations.is_empty());
    }
}
