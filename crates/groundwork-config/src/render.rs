//! Canonical YAML rendering.
//!
//! The renderer is a pure function from a validated document to annotated
//! YAML text. Field order follows the declared schema, not the serialized
//! mapping, so output is deterministic. Hidden fields are omitted while they
//! hold an empty or default value; null values are never emitted, which
//! makes the output re-loadable into an equal document. Scalar quoting is
//! delegated to `serde_yaml`, so strings like `"1.27"` survive the round
//! trip as strings.

use serde_yaml::{Mapping, Value};
use snafu::{ResultExt, Snafu};

use crate::{
    document::{ConfigDocument, DOCUMENT_SCHEMA},
    schema::{FieldKind, RecordSchema},
};

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to serialize configuration document"))]
    Serialize { source: serde_yaml::Error },
}

/// Renders a document to canonical YAML. With comments enabled, each
/// section's documentation string precedes its key at the matching indent,
/// and the node group base description precedes the managed node group map.
pub fn render(document: &ConfigDocument, disable_comments: bool) -> Result<String> {
    let value = serde_yaml::to_value(document).context(SerializeSnafu)?;

    let mut emitter = Emitter {
        out: String::from("---\n"),
        comments: !disable_comments,
    };
    if let Value::Mapping(root) = &value {
        emitter.record(&DOCUMENT_SCHEMA, root, 0)?;
    }
    Ok(emitter.out)
}

struct Emitter {
    out: String,
    comments: bool,
}

impl Emitter {
    fn record(&mut self, schema: &RecordSchema, raw: &Mapping, indent: usize) -> Result<()> {
        for spec in schema.all_fields() {
            let Some(value) = raw.get(&Value::from(spec.name)) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            if spec.hidden && !truthy(value) {
                continue;
            }

            if self.comments {
                if let Some(comment) = spec.comment {
                    self.comment(comment, indent);
                }
                if let FieldKind::Record(sub) = spec.kind {
                    if !sub.doc.is_empty() {
                        self.comment(sub.doc, indent);
                    }
                }
            }
            self.field(spec.name, spec.kind, value, indent)?;
        }
        Ok(())
    }

    fn field(&mut self, name: &str, kind: FieldKind, value: &Value, indent: usize) -> Result<()> {
        let pad = " ".repeat(indent);
        match (kind, value) {
            (FieldKind::Record(sub), Value::Mapping(entry)) => {
                self.out.push_str(&format!("{pad}{name}:\n"));
                self.record(sub, entry, indent + 2)?;
            }
            (FieldKind::RecordMap(sub), Value::Mapping(entries)) => {
                if entries.is_empty() {
                    self.out.push_str(&format!("{pad}{name}: {{}}\n"));
                    return Ok(());
                }
                self.out.push_str(&format!("{pad}{name}:\n"));
                for (key, entry) in entries {
                    let key = scalar(key)?;
                    self.out.push_str(&format!("{pad}  {key}:\n"));
                    if let Value::Mapping(entry) = entry {
                        self.record(sub, entry, indent + 4)?;
                    }
                }
            }
            (FieldKind::RecordSeq(sub), Value::Sequence(entries)) => {
                if entries.is_empty() {
                    self.out.push_str(&format!("{pad}{name}: []\n"));
                    return Ok(());
                }
                self.out.push_str(&format!("{pad}{name}:\n"));
                for entry in entries {
                    let Value::Mapping(entry) = entry else {
                        continue;
                    };
                    let mut nested = Emitter {
                        out: String::new(),
                        comments: false,
                    };
                    nested.record(sub, entry, 0)?;
                    for (i, line) in nested.out.lines().enumerate() {
                        let dash = if i == 0 { "- " } else { "  " };
                        self.out.push_str(&format!("{pad}{dash}{line}\n"));
                    }
                }
            }
            (_, Value::Sequence(entries)) if entries.is_empty() => {
                self.out.push_str(&format!("{pad}{name}: []\n"));
            }
            (_, Value::Mapping(entries)) if entries.is_empty() => {
                self.out.push_str(&format!("{pad}{name}: {{}}\n"));
            }
            (_, Value::Sequence(_) | Value::Mapping(_)) => {
                self.out.push_str(&format!("{pad}{name}:\n"));
                for line in block(value)?.lines() {
                    self.out.push_str(&format!("{pad}  {line}\n"));
                }
            }
            _ => {
                let text = block(value)?;
                let mut lines = text.lines();
                let first = lines.next().unwrap_or_default();
                self.out.push_str(&format!("{pad}{name}: {first}\n"));
                // Multi-line scalars come back as a block literal whose body
                // is indented two spaces relative to the document root; the
                // key's own indent re-anchors it.
                for line in lines {
                    self.out.push_str(&format!("{pad}{line}\n"));
                }
            }
        }
        Ok(())
    }

    fn comment(&mut self, text: &str, indent: usize) {
        let pad = " ".repeat(indent);
        for line in text.lines() {
            if line.is_empty() {
                self.out.push_str(&format!("{pad}#\n"));
            } else {
                self.out.push_str(&format!("{pad}# {line}\n"));
            }
        }
    }
}

/// One scalar, quoted the way `serde_yaml` would quote it.
fn scalar(value: &Value) -> Result<String> {
    Ok(block(value)?.trim_end().to_owned())
}

fn block(value: &Value) -> Result<String> {
    serde_yaml::to_string(value).context(SerializeSnafu)
}

/// Mirrors the hide-unless-set policy: hidden fields stay out of the output
/// while they hold an empty or zero value.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Sequence(s) => !s.is_empty(),
        Value::Mapping(m) => !m.is_empty(),
        Value::Tagged(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ConfigDocument;

    fn template_yaml(disable_comments: bool) -> String {
        render(&ConfigDocument::template(), disable_comments).unwrap()
    }

    #[test]
    fn output_starts_with_a_document_marker() {
        assert!(template_yaml(true).starts_with("---\n"));
    }

    #[test]
    fn comments_are_attached_above_section_keys() {
        let text = template_yaml(false);
        let lines: Vec<_> = text.lines().collect();
        let network = lines.iter().position(|l| *l == "network:").unwrap();
        assert!(lines[network - 1].starts_with("# "));

        // The node group base description sits right before the managed map.
        let managed = lines
            .iter()
            .position(|l| *l == "  managed_nodegroups:")
            .unwrap();
        assert!(lines[managed - 1].starts_with("  # "));
        assert!(text.contains("# Node groups scale sets of worker machines."));
    }

    #[test]
    fn disabling_comments_strips_every_comment() {
        let text = template_yaml(true);
        assert!(!text.lines().any(|line| line.trim_start().starts_with('#')));
    }

    #[test]
    fn hidden_fields_are_omitted_while_unset() {
        let text = template_yaml(true);
        assert!(!text.contains("secrets_encryption_key_arn"));
        assert!(!text.contains("registry_password"));

        let mut document = ConfigDocument::template();
        document.cluster.secrets_encryption_key_arn = Some("test_arn".to_owned());
        let text = render(&document, true).unwrap();
        assert!(text.contains("secrets_encryption_key_arn: test_arn"));
    }

    #[test]
    fn version_strings_stay_quoted() {
        let text = template_yaml(true);
        assert!(text.contains("version: '1.27'"));
    }

    #[test]
    fn multi_line_user_data_renders_as_a_block() {
        let mut document = ConfigDocument::template();
        let group = document
            .cluster
            .managed_nodegroups
            .get_mut("compute")
            .unwrap();
        group.base.machine_image = Some(crate::sections::MachineImage {
            ami_id: "ami-1234abcd".to_owned(),
            user_data: Some("#!/bin/sh\necho hello".to_owned()),
        });
        group.base.ssm_agent = false;

        let text = render(&document, true).unwrap();
        let value: Value = serde_yaml::from_str(&text).unwrap();
        let user_data = &value["cluster"]["managed_nodegroups"]["compute"]["machine_image"]
            ["user_data"];
        assert_eq!(user_data.as_str(), Some("#!/bin/sh\necho hello"));
    }

    #[test]
    fn rendered_tags_never_contain_the_deploy_id() {
        let mut document = ConfigDocument::template();
        document.name = "groundwork-test".to_owned();
        document
            .tags
            .insert("team".to_owned(), "platform".to_owned());

        let text = render(&document, true).unwrap();
        assert!(text.contains("team: platform"));
        assert!(!text.contains(crate::document::DEPLOY_ID_TAG));
    }
}
