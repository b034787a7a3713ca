// SPDX-License-Identifier: Apache-2.0

//! SDL scan that turns two schema versions into schema changes.
//!
//! This is not a GraphQL parser. Descriptions and comments are dropped line by
//! line, then definition bodies are split on balanced braces and fields are
//! read at the top level of each body, outside argument lists.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use bijux_featmon_policies::SchemaDiffConfig;
use regex::Regex;

use crate::raw::{SchemaChange, SchemaChangeKind};

fn type_header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?:extend\s+)?(type|interface|input|enum)\s+([A-Za-z_][A-Za-z0-9_]*)")
            .expect("valid type header regex")
    })
}

fn field_name() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:^|[^@A-Za-z0-9_])([A-Za-z_][A-Za-z0-9_]*)\s*[:(]")
            .expect("valid field regex")
    })
}

/// SDL lines with descriptions and comments removed.
fn definition_lines(sdl: &str) -> Vec<&str> {
    let mut in_block_string = false;
    let mut out = Vec::new();
    for line in sdl.lines() {
        let trimmed = line.trim();
        if trimmed.matches("\"\"\"").count() % 2 == 1 {
            in_block_string = !in_block_string;
            continue;
        }
        if in_block_string || trimmed.starts_with('"') || trimmed.starts_with('#') {
            continue;
        }
        out.push(line);
    }
    out
}

struct Definition {
    kind: String,
    name: String,
    fields: Option<BTreeSet<String>>,
}

/// Top-level text of a body that starts just after its `{`, with argument
/// lists emptied, and the text left after the closing `}`.
fn split_body(text: &str) -> (String, &str) {
    let mut top = String::new();
    let mut braces = 1_usize;
    let mut parens = 0_usize;
    for (idx, ch) in text.char_indices() {
        match ch {
            '{' => braces += 1,
            '}' => {
                braces -= 1;
                if braces == 0 {
                    return (top, &text[idx + ch.len_utf8()..]);
                }
            }
            '(' => {
                if braces == 1 && parens == 0 {
                    top.push('(');
                }
                parens += 1;
            }
            ')' => {
                parens = parens.saturating_sub(1);
                if braces == 1 && parens == 0 {
                    top.push(')');
                }
            }
            _ if braces == 1 && parens == 0 => top.push(ch),
            _ => {}
        }
    }
    (top, "")
}

fn definitions(sdl: &str) -> Vec<Definition> {
    let text = definition_lines(sdl).join("\n");
    let mut out = Vec::new();
    let mut rest = text.as_str();
    while let Some(caps) = type_header().captures(rest) {
        let (Some(header), Some(kind), Some(name)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            break;
        };
        let after = &rest[header.end()..];
        let next_header = type_header().find(after).map_or(after.len(), |m| m.start());
        let mut definition = Definition {
            kind: kind.as_str().to_string(),
            name: name.as_str().to_string(),
            fields: None,
        };
        rest = match after[..next_header].find('{') {
            Some(open) => {
                let (body, remaining) = split_body(&after[open + 1..]);
                definition.fields = Some(
                    field_name()
                        .captures_iter(&body)
                        .filter_map(|c| c.get(1))
                        .map(|m| m.as_str().to_string())
                        .collect(),
                );
                remaining
            }
            None => after,
        };
        out.push(definition);
    }
    out
}

/// Names of every `type`, `interface`, `input`, and `enum` definition.
#[must_use]
pub fn parse_schema_types(sdl: &str) -> BTreeSet<String> {
    definitions(sdl).into_iter().map(|d| d.name).collect()
}

/// Field names per object, interface, and input type. Enum values are not fields.
#[must_use]
pub fn parse_type_fields(sdl: &str) -> BTreeMap<String, BTreeSet<String>> {
    let mut out: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for definition in definitions(sdl) {
        if definition.kind == "enum" {
            continue;
        }
        if let Some(fields) = definition.fields {
            out.entry(definition.name).or_default().extend(fields);
        }
    }
    out
}

/// Changes between two SDL documents, sorted by kind, type, then field.
///
/// New types are all reported while there are at most `max_unfiltered_types`
/// of them; past that only names containing a significant keyword survive.
/// New fields are reported for watched types present in both versions, at
/// most `max_fields_per_type` each in name order.
#[must_use]
pub fn detect_schema_changes(
    old_sdl: &str,
    new_sdl: &str,
    config: &SchemaDiffConfig,
) -> Vec<SchemaChange> {
    let old_types = parse_schema_types(old_sdl);
    let new_types = parse_schema_types(new_sdl);
    let added_types: Vec<&String> = new_types.difference(&old_types).collect();
    let filter_noise = added_types.len() > config.max_unfiltered_types;
    let keywords: Vec<String> = config
        .significant_keywords
        .iter()
        .map(|k| k.to_lowercase())
        .collect();

    let mut changes: Vec<SchemaChange> = added_types
        .iter()
        .filter(|name| {
            !filter_noise || {
                let lower = name.to_lowercase();
                keywords.iter().any(|k| lower.contains(k.as_str()))
            }
        })
        .map(|name| SchemaChange::new(SchemaChangeKind::NewType, name, None))
        .collect();
    tracing::debug!(
        added_types = added_types.len(),
        reported_types = changes.len(),
        filtered = filter_noise,
        "schema type diff"
    );

    let old_fields = parse_type_fields(old_sdl);
    let new_fields = parse_type_fields(new_sdl);
    let watched: BTreeSet<&str> = config.watched_types.iter().map(String::as_str).collect();
    for type_name in watched {
        let (Some(before), Some(after)) = (old_fields.get(type_name), new_fields.get(type_name))
        else {
            continue;
        };
        let kind = if type_name == "Mutation" {
            SchemaChangeKind::NewMutation
        } else {
            SchemaChangeKind::NewField
        };
        changes.extend(
            after
                .difference(before)
                .take(config.max_fields_per_type)
                .map(|field| SchemaChange::new(kind, type_name, Some(field))),
        );
    }

    changes.sort_by(|a, b| {
        (a.kind, &a.type_name, &a.field_name).cmp(&(b.kind, &b.type_name, &b.field_name))
    });
    changes
}
