// SPDX-License-Identifier: Apache-2.0

use std::fmt::Write as _;
use std::path::PathBuf;

use bijux_featmon_ingest::{detect_schema_changes, SchemaChangeKind};
use bijux_featmon_policies::SchemaDiffConfig;

fn fixture(path: &str) -> String {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    std::fs::read_to_string(root.join(path)).expect("read fixture")
}

fn summary(old: &str, new: &str, config: &SchemaDiffConfig) -> Vec<String> {
    detect_schema_changes(old, new, config)
        .into_iter()
        .map(|c| match c.field_name {
            Some(field) => format!("{}:{}.{}", c.kind.as_str(), c.type_name, field),
            None => format!("{}:{}", c.kind.as_str(), c.type_name),
        })
        .collect()
}

#[test]
fn fixture_schemas_produce_sorted_type_and_field_changes() {
    let old = fixture("tests/fixtures/schema_old.graphql");
    let new = fixture("tests/fixtures/schema_new.graphql");
    assert_eq!(
        summary(&old, &new, &SchemaDiffConfig::default()),
        vec![
            "new-type:ArchiveRepositoryInput",
            "new-type:ArchiveRepositoryPayload",
            "new-type:ProjectV2",
            "new-field:Query.projectV2",
            "new-field:Repository.hasDiscussionsEnabled",
            "new-mutation:Mutation.archiveRepository",
        ]
    );
}

#[test]
fn identical_schemas_produce_no_changes() {
    let old = fixture("tests/fixtures/schema_old.graphql");
    assert!(detect_schema_changes(&old, &old, &SchemaDiffConfig::default()).is_empty());
}

#[test]
fn many_new_types_are_filtered_to_significant_names() {
    let mut new = String::new();
    for idx in 0..12 {
        let _ = writeln!(new, "type Widget{idx} {{\n  id: ID!\n}}");
    }
    new.push_str("type CreateWidgetPayload {\n  id: ID!\n}\n");
    new.push_str("input CreateWidgetInput {\n  name: String!\n}\n");
    let changes = summary("", &new, &SchemaDiffConfig::default());
    assert_eq!(
        changes,
        vec!["new-type:CreateWidgetInput", "new-type:CreateWidgetPayload"]
    );
}

#[test]
fn new_fields_are_capped_per_watched_type() {
    let old = "type Query {\n  a: Int\n}\n";
    let mut new = String::from("type Query {\n  a: Int\n");
    for field in ["f", "e", "d", "c", "b", "g"] {
        let _ = writeln!(new, "  {field}: Int");
    }
    new.push_str("}\n");
    let config = SchemaDiffConfig {
        max_fields_per_type: 3,
        ..SchemaDiffConfig::default()
    };
    let changes = detect_schema_changes(old, &new, &config);
    assert_eq!(changes.len(), 3);
    assert!(changes.iter().all(|c| c.kind == SchemaChangeKind::NewField));
    let fields: Vec<&str> = changes
        .iter()
        .filter_map(|c| c.field_name.as_deref())
        .collect();
    assert_eq!(fields, vec!["b", "c", "d"]);
}

#[test]
fn unwatched_types_do_not_report_fields() {
    let old = "type User {\n  login: String!\n}\n";
    let new = "type User {\n  login: String!\n  pronouns: String\n}\n";
    assert!(detect_schema_changes(old, new, &SchemaDiffConfig::default()).is_empty());
}

#[test]
fn fields_after_an_inline_closing_brace_stay_with_their_own_type() {
    let old = "type Query { viewer: User }\ntype Repository {\n  id: ID! }\n";
    let new = "type Query { viewer: User licenses: [License] }\n\
               type Repository {\n  id: ID! }\n\
               type Issue {\n  title: String\n}\n";
    assert_eq!(
        summary(old, new, &SchemaDiffConfig::default()),
        vec!["new-type:Issue", "new-field:Query.licenses"]
    );
}
