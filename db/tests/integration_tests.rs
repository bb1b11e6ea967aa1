use std::path::Path;

use fts_schema_core::{TableDefinition, TokenizerConfig, TokenizerType, compile_table_definition};
use fts_schema_db::{
    DatabaseError, DefinitionSet, DefinitionSource, EngineConfig, IndexState, Manifest,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn articles() -> TableDefinition {
    TableDefinition::new("articles_fts", ["title", "body", "slug"])
        .with_unindexed("slug")
        .with_content("articles", Some("id"))
}

fn write_yaml(dir: &Path, file: &str, def: &TableDefinition) {
    std::fs::write(dir.join(file), serde_yaml::to_string(def).unwrap()).unwrap();
}

// ---------------------------------------------------------------------------
// Directory and bundle loading
// ---------------------------------------------------------------------------

#[test]
fn test_directory_loading() {
    let dir = tempfile::tempdir().unwrap();
    write_yaml(dir.path(), "articles.yaml", &articles());
    write_yaml(
        dir.path(),
        "notes.yml",
        &TableDefinition::new("notes_fts", ["body"])
            .with_tokenizer(TokenizerConfig::new(TokenizerType::Trigram)),
    );

    let set = DefinitionSet::from_dir(dir.path()).unwrap();
    assert_eq!(set.len(), 2);
    assert_eq!(set.get("articles_fts"), Some(&articles()));
    assert_eq!(
        set.get("notes_fts").unwrap().tokenizer.kind,
        TokenizerType::Trigram
    );
    assert!(set.validate().is_empty());
}

#[test]
fn test_bundle_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bundle.json");

    let set = DefinitionSet::from_definitions([
        articles(),
        TableDefinition::new("docs", ["body"]).with_prefix_lengths([2]),
    ])
    .unwrap();
    let bundle = set.to_bundle("1.0");
    assert!(bundle.generated_at.is_some());
    std::fs::write(&path, serde_json::to_string_pretty(&bundle).unwrap()).unwrap();

    let loaded = DefinitionSet::from_bundle(&path).unwrap();
    assert_eq!(loaded.names().collect::<Vec<_>>(), vec!["articles_fts", "docs"]);
    assert_eq!(loaded.get("articles_fts"), set.get("articles_fts"));
    assert_eq!(loaded.get("docs"), set.get("docs"));
}

#[test]
fn test_builder_falls_back_to_bundle() {
    let dir = tempfile::tempdir().unwrap();
    let bundle_path = dir.path().join("bundle.yaml");
    std::fs::write(
        &bundle_path,
        "version: '1.0'\ndefinitions:\n  - tableName: docs\n    columns: [body]\n",
    )
    .unwrap();

    let set = DefinitionSet::builder()
        .default_tokenizer(TokenizerType::Porter)
        .from_dir(dir.path().join("missing"))
        .from_bundle(&bundle_path)
        .build()
        .unwrap();

    assert!(matches!(set.source(), DefinitionSource::Multiple(sources) if sources.len() == 2));
    assert_eq!(set.get("docs").unwrap().tokenizer.kind, TokenizerType::Porter);
}

#[test]
fn test_builder_without_sources_fails() {
    let dir = tempfile::tempdir().unwrap();
    let result = DefinitionSet::builder()
        .from_dir(dir.path().join("a"))
        .from_bundle(dir.path().join("b.json"))
        .build();
    assert!(matches!(result, Err(DatabaseError::NoSourcesAvailable)));
}

#[test]
fn test_invalid_definitions_are_reported_per_table() {
    let dir = tempfile::tempdir().unwrap();
    write_yaml(dir.path(), "ok.yaml", &articles());
    write_yaml(
        dir.path(),
        "bad.yaml",
        &TableDefinition::new("bad_fts", ["body"]).with_unindexed("missing"),
    );

    let set = DefinitionSet::from_dir(dir.path()).unwrap();
    let problems = set.validate();
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].0, "bad_fts");
}

// ---------------------------------------------------------------------------
// Manifest workflow
// ---------------------------------------------------------------------------

#[test]
fn test_manifest_workflow() {
    let dir = tempfile::tempdir().unwrap();
    let manifest_path = dir.path().join("fts-manifest.json");

    let def = articles();
    let ddl = compile_table_definition(&def).unwrap();

    let mut manifest = Manifest::load_or_new(&manifest_path, "0.1.0").unwrap();
    assert_eq!(manifest.state_of(&def.table_name, &ddl), IndexState::New);
    manifest.record(&def.table_name, &ddl, Some("articles.yaml".into()), true);
    manifest.save(&manifest_path).unwrap();

    let reloaded = Manifest::load(&manifest_path).unwrap();
    assert_eq!(reloaded.state_of(&def.table_name, &ddl), IndexState::Current);
    assert!(reloaded.get(&def.table_name).unwrap().triggers);

    let changed = def.with_tokenizer(TokenizerConfig::new(TokenizerType::Porter));
    let new_ddl = compile_table_definition(&changed).unwrap();
    assert_eq!(
        reloaded.state_of(&changed.table_name, &new_ddl),
        IndexState::Changed
    );

    let mut next = reloaded.clone();
    next.record(&changed.table_name, &new_ddl, None, true);
    let diff = reloaded.diff(&next);
    assert_eq!(diff.changed, vec!["articles_fts"]);
    assert!(diff.added.is_empty() && diff.removed.is_empty());
}

// ---------------------------------------------------------------------------
// Engine configuration
// ---------------------------------------------------------------------------

#[test]
fn test_engine_config_drives_loading_and_search() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("fts-schema.yml");
    std::fs::write(
        &config_path,
        "search:\n  default_limit: 10\n  max_limit: 25\nindex:\n  default_tokenizer: porter\n",
    )
    .unwrap();
    let config = EngineConfig::load(&config_path).unwrap();

    let defs = dir.path().join("indexes");
    std::fs::create_dir(&defs).unwrap();
    std::fs::write(defs.join("docs.json"), r#"{"tableName": "docs", "columns": ["body"]}"#)
        .unwrap();

    let set = DefinitionSet::builder()
        .default_tokenizer(config.index.default_tokenizer)
        .from_dir(&defs)
        .build()
        .unwrap();
    assert_eq!(set.get("docs").unwrap().tokenizer.kind, TokenizerType::Porter);

    let mut request = config.search_request("hello");
    assert_eq!(request.limit, 10);
    request.limit = 500;
    config.apply_search_defaults(&mut request);
    assert_eq!(request.limit, 25);
}
