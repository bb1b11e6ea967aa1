use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use fts_schema_sqlite::{SqlExecutor, SqliteExecutor};

const BIN: &str = env!("CARGO_BIN_EXE_fts-schema");

fn run(args: &[&str]) -> Output {
    Command::new(BIN)
        .args(args)
        .output()
        .expect("failed to run fts-schema")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

/// Writes the `articles_fts` definition into `dir/articles.yaml`.
fn write_articles_definition(dir: &Path, tokenizer: &str) -> PathBuf {
    let yaml = format!(
        "tableName: articles_fts
columns: [title, body, slug]
unindexed: [slug]
tokenizer:
  type: {tokenizer}
contentTable: articles
contentRowId: id
"
    );
    let path = dir.join("articles.yaml");
    fs::write(&path, yaml).expect("failed to write definition");
    path
}

/// Creates a database with a populated `articles` table.
fn create_database(dir: &Path) -> PathBuf {
    let path = dir.join("search.db");
    let executor = SqliteExecutor::open(&path).unwrap();
    executor
        .execute_batch(
            "CREATE TABLE articles (id INTEGER PRIMARY KEY, title TEXT, body TEXT, slug TEXT);
             INSERT INTO articles (title, body, slug) VALUES
                ('Rust ownership', 'Borrowing and lifetimes explained', 'rust-ownership'),
                ('SQLite tips', 'Running full text search in sqlite', 'sqlite-tips');",
        )
        .unwrap();
    path
}

// ---------------------------------------------------------------------------
// validate / compile / decompile
// ---------------------------------------------------------------------------

#[test]
fn validate_accepts_directory_of_definitions() {
    let dir = tempfile::tempdir().unwrap();
    write_articles_definition(dir.path(), "porter");
    fs::write(
        dir.path().join("notes.json"),
        r#"{"tableName": "notes_fts", "columns": ["body"]}"#,
    )
    .unwrap();

    let out = run(&["validate", path_str(dir.path())]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stdout(&out).contains("Validated 2 definition file(s)."));
}

#[test]
fn validate_reports_each_invalid_file() {
    let dir = tempfile::tempdir().unwrap();
    let bad = dir.path().join("bad.yaml");
    fs::write(
        &bad,
        "tableName: t\ncolumns: [a]\ntokenizer:\n  type: porter\n  parameters:\n    case_sensitive: 1\n",
    )
    .unwrap();

    let out = run(&["validate", path_str(&bad)]);
    assert!(!out.status.success());
    let err = stderr(&out);
    assert!(err.contains("case_sensitive is only valid for trigram tokenizer"), "{err}");
    assert!(err.contains("1 of 1 definition file(s) failed validation"), "{err}");
}

#[test]
fn compile_emits_ddl_triggers_and_backfill() {
    let dir = tempfile::tempdir().unwrap();
    let def = write_articles_definition(dir.path(), "unicode61");

    let out = run(&["compile", "--definition", path_str(&def), "--triggers", "--populate"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let sql = stdout(&out);
    let lines: Vec<&str> = sql.lines().collect();
    assert_eq!(lines.len(), 5);
    assert_eq!(
        lines[0],
        "CREATE VIRTUAL TABLE \"articles_fts\" USING fts5(title, body, slug UNINDEXED, \
         tokenize='unicode61', content='articles', content_rowid='id');"
    );
    assert!(lines[1].starts_with("CREATE TRIGGER \"articles_fts_ai\" AFTER INSERT"));
    assert!(lines[4].starts_with("INSERT INTO \"articles_fts\" (rowid, title, body, slug)"));
}

#[test]
fn compile_structured_output() {
    let dir = tempfile::tempdir().unwrap();
    let def = write_articles_definition(dir.path(), "trigram");

    let out = run(&["compile", "--definition", path_str(&def), "--format", "json"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let value: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(value["table"], "articles_fts");
    assert!(value["ddl"].as_str().unwrap().contains("tokenize='trigram'"));
    assert!(value.get("triggers").is_none());
}

#[test]
fn decompile_reads_statement_from_stdin() {
    let mut child = Command::new(BIN)
        .args(["decompile", "--format", "yaml"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("failed to spawn fts-schema");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"CREATE VIRTUAL TABLE docs USING fts5(title, body UNINDEXED, prefix='2 3');")
        .unwrap();
    let out = child.wait_with_output().unwrap();

    assert!(out.status.success());
    let value: serde_yaml::Value = serde_yaml::from_str(&stdout(&out)).unwrap();
    assert_eq!(value["tableName"].as_str(), Some("docs"));
    assert_eq!(value["unindexed"][0].as_str(), Some("body"));
    assert_eq!(value["prefixIndex"]["lengths"][1].as_u64(), Some(3));
}

#[test]
fn decompile_rejects_non_fts_statement() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("table.sql");
    fs::write(&input, "CREATE TABLE t (a TEXT);").unwrap();

    let out = run(&["decompile", "--input", path_str(&input)]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("not an FTS5 CREATE VIRTUAL TABLE statement"));
}

// ---------------------------------------------------------------------------
// apply / search / status / maintain / drop
// ---------------------------------------------------------------------------

#[test]
fn apply_search_and_status_workflow() {
    let dir = tempfile::tempdir().unwrap();
    let defs = dir.path().join("indexes");
    fs::create_dir(&defs).unwrap();
    write_articles_definition(&defs, "porter");
    let db = create_database(dir.path());
    let manifest = dir.path().join("fts-manifest.json");

    let apply = || {
        run(&[
            "apply",
            "--db",
            path_str(&db),
            "--definitions",
            path_str(&defs),
            "--manifest",
            path_str(&manifest),
        ])
    };

    let out = apply();
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stdout(&out).contains("created articles_fts (3 trigger(s), 2 row(s) indexed)"));
    assert!(manifest.exists());

    let out = run(&[
        "search", "--db", path_str(&db), "--table", "articles_fts", "--query", "run", "--snippet",
    ]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let page: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(page["total"], 1);
    assert_eq!(page["results"][0]["row"]["title"], "SQLite tips");
    assert!(page["results"][0]["snippet"].as_str().unwrap().contains("<mark>"));

    let out = apply();
    assert!(stdout(&out).contains("Applied 1 definition(s): 0 changed, 1 unchanged."));

    let out = run(&[
        "status",
        "--db",
        path_str(&db),
        "--definitions",
        path_str(&defs),
        "--manifest",
        path_str(&manifest),
    ]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let status: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    let index = &status["indexes"][0];
    assert_eq!(index["exists"], true);
    assert_eq!(index["matches_database"], true);
    assert_eq!(index["manifest_state"], "current");
    assert_eq!(index["rows"], 2);
    assert_eq!(status["untracked"].as_array().unwrap().len(), 0);

    write_articles_definition(&defs, "unicode61");
    let out = apply();
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stdout(&out).contains("recreated articles_fts"));

    // Stemming is gone after the tokenizer change.
    let out = run(&[
        "search", "--db", path_str(&db), "--table", "articles_fts", "--query", "run",
    ]);
    let page: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(page["total"], 0);
}

#[test]
fn apply_dry_run_leaves_database_untouched() {
    let dir = tempfile::tempdir().unwrap();
    write_articles_definition(dir.path(), "unicode61");
    let db = create_database(dir.path());

    let out = run(&[
        "apply",
        "--db",
        path_str(&db),
        "--definitions",
        path_str(dir.path()),
        "--dry-run",
    ]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stdout(&out).contains("create    articles_fts"));

    let executor = SqliteExecutor::open(&db).unwrap();
    let tables = executor
        .execute("SELECT name FROM sqlite_master WHERE name = 'articles_fts'")
        .unwrap();
    assert!(tables.rows.is_empty());
}

/// Applies the definitions in `defs` without a manifest.
fn apply_without_manifest(db: &Path, defs: &Path) -> Output {
    run(&["apply", "--db", path_str(db), "--definitions", path_str(defs)])
}

fn count_rows(db: &Path, table: &str) -> u64 {
    let executor = SqliteExecutor::open(db).unwrap();
    let output = executor
        .execute(&format!("SELECT COUNT(*) AS total FROM {table}"))
        .unwrap();
    output.rows[0]["total"].as_u64().unwrap()
}

#[test]
fn reapply_ignores_unindexed_order() {
    let dir = tempfile::tempdir().unwrap();
    let defs = dir.path().join("indexes");
    fs::create_dir(&defs).unwrap();
    fs::write(
        defs.join("notes.yaml"),
        "tableName: notes_fts\ncolumns: [a, b, c]\nunindexed: [c, b]\n",
    )
    .unwrap();
    let db = create_database(dir.path());

    let out = apply_without_manifest(&db, &defs);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stdout(&out).contains("created notes_fts"));

    SqliteExecutor::open(&db)
        .unwrap()
        .execute("INSERT INTO notes_fts (a, b, c) VALUES ('kept', 'x', 'y')")
        .unwrap();

    let out = apply_without_manifest(&db, &defs);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stdout(&out).contains("Applied 1 definition(s): 0 changed, 1 unchanged."));
    assert_eq!(count_rows(&db, "notes_fts"), 1);
}

#[test]
fn reapply_ignores_empty_tokenizer_parameters() {
    let dir = tempfile::tempdir().unwrap();
    let defs = dir.path().join("indexes");
    fs::create_dir(&defs).unwrap();
    fs::write(
        defs.join("notes.json"),
        r#"{
            "tableName": "notes_fts",
            "columns": ["body"],
            "tokenizer": {"type": "unicode61", "parameters": {}},
            "prefixIndex": {"enabled": false, "lengths": [2]}
        }"#,
    )
    .unwrap();
    let db = create_database(dir.path());

    let out = apply_without_manifest(&db, &defs);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    SqliteExecutor::open(&db)
        .unwrap()
        .execute("INSERT INTO notes_fts (body) VALUES ('kept')")
        .unwrap();

    let out = apply_without_manifest(&db, &defs);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stdout(&out).contains("0 changed, 1 unchanged."));
    assert_eq!(count_rows(&db, "notes_fts"), 1);

    let out = run(&["status", "--db", path_str(&db), "--definitions", path_str(&defs)]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let status: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(status["indexes"][0]["matches_database"], true);
}

#[test]
fn failed_recreate_keeps_existing_index() {
    let dir = tempfile::tempdir().unwrap();
    let defs = dir.path().join("indexes");
    fs::create_dir(&defs).unwrap();
    write_articles_definition(&defs, "unicode61");
    let db = create_database(dir.path());
    let out = apply_without_manifest(&db, &defs);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    // `articles` has no `tags` column, so the backfill fails.
    fs::write(
        defs.join("articles.yaml"),
        "tableName: articles_fts
columns: [title, tags]
contentTable: articles
contentRowId: id
",
    )
    .unwrap();
    let out = apply_without_manifest(&db, &defs);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("Failed to recreate 'articles_fts'"), "{}", stderr(&out));

    assert_eq!(count_rows(&db, "articles_fts"), 2);
    let out = run(&[
        "search", "--db", path_str(&db), "--table", "articles_fts", "--query", "sqlite",
    ]);
    let page: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(page["results"][0]["row"]["slug"], "sqlite-tips");
}

#[test]
fn search_rejects_query_without_terms() {
    let dir = tempfile::tempdir().unwrap();
    write_articles_definition(dir.path(), "unicode61");
    let db = create_database(dir.path());
    run(&["apply", "--db", path_str(&db), "--definitions", path_str(dir.path())]);

    let out = run(&[
        "search", "--db", path_str(&db), "--table", "articles_fts", "--query", "DROP; DELETE",
    ]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("after removing disallowed characters"));
}

#[test]
fn search_requires_both_bm25_parameters() {
    let out = run(&[
        "search", "--db", "x.db", "--table", "t", "--query", "q", "--bm25-k1", "1.5",
    ]);
    assert!(!out.status.success());
}

#[test]
fn search_missing_database_fails() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("missing.db");
    let out = run(&["search", "--db", path_str(&db), "--table", "t", "--query", "q"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("does not exist"));
    assert!(!db.exists());
}

#[test]
fn maintain_and_drop_index() {
    let dir = tempfile::tempdir().unwrap();
    let defs = dir.path().join("indexes");
    fs::create_dir(&defs).unwrap();
    write_articles_definition(&defs, "unicode61");
    let db = create_database(dir.path());
    let manifest = dir.path().join("manifest.json");
    run(&[
        "apply",
        "--db",
        path_str(&db),
        "--definitions",
        path_str(&defs),
        "--manifest",
        path_str(&manifest),
    ]);

    for op in ["rebuild", "optimize", "integrity-check", "merge=8"] {
        let out = run(&["maintain", "--db", path_str(&db), "--table", "articles_fts", "--op", op]);
        assert!(out.status.success(), "{op}: {}", stderr(&out));
        assert!(stdout(&out).starts_with("Ran "));
    }

    let out = run(&[
        "maintain", "--db", path_str(&db), "--table", "articles_fts", "--op", "vacuum",
    ]);
    assert!(!out.status.success());

    let out = run(&[
        "drop",
        "--db",
        path_str(&db),
        "--table",
        "articles_fts",
        "--manifest",
        path_str(&manifest),
    ]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&manifest).unwrap()).unwrap();
    assert!(saved["indexes"].as_object().unwrap().is_empty());

    let out = run(&["drop", "--db", path_str(&db), "--table", "articles_fts"]);
    assert!(!out.status.success());
}
