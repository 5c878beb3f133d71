use assert_cmd::Command;
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

const PAGE: &str = r#"{
  "Hero": {
    "default": {
      "title": "Welcome",
      "cta": {"label": "Start"}
    }
  }
}"#;

const CONSTANTS: &str = r#"{
  "Video": {
    "videoTypes": {"MOVIE": "movie"}
  }
}"#;

const TEMPLATE: &str = "<h1>{{%= Hero.default.title %}}</h1>\n\
<p>{{%- s(CONST.Video.videoTypes.MOVIE) %}}</p>\n\
<a>{{%= Hero.default.cta.";

fn workspace() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "data/page.json", PAGE);
    write(dir.path(), "data/constants.json", CONSTANTS);
    write(dir.path(), "views/index.ejs", TEMPLATE);
    write(dir.path(), "datapath.toml", "data_files = [\"data/*.json\"]\n");
    dir
}

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

fn run(dir: &TempDir, args: &[&str]) -> (Value, i32) {
    let output = Command::cargo_bin("datapath")
        .unwrap()
        .current_dir(dir.path())
        .env("RUST_LOG", "warn")
        .args(args)
        .output()
        .unwrap();
    let json = serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not JSON ({e}): {}",
            String::from_utf8_lossy(&output.stdout)
        )
    });
    (json, output.status.code().unwrap_or(-1))
}

#[test]
fn index_reports_stats_and_paths() {
    let dir = workspace();
    let (json, code) = run(&dir, &["index", "--paths"]);

    assert_eq!(code, 0);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["action"], "index");
    assert_eq!(json["data"]["stats"]["documents"], 2);
    assert_eq!(json["data"]["stats"]["paths"], 8);
    assert_eq!(json["meta"]["index_generation"], 1);
    assert_eq!(json["meta"]["config_path"], "datapath.toml");

    let paths: Vec<&str> = json["data"]["paths"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["path"].as_str().unwrap())
        .collect();
    assert!(paths.contains(&"Hero.default.cta.label"));
    assert!(paths.contains(&"Video.videoTypes.MOVIE"));
}

#[test]
fn hover_and_definition_resolve_directives() {
    let dir = workspace();
    let (hover, code) = run(
        &dir,
        &["hover", "views/index.ejs", "--line", "1", "--column", "35"],
    );
    assert_eq!(code, 0);
    assert_eq!(hover["data"]["path"], "Video.videoTypes.MOVIE");
    assert_eq!(hover["data"]["value_text"], "\"movie\"");
    assert_eq!(hover["data"]["file_name"], "constants.json");
    assert_eq!(hover["data"]["line"], 3);

    let (definition, _) = run(
        &dir,
        &["definition", "views/index.ejs", "--line", "0", "--column", "20"],
    );
    assert_eq!(definition["data"]["document_id"], "data/page.json");
    assert_eq!(definition["data"]["line"], 3);
    assert_eq!(definition["data"]["column"], 6);

    let (nothing, code) = run(
        &dir,
        &["hover", "views/index.ejs", "--line", "0", "--column", "0"],
    );
    assert_eq!(code, 0);
    assert_eq!(nothing["data"], Value::Null);
    assert_eq!(nothing["hints"][0]["type"], "info");
}

#[test]
fn complete_lists_children_of_typed_path() {
    let dir = workspace();
    let (json, code) = run(
        &dir,
        &["complete", "views/index.ejs", "--line", "2", "--column", "25"],
    );
    assert_eq!(code, 0);
    let candidates = json["data"].as_array().unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0]["name"], "label");
    assert_eq!(candidates[0]["kind"], "child_property");
    assert_eq!(candidates[0]["detail"], "string: \"Start\"");
}

#[test]
fn check_exits_nonzero_on_unresolved_paths() {
    let dir = workspace();
    let (ok, code) = run(&dir, &["check", "views/index.ejs"]);
    assert_eq!(code, 0);
    assert_eq!(ok["data"]["directives"], 2);
    assert_eq!(ok["data"]["unresolved"], Value::Array(vec![]));

    write(dir.path(), "views/broken.ejs", "{{%= Hero.missing %}}");
    let (broken, code) = run(&dir, &["check", "views/index.ejs", "views/broken.ejs"]);
    assert_eq!(code, 1);
    assert_eq!(broken["data"]["unresolved"][0]["file"], "views/broken.ejs");
    assert_eq!(broken["data"]["unresolved"][0]["path"], "Hero.missing");
}

#[test]
fn find_ranks_exact_path_first() {
    let dir = workspace();
    let (json, code) = run(&dir, &["find", "Hero.default.title", "--limit", "3"]);
    assert_eq!(code, 0);
    assert_eq!(json["data"][0]["path"], "Hero.default.title");
    assert_eq!(json["data"][0]["score"], 1.0);
}

#[test]
fn extra_data_flag_overrides_configured_documents() {
    let dir = workspace();
    write(dir.path(), "override.json", r#"{"Hero": {"default": {"title": "Hi"}}}"#);
    let (json, _) = run(
        &dir,
        &[
            "--data",
            "override.json",
            "hover",
            "views/index.ejs",
            "--line",
            "0",
            "--column",
            "12",
        ],
    );
    assert_eq!(json["data"]["value_text"], "\"Hi\"");
    assert_eq!(json["data"]["file_name"], "override.json");
}

#[test]
fn invalid_data_file_is_reported_as_error() {
    let dir = workspace();
    write(dir.path(), "data/broken.json", "{ \"a\": ");
    let (json, code) = run(&dir, &["index"]);
    assert_eq!(code, 2);
    assert_eq!(json["status"], "error");
    assert!(json["message"].as_str().unwrap().contains("broken.json"));
}
