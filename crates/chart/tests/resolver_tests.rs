//! End-to-end resolution tests over chart layouts built in temporary directories.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use flate2::Compression;
use flate2::write::GzEncoder;
use helmdeps_chart::{
    ChartResolver, Error, ResolveWarning, ResolverOptions, resolve, to_document,
};
use serde_json::{Value, json};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// =============================================================================
// Fixture helpers
// =============================================================================

/// `(name, version, condition)`; every dependency uses the same repository.
type Dep<'a> = (&'a str, &'a str, &'a str);

fn write_chart(dir: &Path, name: &str, version: &str, deps: &[Dep<'_>]) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let mut manifest = format!("apiVersion: v2\nname: {name}\nversion: {version}\n");
    if !deps.is_empty() {
        manifest.push_str("dependencies:\n");
        for (dep_name, dep_version, condition) in deps {
            manifest.push_str(&format!(
                "  - name: {dep_name}\n    version: \"{dep_version}\"\n    repository: https://charts.example.com\n"
            ));
            if !condition.is_empty() {
                manifest.push_str(&format!("    condition: {condition}\n"));
            }
        }
    }
    fs::write(dir.join("Chart.yaml"), manifest).unwrap();
    dir.to_path_buf()
}

/// Package `chart_dir` the way `helm package` does: a single top-level
/// directory named after the chart.
fn package_chart(chart_dir: &Path, top_level: &str, archive_path: &Path) {
    let file = File::create(archive_path).unwrap();
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    builder.append_dir_all(top_level, chart_dir).unwrap();
    builder.into_inner().unwrap().finish().unwrap();
}

fn count_document_nodes(document: &Value) -> usize {
    1 + document
        .get("dependencies")
        .and_then(Value::as_object)
        .map_or(0, |deps| deps.values().map(count_document_nodes).sum())
}

fn scratch_options(scratch: &Path) -> ResolverOptions {
    ResolverOptions {
        scratch_root: Some(scratch.to_path_buf()),
        ..ResolverOptions::default()
    }
}

// =============================================================================
// Directory layouts
// =============================================================================

#[test]
fn test_chart_without_dependencies() {
    let temp = TempDir::new().unwrap();
    let root = write_chart(&temp.path().join("app"), "app", "1.0.0", &[]);

    let resolution = resolve(&root).unwrap();

    assert!(resolution.tree.resolved);
    assert!(resolution.tree.children.is_empty());
    assert!(resolution.warnings.is_empty());
}

#[test]
fn test_single_directory_dependency_document() {
    let temp = TempDir::new().unwrap();
    let root = write_chart(
        &temp.path().join("app"),
        "app",
        "1.0.0",
        &[("lib", "2.0.0", "enabled")],
    );
    write_chart(&root.join("charts/lib"), "lib", "2.0.0", &[]);

    let resolution = resolve(&root).unwrap();
    let document = to_document(&resolution.tree).unwrap();

    assert_eq!(
        document,
        json!({
            "name": "app",
            "version": "1.0.0",
            "dependencies": {
                "lib": {
                    "name": "lib",
                    "version": "2.0.0",
                    "repository": "https://charts.example.com",
                    "condition": "enabled",
                    "dependencies": {}
                }
            }
        })
    );
    assert!(resolution.warnings.is_empty());
}

#[test]
fn test_document_node_count_matches_reachable_directories() {
    let temp = TempDir::new().unwrap();
    let root = write_chart(
        &temp.path().join("app"),
        "app",
        "1.0.0",
        &[("api", "1.0.0", ""), ("db", "3.1.0", "db.enabled")],
    );
    let api = write_chart(&root.join("charts/api"), "api", "1.0.0", &[("common", "0.2.0", "")]);
    write_chart(&api.join("charts/common"), "common", "0.2.0", &[]);
    let db = write_chart(&root.join("charts/db"), "db", "3.1.0", &[("common", "0.2.0", "")]);
    write_chart(&db.join("charts/common"), "common", "0.2.0", &[]);

    let resolution = resolve(&root).unwrap();
    let document = to_document(&resolution.tree).unwrap();

    // app, api, api/common, db, db/common: repeated subtrees are not deduplicated
    assert_eq!(count_document_nodes(&document), 5);
    assert_eq!(resolution.tree.node_count(), 5);
    assert!(resolution.tree.children["db"].children["common"].resolved);
}

#[test]
fn test_declaration_order_is_preserved() {
    let temp = TempDir::new().unwrap();
    let root = write_chart(
        &temp.path().join("app"),
        "app",
        "1.0.0",
        &[("zeta", "1.0.0", ""), ("alpha", "1.0.0", "")],
    );
    write_chart(&root.join("charts/alpha"), "alpha", "1.0.0", &[]);
    write_chart(&root.join("charts/zeta"), "zeta", "1.0.0", &[]);

    let tree = resolve(&root).unwrap().tree;
    let names: Vec<&str> = tree.children.keys().map(String::as_str).collect();

    assert_eq!(names, ["zeta", "alpha"]);
}

#[test]
fn test_missing_subchart_folder_leaves_dependencies_unresolved() {
    let temp = TempDir::new().unwrap();
    let root = write_chart(
        &temp.path().join("app"),
        "app",
        "1.0.0",
        &[("lib", "2.0.0", ""), ("db", "1.0.0", "")],
    );

    let resolution = resolve(&root).unwrap();

    assert_eq!(resolution.tree.children.len(), 2);
    assert!(resolution.tree.children.values().all(|c| !c.resolved));
    assert!(resolution.tree.children.values().all(|c| c.children.is_empty()));
    assert_eq!(
        resolution.warnings,
        [ResolveWarning::MissingSubchartFolder {
            chart: "app".to_string(),
            path: root.join("charts"),
        }]
    );

    let document = to_document(&resolution.tree).unwrap();
    assert!(document["dependencies"]["lib"].get("dependencies").is_none());
}

#[test]
fn test_unlocated_dependency_is_warned_and_kept() {
    let temp = TempDir::new().unwrap();
    let root = write_chart(
        &temp.path().join("app"),
        "app",
        "1.0.0",
        &[("lib", "2.0.0", ""), ("ghost", "0.0.1", "ghost.enabled")],
    );
    write_chart(&root.join("charts/lib"), "lib", "2.0.0", &[]);

    let resolution = resolve(&root).unwrap();

    let ghost = &resolution.tree.children["ghost"];
    assert!(!ghost.resolved);
    assert_eq!(ghost.condition, "ghost.enabled");
    assert_eq!(
        resolution.warnings,
        [ResolveWarning::UnresolvedDependency {
            chart: "app".to_string(),
            dependency: "ghost".to_string(),
        }]
    );
}

#[test]
fn test_unrelated_entries_are_skipped() {
    let temp = TempDir::new().unwrap();
    let root = write_chart(&temp.path().join("app"), "app", "1.0.0", &[("lib", "2.0.0", "")]);
    write_chart(&root.join("charts/lib"), "lib", "2.0.0", &[]);
    // an undeclared directory with a broken manifest is never read
    fs::create_dir_all(root.join("charts/stray")).unwrap();
    fs::write(root.join("charts/stray/Chart.yaml"), "{{ not yaml").unwrap();
    fs::write(root.join("charts/README.md"), "# vendored charts").unwrap();

    let resolution = resolve(&root).unwrap();

    assert!(resolution.tree.children["lib"].resolved);
    assert!(resolution.warnings.is_empty());
}

#[test]
fn test_malformed_nested_manifest_aborts_resolution() {
    let temp = TempDir::new().unwrap();
    let root = write_chart(&temp.path().join("app"), "app", "1.0.0", &[("lib", "2.0.0", "")]);
    fs::create_dir_all(root.join("charts/lib")).unwrap();
    fs::write(root.join("charts/lib/Chart.yaml"), "name: lib\n").unwrap();

    let err = resolve(&root).unwrap_err();

    assert!(matches!(err, Error::MalformedManifest { .. }));
    assert!(err.to_string().contains("'version'"));
}

#[test]
fn test_declared_directory_without_manifest_aborts_resolution() {
    let temp = TempDir::new().unwrap();
    let root = write_chart(&temp.path().join("app"), "app", "1.0.0", &[("lib", "2.0.0", "")]);
    fs::create_dir_all(root.join("charts/lib/templates")).unwrap();

    let err = resolve(&root).unwrap_err();

    match err {
        Error::MissingManifest { path } => assert_eq!(path, root.join("charts/lib/Chart.yaml")),
        other => panic!("expected MissingManifest, got {other:?}"),
    }
}

#[test]
fn test_missing_root_manifest() {
    let temp = TempDir::new().unwrap();

    let err = resolve(temp.path()).unwrap_err();

    assert!(matches!(err, Error::MissingManifest { .. }));
}

// =============================================================================
// Archive layouts
// =============================================================================

#[test]
fn test_archive_and_directory_dependencies_resolve_identically() {
    let temp = TempDir::new().unwrap();
    let staging = temp.path().join("staging");

    // lib depends on util, vendored as a directory inside lib
    let lib = write_chart(&staging.join("lib"), "lib", "2.0.0", &[("util", "0.3.0", "")]);
    write_chart(&lib.join("charts/util"), "util", "0.3.0", &[]);

    let dir_root = write_chart(
        &temp.path().join("dir-app"),
        "app",
        "1.0.0",
        &[("lib", "2.0.0", "lib.enabled")],
    );
    fs::create_dir_all(dir_root.join("charts")).unwrap();
    fs::rename(&lib, dir_root.join("charts/lib")).unwrap();

    let tgz_root = write_chart(
        &temp.path().join("tgz-app"),
        "app",
        "1.0.0",
        &[("lib", "2.0.0", "lib.enabled")],
    );
    fs::create_dir_all(tgz_root.join("charts")).unwrap();
    package_chart(
        &dir_root.join("charts/lib"),
        "lib",
        &tgz_root.join("charts/lib-2.0.0.tgz"),
    );

    let from_dir = resolve(&dir_root).unwrap();
    let from_tgz = resolve(&tgz_root).unwrap();

    assert_eq!(from_dir.tree, from_tgz.tree);
    assert!(from_tgz.tree.children["lib"].children["util"].resolved);
}

#[test]
fn test_nested_archives_are_resolved_and_cleaned_up() {
    let temp = TempDir::new().unwrap();
    let scratch = temp.path().join("scratch");
    fs::create_dir(&scratch).unwrap();
    let staging = temp.path().join("staging");

    let common = write_chart(&staging.join("common"), "common", "1.4.0", &[]);
    let redis = write_chart(&staging.join("redis"), "redis", "17.3.7", &[("common", "1.x.x", "")]);
    fs::create_dir_all(redis.join("charts")).unwrap();
    package_chart(&common, "common", &redis.join("charts/common-1.4.0.tgz"));

    let root = write_chart(
        &temp.path().join("app"),
        "app",
        "1.0.0",
        &[("redis", "17.3.7", "redis.enabled")],
    );
    fs::create_dir_all(root.join("charts")).unwrap();
    package_chart(&redis, "redis", &root.join("charts/redis-17.3.7.tgz"));

    let resolution = ChartResolver::with_options(scratch_options(&scratch))
        .resolve(&root)
        .unwrap();

    let redis = &resolution.tree.children["redis"];
    assert!(redis.resolved);
    assert_eq!(redis.condition, "redis.enabled");
    assert!(redis.children["common"].resolved);
    assert_eq!(redis.children["common"].version, "1.x.x");
    assert!(resolution.warnings.is_empty());

    assert_eq!(fs::read_dir(&scratch).unwrap().count(), 0, "scratch directories leaked");
}

#[test]
fn test_path_traversal_in_nested_archive_aborts_and_cleans_up() {
    let temp = TempDir::new().unwrap();
    let scratch = temp.path().join("scratch");
    fs::create_dir(&scratch).unwrap();

    let root = write_chart(&temp.path().join("app"), "app", "1.0.0", &[("evil", "6.6.6", "")]);
    fs::create_dir_all(root.join("charts")).unwrap();

    let archive = root.join("charts/evil-6.6.6.tgz");
    {
        let file = File::create(&archive).unwrap();
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        let manifest = b"name: evil\nversion: 6.6.6\n";
        let mut header = tar::Header::new_gnu();
        header.set_path("evil/Chart.yaml").unwrap();
        header.set_size(manifest.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append(&header, &manifest[..]).unwrap();

        let payload = b"escaped";
        let mut header = tar::Header::new_gnu();
        let escaping = b"../../outside.txt";
        header.as_old_mut().name[..escaping.len()].copy_from_slice(escaping);
        header.set_size(payload.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append(&header, &payload[..]).unwrap();
        builder.into_inner().unwrap().finish().unwrap();
    }

    let err = ChartResolver::with_options(scratch_options(&scratch))
        .resolve(&root)
        .unwrap_err();

    assert!(matches!(err, Error::PathTraversalDetected { .. }));
    assert!(!temp.path().join("outside.txt").exists());
    assert_eq!(fs::read_dir(&scratch).unwrap().count(), 0);
}

#[test]
fn test_archive_with_several_top_level_entries_is_malformed() {
    let temp = TempDir::new().unwrap();
    let staging = temp.path().join("staging");
    write_chart(&staging.join("a"), "a", "1.0.0", &[]);
    write_chart(&staging.join("b"), "b", "1.0.0", &[]);

    let root = write_chart(&temp.path().join("app"), "app", "1.0.0", &[("a", "1.0.0", "")]);
    fs::create_dir_all(root.join("charts")).unwrap();
    {
        let file = File::create(root.join("charts/a-1.0.0.tgz")).unwrap();
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        builder.append_dir_all("a", staging.join("a")).unwrap();
        builder.append_dir_all("b", staging.join("b")).unwrap();
        builder.into_inner().unwrap().finish().unwrap();
    }

    let err = resolve(&root).unwrap_err();

    assert!(matches!(err, Error::MalformedArchiveLayout { .. }));
}

#[test]
fn test_undeclared_archive_is_warned() {
    let temp = TempDir::new().unwrap();
    let staging = temp.path().join("staging");
    let extra = write_chart(&staging.join("extra"), "extra", "0.1.0", &[]);

    let root = write_chart(&temp.path().join("app"), "app", "1.0.0", &[("lib", "2.0.0", "")]);
    write_chart(&root.join("charts/lib"), "lib", "2.0.0", &[]);
    package_chart(&extra, "extra", &root.join("charts/extra-0.1.0.tgz"));

    let resolution = resolve(&root).unwrap();

    assert!(!resolution.tree.children.contains_key("extra"));
    assert!(matches!(
        resolution.warnings.as_slice(),
        [ResolveWarning::UndeclaredSubchart { subchart, .. }] if subchart == "extra"
    ));
}

// =============================================================================
// Cycles
// =============================================================================

#[cfg(unix)]
#[test]
fn test_symlinked_cycle_is_detected() {
    let temp = TempDir::new().unwrap();
    let root = write_chart(&temp.path().join("app"), "app", "1.0.0", &[("lib", "2.0.0", "")]);
    let lib = write_chart(&root.join("charts/lib"), "lib", "2.0.0", &[("app", "1.0.0", "")]);
    fs::create_dir_all(lib.join("charts")).unwrap();
    std::os::unix::fs::symlink(&root, lib.join("charts/app")).unwrap();

    let err = resolve(&root).unwrap_err();

    match err {
        Error::CyclicDependency { name, path } => {
            assert_eq!(name, "app");
            assert_eq!(path, root.canonicalize().unwrap());
        }
        other => panic!("expected CyclicDependency, got {other:?}"),
    }
}
