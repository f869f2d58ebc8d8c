//! End-to-end build over a real content tree.
//!
//! Each test lays out a content directory on disk, runs a full build through
//! the public API, and asserts on the files and manifest the build wrote.
//!
//! Run with: cargo test --test build_pipeline

use std::fs;
use std::path::Path;

use tempfile::TempDir;
use vellum::config::BuildConfig;
use vellum::naming;
use vellum::site::build_site;
use vellum::types::{NavigationNode, NodeKind, SiteManifest};

const FRONT: &str = "---\n\
    created_at: 2024-03-01\n\
    last_updated_at: 2024-03-08\n\
    author: docs team\n\
    has_custom_tsx: false\n\
    ---\n";

fn document(body: &str) -> String {
    format!("{FRONT}{body}")
}

fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn read_manifest(output_root: &Path) -> SiteManifest {
    let json = fs::read_to_string(output_root.join("site-manifest.json")).unwrap();
    serde_json::from_str(&json).unwrap()
}

fn collect_pages<'a>(nodes: &'a [NavigationNode], out: &mut Vec<&'a NavigationNode>) {
    for node in nodes {
        match node.kind {
            NodeKind::Page => out.push(node),
            NodeKind::Folder => collect_pages(&node.children, out),
        }
    }
}

fn sorted_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn full_tree_build_writes_units_assets_and_manifest() {
    let tmp = TempDir::new().unwrap();
    write_file(
        tmp.path(),
        "_01_guide/_1_intro.md",
        &document("# Intro\n\n![flow](shot.png)\n\n```rust\nfn main() {}\n```"),
    );
    write_file(
        tmp.path(),
        "_01_guide/_2_setup.md",
        &document("# Setup\n\n**bold** and `code`"),
    );
    write_file(
        tmp.path(),
        "_02_reference/api.md",
        &document("# Api\n\n- one\n- two"),
    );
    write_file(tmp.path(), "about.md", &document("# About\n\nwho we are"));
    write_file(tmp.path(), "widget.tsx", "export default function W() {}");
    write_file(tmp.path(), "shot.png", "png-bytes");

    let out = tmp.path().join("dist");
    let outcome = build_site(tmp.path(), &out, BuildConfig::default()).unwrap();
    assert!(outcome.failures.is_empty());

    let manifest = read_manifest(&out);
    let titles: Vec<&str> = manifest.navigation.iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, vec!["guide", "reference", "about", "widget"]);

    // Every page unit the manifest names exists on disk.
    let mut pages = Vec::new();
    collect_pages(&manifest.navigation, &mut pages);
    assert_eq!(pages.len(), 5);
    for page in &pages {
        assert!(
            out.join(&page.output_path).exists(),
            "missing unit {}",
            page.output_path
        );
    }

    // The intro document carried one image and one code block.
    let intro = &manifest.navigation[0].children[0];
    assert_eq!(intro.title, "intro");
    assert_eq!(intro.image_assets.len(), 1);
    assert_eq!(intro.code_assets.len(), 1);
    assert!(out.join(&intro.code_assets[0].hash_path).exists());
    assert!(out.join(&intro.image_assets[0].hash_path).exists());

    let unit = fs::read_to_string(out.join(&intro.output_path)).unwrap();
    assert!(unit.contains("<H1vel>Intro</H1vel>"));
    assert!(unit.contains("publishedAt=\"2024-03-01\""));
    assert!(unit.contains("<Blockcodevel language=\"rust\""));
}

#[test]
fn manifest_serializes_the_full_schema() {
    let tmp = TempDir::new().unwrap();
    write_file(
        tmp.path(),
        "_01_guide/intro.md",
        &document("# Intro\n\nhello"),
    );
    write_file(tmp.path(), "logo.png", "logo-bytes");

    let out = tmp.path().join("dist");
    build_site(tmp.path(), &out, BuildConfig::default()).unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("site-manifest.json")).unwrap())
            .unwrap();

    let folder = &raw["navigation"][0];
    let mut keys: Vec<&str> = folder.as_object().unwrap().keys().map(|k| k.as_str()).collect();
    keys.sort_unstable();
    assert_eq!(
        keys,
        vec![
            "children",
            "codeAssets",
            "hasOverride",
            "hash",
            "imageAssets",
            "kind",
            "outputPath",
            "path",
            "sourcePath",
            "title",
        ]
    );
    assert_eq!(folder["kind"], "folder");
    assert_eq!(folder["children"][0]["kind"], "page");
    assert_eq!(folder["children"][0]["sourcePath"], "_01_guide/intro.md");

    let image = &raw["images"][0];
    assert!(image["originalPath"].is_string());
    assert!(image["hashPath"].as_str().unwrap().starts_with("velimage/"));
}

#[test]
fn identical_content_rebuilds_byte_stable() {
    let tmp = TempDir::new().unwrap();
    write_file(tmp.path(), "shot.png", "png-bytes");
    write_file(
        tmp.path(),
        "_01_docs/page.md",
        &document("# Page\n\n![s](shot.png)\n\n```js\nlet a = 1;\n```"),
    );

    let out = tmp.path().join("dist");
    build_site(tmp.path(), &out, BuildConfig::default()).unwrap();
    let manifest_a = fs::read_to_string(out.join("site-manifest.json")).unwrap();
    let images_a = sorted_names(&out.join("velimage"));
    let code_a = sorted_names(&out.join("velcode"));

    build_site(tmp.path(), &out, BuildConfig::default()).unwrap();
    assert_eq!(
        fs::read_to_string(out.join("site-manifest.json")).unwrap(),
        manifest_a
    );
    assert_eq!(sorted_names(&out.join("velimage")), images_a);
    assert_eq!(sorted_names(&out.join("velcode")), code_a);
}

#[test]
fn shared_image_stores_once_but_lists_on_every_page() {
    let tmp = TempDir::new().unwrap();
    write_file(tmp.path(), "diagram.png", "shared-bytes");
    write_file(tmp.path(), "a.md", &document("# A\n\n![d](diagram.png)"));
    write_file(tmp.path(), "b.md", &document("# B\n\n![d](diagram.png)"));

    let out = tmp.path().join("dist");
    build_site(tmp.path(), &out, BuildConfig::default()).unwrap();

    let manifest = read_manifest(&out);
    assert_eq!(manifest.images.len(), 1);
    assert_eq!(sorted_names(&out.join("velimage")).len(), 1);
    for node in &manifest.navigation {
        assert_eq!(node.image_assets.len(), 1, "page {} lost its usage", node.title);
        assert_eq!(node.image_assets[0].hash_path, manifest.images[0].hash_path);
    }
}

#[test]
fn broken_document_does_not_take_down_the_build() {
    let tmp = TempDir::new().unwrap();
    write_file(tmp.path(), "bad.md", "no front matter at all");
    write_file(tmp.path(), "good.md", &document("# Good\n\nfine"));

    let out = tmp.path().join("dist");
    let outcome = build_site(tmp.path(), &out, BuildConfig::default()).unwrap();

    assert_eq!(outcome.failures.len(), 1);
    let manifest = read_manifest(&out);
    assert_eq!(manifest.navigation.len(), 1);
    assert_eq!(manifest.navigation[0].title, "good");
    assert!(out.join(&manifest.navigation[0].output_path).exists());
}

#[test]
fn removed_documents_leave_no_stale_units() {
    let tmp = TempDir::new().unwrap();
    write_file(tmp.path(), "keep.md", &document("# Keep\n\nk"));
    write_file(tmp.path(), "drop.md", &document("# Drop\n\nd"));

    let out = tmp.path().join("dist");
    build_site(tmp.path(), &out, BuildConfig::default()).unwrap();
    let dropped_hash = naming::path_hash("drop.md");
    assert!(out.join("pages").join(&dropped_hash).exists());

    fs::remove_file(tmp.path().join("drop.md")).unwrap();
    build_site(tmp.path(), &out, BuildConfig::default()).unwrap();
    assert!(!out.join("pages").join(&dropped_hash).exists());
    assert!(out.join("pages").join(naming::path_hash("keep.md")).exists());
}

#[test]
fn edit_source_base_url_lands_in_the_unit_shell() {
    let tmp = TempDir::new().unwrap();
    write_file(tmp.path(), "doc.md", &document("# Doc\n\ntext"));

    let out = tmp.path().join("dist");
    let config = BuildConfig {
        edit_source_base_url: "https://github.com/acme/docs/edit/main/".to_string(),
        ..BuildConfig::default()
    };
    let outcome = build_site(tmp.path(), &out, config).unwrap();

    let node = &outcome.manifest.navigation[0];
    let unit = fs::read_to_string(out.join(&node.output_path)).unwrap();
    let expected = format!(
        "<EditSource url=\"https://github.com/acme/docs/edit/main/pages/{}\" />",
        node.hash
    );
    assert!(unit.contains(&expected));
}
