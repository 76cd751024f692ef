//! End-to-end tests: load a project configuration, render a template with
//! compress blocks, and check the written files and the persisted manifest.

use std::path::Path;
use std::time::{Duration, SystemTime};

use compressor_cache::OutputCache;
use compressor_config::{load_settings, Settings};
use compressor_core::{render_template, VERSION};

const TEMPLATE: &str = r#"<html>
<head>
{% compress css %}
<link rel="stylesheet" href="{{ MEDIA_URL }}css/one.css" type="text/css">
<style type="text/css">p { border:5px solid green;}</style>
{% endcompress %}
{% compress js %}
<script src="{{ MEDIA_URL }}js/one.js" type="text/javascript"></script>
<script type="text/javascript">obj.value = "value";</script>
{% endcompress %}
</head>
</html>"#;

fn project(config: &str) -> (tempfile::TempDir, Settings) {
    let dir = tempfile::tempdir().unwrap();
    let media = dir.path().join("media");
    for sub in ["css", "js", "img"] {
        std::fs::create_dir_all(media.join(sub)).unwrap();
    }
    std::fs::write(
        media.join("css/one.css"),
        "body { background: url('../img/bg.png'); }",
    )
    .unwrap();
    std::fs::write(media.join("img/bg.png"), b"png").unwrap();
    std::fs::write(media.join("js/one.js"), "obj = {};").unwrap();
    std::fs::write(dir.path().join("compressor.toml"), config).unwrap();

    let settings = load_settings(dir.path()).unwrap();
    (dir, settings)
}

const CONFIG: &str = r#"
[compress]
url = "/media/"
root = "media"
css_filters = ["cssmin"]
"#;

fn render(settings: &Settings) -> String {
    let mut cache = OutputCache::load_or_create(&settings.root, &settings.output_dir, VERSION);
    let out = render_template(TEMPLATE, settings, &mut cache).unwrap();
    cache.save().unwrap();
    out
}

fn referenced_file(settings: &Settings, out: &str, marker: &str) -> std::path::PathBuf {
    let start = out.find(marker).unwrap() + marker.len();
    let end = start + out[start..].find('"').unwrap();
    settings.root.join(&out[start..end])
}

fn touch(path: &Path, offset: Duration) {
    std::fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(SystemTime::now() + offset)
        .unwrap();
}

#[test]
fn template_blocks_become_single_tags() {
    let (_dir, settings) = project(CONFIG);
    let out = render(&settings);

    assert!(out.starts_with("<html>\n<head>\n<link rel=\"stylesheet\" href=\"/media/CACHE/css/"));
    assert!(out.contains("<script type=\"text/javascript\" src=\"/media/CACHE/js/"));
    assert!(out.ends_with("</script>\n</head>\n</html>"));
    assert!(!out.contains("compress"));

    let css = std::fs::read_to_string(referenced_file(&settings, &out, "href=\"/media/")).unwrap();
    assert!(css.starts_with("body{background:url(/media/img/bg.png?"), "{css}");
    assert!(css.ends_with(")}p{border:5px solid green}"), "{css}");

    let js = std::fs::read_to_string(referenced_file(&settings, &out, "src=\"/media/")).unwrap();
    assert_eq!(js, "obj={};obj.value=\"value\";");
}

#[test]
fn manifest_is_persisted_and_reused() {
    let (_dir, settings) = project(CONFIG);
    let first = render(&settings);

    let cache = OutputCache::load_or_create(&settings.root, &settings.output_dir, VERSION);
    assert_eq!(cache.manifest().records.len(), 2);
    assert!(settings.output_root().join("manifest.json").is_file());

    assert_eq!(render(&settings), first);
}

#[test]
fn manifest_from_another_version_is_discarded() {
    let (_dir, settings) = project(CONFIG);
    render(&settings);
    let cache = OutputCache::load_or_create(&settings.root, &settings.output_dir, "0.0.0-other");
    assert!(cache.manifest().records.is_empty());
}

#[test]
fn changed_source_produces_new_output() {
    let (_dir, settings) = project(CONFIG);
    let first = render(&settings);

    let js = settings.root.join("js/one.js");
    std::fs::write(&js, "obj = { changed: true };").unwrap();
    touch(&js, Duration::from_secs(120));

    let second = render(&settings);
    assert_ne!(first, second);
    let written = referenced_file(&settings, &second, "src=\"/media/");
    assert_eq!(
        std::fs::read_to_string(written).unwrap(),
        "obj={changed:true};obj.value=\"value\";"
    );
}

#[test]
fn gc_removes_unreferenced_outputs() {
    let (_dir, settings) = project(CONFIG);
    let out = render(&settings);

    let stray = settings.output_root().join("css/000000000000.css");
    std::fs::write(&stray, "a{}").unwrap();

    let mut cache = OutputCache::load_or_create(&settings.root, &settings.output_dir, VERSION);
    assert_eq!(cache.gc().unwrap(), 1);
    assert!(!stray.exists());
    assert!(referenced_file(&settings, &out, "href=\"/media/").is_file());
}

fn files_in(dir: &Path) -> usize {
    std::fs::read_dir(dir).map_or(0, |entries| entries.count())
}

#[test]
fn gc_reclaims_outputs_of_superseded_blocks() {
    let (_dir, settings) = project(CONFIG);
    render(&settings);

    let js = settings.root.join("js/one.js");
    for (i, body) in ["obj = { a: 1 };", "obj = { b: 2 };"].into_iter().enumerate() {
        std::fs::write(&js, body).unwrap();
        touch(&js, Duration::from_secs(120 * (i as u64 + 1)));
        render(&settings);
    }
    assert_eq!(files_in(&settings.output_root().join("js")), 3);

    let mut cache = OutputCache::load_or_create(&settings.root, &settings.output_dir, VERSION);
    assert_eq!(cache.manifest().records.len(), 2);
    assert_eq!(cache.gc().unwrap(), 2);
    assert_eq!(files_in(&settings.output_root().join("js")), 1);
    assert_eq!(files_in(&settings.output_root().join("css")), 1);
}

#[test]
fn linked_paths_with_parent_segments_resolve_cleanly() {
    let config = r#"
[compress]
url = "/media/"
root = "media"
"#;
    let (_dir, settings) = project(config);
    std::fs::create_dir_all(settings.root.join("lib/theme")).unwrap();
    std::fs::write(
        settings.root.join("lib/theme/site.css"),
        "a { background: url(img/x.png) }",
    )
    .unwrap();

    let template = r#"{% compress css %}
<link rel="stylesheet" href="/media/css/../lib/theme/site.css">
{% endcompress %}"#;
    let mut cache = OutputCache::load_or_create(&settings.root, &settings.output_dir, VERSION);
    let out = render_template(template, &settings, &mut cache).unwrap();

    let css = std::fs::read_to_string(referenced_file(&settings, &out, "href=\"/media/")).unwrap();
    assert_eq!(css, "a { background: url('/media/lib/theme/img/x.png') }");
}

#[test]
fn debug_mode_leaves_markup_uncompressed() {
    let config = r#"
[compress]
debug = true
url = "/media/"
root = "media"
"#;
    let (_dir, settings) = project(config);
    let out = render(&settings);
    assert!(out.contains("<link rel=\"stylesheet\" href=\"/media/css/one.css\" type=\"text/css\">"));
    assert!(out.contains("<script type=\"text/javascript\">obj.value = \"value\";</script>"));
    assert!(!settings.output_root().join("css").exists());
}

#[cfg(unix)]
#[test]
fn compiled_dialects_join_the_block() {
    let config = r#"
[compress]
url = "/media/"
root = "media"
css_filters = ["cssmin"]

[compilers.".ccss"]
binary_path = "sh -c"
arguments = "'sed \"s/^\\([a-z]*\\):$/\\1 {/; s/^$/}/\" \"$0.ccss\" > \"$0.css\"' *"
"#;
    let (_dir, settings) = project(config);
    std::fs::write(
        settings.root.join("css/three.ccss"),
        "small:\n  font-size: 10px\n\n",
    )
    .unwrap();

    let template = r#"{% compress css %}
<link rel="stylesheet" href="/media/css/three.ccss" type="text/css">
{% endcompress %}"#;
    let mut cache = OutputCache::load_or_create(&settings.root, &settings.output_dir, VERSION);
    let out = render_template(template, &settings, &mut cache).unwrap();

    assert!(settings.root.join("css/three.css").is_file());
    let css = std::fs::read_to_string(referenced_file(&settings, &out, "href=\"/media/")).unwrap();
    assert_eq!(css, "small{font-size:10px}");
}
