use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use compressor_common::{ContentHash, Mtime};
use regex::{Captures, Regex};

use super::Filter;
use crate::error::CompressError;
use crate::split::Hunk;

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)url\(([^)]+)\)").expect("url pattern is valid"));

/// Rewrites relative `url()` references in stylesheets to absolute URLs.
///
/// Relative references are resolved against the public URL of the directory
/// holding the stylesheet. Resolution never climbs above the URL prefix: extra
/// `..` segments are dropped. References to files that exist under the static
/// root get a `?<hash>` suffix derived from the file's modification time.
pub struct CssAbsoluteFilter {
    root: PathBuf,
    media_url: String,
    origin: String,
    prefix: Vec<String>,
}

impl CssAbsoluteFilter {
    /// Creates the filter for files under `root`, served at `media_url`.
    pub fn new(root: &Path, media_url: &str) -> Self {
        let media_url = format!("{}/", media_url.trim_end_matches('/'));
        let (origin, path) = split_origin(&media_url);
        let prefix = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Self {
            root: root.to_path_buf(),
            origin: origin.to_string(),
            media_url,
            prefix,
        }
    }

    /// Rewrites every `url()` in `content` for a stylesheet located in `dir`
    /// (segments relative to the root).
    fn rewrite(&self, content: &str, dir: &[String]) -> String {
        URL_PATTERN
            .replace_all(content, |caps: &Captures<'_>| {
                let url = caps[1].trim_matches(|c: char| c.is_whitespace() || c == '\'' || c == '"');
                if url.is_empty() || url.starts_with('#') {
                    return caps[0].to_string();
                }
                let absolute = if is_absolute(url) {
                    url.to_string()
                } else {
                    self.resolve(url, dir)
                };
                match self.suffix(&absolute) {
                    Some(suffix) => format!("url('{absolute}?{suffix}')"),
                    None => format!("url('{absolute}')"),
                }
            })
            .into_owned()
    }

    /// Resolves a relative reference against the stylesheet directory.
    fn resolve(&self, url: &str, dir: &[String]) -> String {
        let split_at = url.find(['?', '#']).unwrap_or(url.len());
        let (path, tail) = url.split_at(split_at);

        let mut segments: Vec<&str> = dir.iter().map(String::as_str).collect();
        for part in path.split('/') {
            match part {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                other => segments.push(other),
            }
        }

        let joined: Vec<&str> = self
            .prefix
            .iter()
            .map(String::as_str)
            .chain(segments)
            .collect();
        format!("{}/{}{}", self.origin, joined.join("/"), tail)
    }

    /// Returns a cache-busting suffix for a URL pointing at a file under the root.
    fn suffix(&self, url: &str) -> Option<String> {
        if url.contains('?') || url.starts_with("data:") {
            return None;
        }
        let relative = url.strip_prefix(&self.media_url)?;
        let relative = relative.split('#').next().unwrap_or(relative);
        let path = self.root.join(relative);
        let mtime = Mtime::of(&path).ok()?;
        let seconds = mtime.as_nanos() / 1_000_000_000;
        Some(ContentHash::from_bytes(seconds.to_string().as_bytes()).short())
    }
}

impl Filter for CssAbsoluteFilter {
    fn name(&self) -> &'static str {
        "css_absolute"
    }

    fn input(&self, content: &str, hunk: &Hunk) -> Result<Option<String>, CompressError> {
        let Some(filename) = hunk.filename() else {
            return Ok(None);
        };
        let Ok(relative) = filename.strip_prefix(&self.root) else {
            return Ok(None);
        };
        let mut dir: Vec<String> = Vec::new();
        for component in relative.parent().into_iter().flat_map(Path::components) {
            match component {
                Component::Normal(segment) => dir.push(segment.to_string_lossy().into_owned()),
                Component::ParentDir => {
                    dir.pop();
                }
                _ => {}
            }
        }
        Ok(Some(self.rewrite(content, &dir)))
    }
}

/// Splits `http(s)://host/path/` into `("http(s)://host", "/path/")`.
fn split_origin(url: &str) -> (&str, &str) {
    for scheme in ["http://", "https://", "//"] {
        if let Some(rest) = url.strip_prefix(scheme) {
            let host_end = rest.find('/').unwrap_or(rest.len());
            let split = scheme.len() + host_end;
            return url.split_at(split);
        }
    }
    ("", url)
}

fn is_absolute(url: &str) -> bool {
    url.starts_with('/')
        || url.starts_with("http://")
        || url.starts_with("https://")
        || url.starts_with("data:")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::split::HunkSource;

    fn file_hunk(path: PathBuf) -> Hunk {
        Hunk {
            source: HunkSource::File(path),
            element: String::new(),
            media: None,
        }
    }

    fn run(filter: &CssAbsoluteFilter, content: &str, file: &Path) -> String {
        filter
            .input(content, &file_hunk(file.to_path_buf()))
            .unwrap()
            .unwrap()
    }

    #[test]
    fn relative_urls_become_absolute() {
        let root = Path::new("/srv/media");
        let filter = CssAbsoluteFilter::new(root, "/media/");
        let out = run(
            &filter,
            "p { background: url('../../images/image.gif') }",
            &root.join("css/url/test.css"),
        );
        assert_eq!(out, "p { background: url('/media/images/image.gif') }");
    }

    #[test]
    fn http_prefix_keeps_host() {
        let root = Path::new("/srv/media");
        for prefix in ["http://media.example.com/", "https://media.example.com/"] {
            let filter = CssAbsoluteFilter::new(root, prefix);
            let out = run(
                &filter,
                "p { background: url('../../images/image.gif') }",
                &root.join("css/url/test.css"),
            );
            assert_eq!(out, format!("p {{ background: url('{prefix}images/image.gif') }}"));
        }
    }

    #[test]
    fn parent_segments_never_escape_prefix() {
        let root = Path::new("/srv/media");
        let filter = CssAbsoluteFilter::new(root, "/static/media/");
        let out = run(
            &filter,
            "a { b: url(../../../../../etc/passwd) }",
            &root.join("css/site.css"),
        );
        assert_eq!(out, "a { b: url('/static/media/etc/passwd') }");
    }

    #[test]
    fn absolute_and_data_urls_are_kept() {
        let root = Path::new("/srv/media");
        let filter = CssAbsoluteFilter::new(root, "/media/");
        let css = "a { b: url(\"/img/a.png\"); c: url(http://cdn.example.com/x.png); d: url(data:image/png;base64,AAAA) }";
        let out = run(&filter, css, &root.join("css/site.css"));
        assert_eq!(
            out,
            "a { b: url('/img/a.png'); c: url('http://cdn.example.com/x.png'); d: url('data:image/png;base64,AAAA') }"
        );
    }

    #[test]
    fn fragment_references_are_untouched() {
        let root = Path::new("/srv/media");
        let filter = CssAbsoluteFilter::new(root, "/media/");
        let out = run(&filter, "a { fill: url(#gradient) }", &root.join("css/site.css"));
        assert_eq!(out, "a { fill: url(#gradient) }");
    }

    #[test]
    fn query_and_fragment_survive_resolution() {
        let root = Path::new("/srv/media");
        let filter = CssAbsoluteFilter::new(root, "/media/");
        let out = run(
            &filter,
            "@font-face { src: url('../fonts/a.eot?#iefix') }",
            &root.join("css/site.css"),
        );
        assert_eq!(out, "@font-face { src: url('/media/fonts/a.eot?#iefix') }");
    }

    #[test]
    fn existing_files_get_mtime_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("images")).unwrap();
        std::fs::create_dir_all(root.join("css/url")).unwrap();
        let image = root.join("images/test.png");
        std::fs::write(&image, b"png").unwrap();

        let seconds = Mtime::of(&image).unwrap().as_nanos() / 1_000_000_000;
        let expected = ContentHash::from_bytes(seconds.to_string().as_bytes()).short();

        let filter = CssAbsoluteFilter::new(root, "/media/");
        let out = run(
            &filter,
            "p { background: url('../../images/test.png'); }",
            &root.join("css/url/url1.css"),
        );
        assert_eq!(out, format!("p {{ background: url('/media/images/test.png?{expected}'); }}"));
    }

    #[test]
    fn stylesheet_directory_is_normalized() {
        let root = Path::new("/srv/media");
        let filter = CssAbsoluteFilter::new(root, "/media/");
        let out = run(
            &filter,
            "a { b: url(img/x.png) }",
            &root.join("css/../lib/./theme/site.css"),
        );
        assert_eq!(out, "a { b: url('/media/lib/theme/img/x.png') }");
    }

    #[test]
    fn inline_hunks_are_left_alone() {
        let filter = CssAbsoluteFilter::new(Path::new("/srv/media"), "/media/");
        let hunk = Hunk {
            source: HunkSource::Inline("a { b: url(x.png) }".to_string()),
            element: String::new(),
            media: None,
        };
        assert!(filter.input("a { b: url(x.png) }", &hunk).unwrap().is_none());
    }

    #[test]
    fn files_outside_root_are_left_alone() {
        let filter = CssAbsoluteFilter::new(Path::new("/srv/media"), "/media/");
        let hunk = file_hunk(PathBuf::from("/elsewhere/site.css"));
        assert!(filter.input("a { b: url(x.png) }", &hunk).unwrap().is_none());
    }
}
