use super::Filter;
use crate::error::CompressError;
use crate::split::Hunk;

/// Keeps the `media` attribute of an element once its hunk is combined.
///
/// A hunk from an element with `media="print"` becomes
/// `@media print { ... }`. Hunks without a media attribute, or with `all`,
/// pass through.
pub struct CssMediaFilter;

impl Filter for CssMediaFilter {
    fn name(&self) -> &'static str {
        "css_media"
    }

    fn input(&self, content: &str, hunk: &Hunk) -> Result<Option<String>, CompressError> {
        let Some(media) = hunk.media.as_deref().map(str::trim) else {
            return Ok(None);
        };
        if media.is_empty() || media.eq_ignore_ascii_case("all") {
            return Ok(None);
        }
        Ok(Some(format!("@media {media} {{\n{content}\n}}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::split::HunkSource;

    fn hunk(media: Option<&str>) -> Hunk {
        Hunk {
            source: HunkSource::Inline("p { border:5px solid green;}".to_string()),
            element: String::new(),
            media: media.map(str::to_string),
        }
    }

    #[test]
    fn wraps_media_specific_hunks() {
        let out = CssMediaFilter
            .input("p { border:5px solid green;}", &hunk(Some("print")))
            .unwrap();
        assert_eq!(
            out.as_deref(),
            Some("@media print {\np { border:5px solid green;}\n}")
        );
    }

    #[test]
    fn all_and_missing_media_pass_through() {
        assert!(CssMediaFilter.input("a{}", &hunk(Some("all"))).unwrap().is_none());
        assert!(CssMediaFilter.input("a{}", &hunk(Some(" "))).unwrap().is_none());
        assert!(CssMediaFilter.input("a{}", &hunk(None)).unwrap().is_none());
    }
}
