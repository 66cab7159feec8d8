//! Local filename assignment
//!
//! Maps each resource's URL (or declared filename) to a collision-free local
//! path. Names are chosen by priority: an explicitly declared filename, else
//! a name derived from the URL's last path segment, else the configured
//! default filename. When subdirectory routing is enabled, the file extension
//! picks the first matching rule's directory.
//!
//! Assignment must happen in discovery order: collision suffixes depend on
//! which names are already taken, and the engine calls the assigner from its
//! sequential expansion step to keep results deterministic across runs.

use std::collections::HashSet;
use std::path::Path;

use url::Url;

use crate::config::{CrawlConfig, SubdirectoryRule};

/// Deterministic mapping from resource URLs to collision-free local paths
#[derive(Debug)]
pub struct FilenameAssigner {
    default_filename: String,
    subdirectories: Option<Vec<SubdirectoryRule>>,
    occupied: HashSet<String>,
}

impl FilenameAssigner {
    pub fn new(
        default_filename: impl Into<String>,
        subdirectories: Option<Vec<SubdirectoryRule>>,
    ) -> Self {
        Self {
            default_filename: default_filename.into(),
            subdirectories,
            occupied: HashSet::new(),
        }
    }

    pub fn from_config(config: &CrawlConfig) -> Self {
        Self::new(
            config.default_filename.clone(),
            config.subdirectories.clone(),
        )
    }

    /// Assigns a local path for `url`.
    ///
    /// A declared filename is used verbatim; it skips routing when it already
    /// carries a directory component. Derived names are sanitized before use.
    /// The returned path is unique among all paths this assigner has handed
    /// out so far.
    pub fn assign(&mut self, url: &Url, declared: Option<&str>) -> String {
        let (name, keep_placement) = match declared {
            Some(declared) => (declared.to_string(), declared.contains('/')),
            None => {
                let derived = derive_from_url(url)
                    .map(|segment| sanitize_filename::sanitize(segment))
                    .filter(|name| !name.is_empty());
                (
                    derived.unwrap_or_else(|| self.default_filename.clone()),
                    false,
                )
            }
        };

        let path = if keep_placement {
            name
        } else {
            self.route(&name)
        };

        self.disambiguate(path)
    }

    /// Places `name` under the first subdirectory rule matching its
    /// extension; unrouted names stay at the output root.
    fn route(&self, name: &str) -> String {
        let Some(rules) = &self.subdirectories else {
            return name.to_string();
        };

        if let Some(ext) = extension_of(name) {
            for rule in rules {
                if rule.extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)) {
                    return format!("{}/{}", rule.directory, name);
                }
            }
        }

        name.to_string()
    }

    /// First caller of a path wins it; later callers get `_1`, `_2`, ...
    /// suffixes before the extension.
    fn disambiguate(&mut self, path: String) -> String {
        if self.occupied.insert(path.clone()) {
            return path;
        }

        let (stem, ext) = split_name(&path);
        let mut counter = 1;
        loop {
            let candidate = format!("{stem}_{counter}{ext}");
            if self.occupied.insert(candidate.clone()) {
                return candidate;
            }
            counter += 1;
        }
    }
}

/// Last non-empty path segment of the URL, if any.
fn derive_from_url(url: &Url) -> Option<&str> {
    url.path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()
}

/// Extension of `name` with a leading dot, lowercased.
fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_ascii_lowercase()))
}

/// Splits a relative path into (stem, extension), keeping any directory
/// prefix with the stem. A leading dot does not count as an extension.
fn split_name(path: &str) -> (&str, &str) {
    let dir_end = path.rfind('/').map(|i| i + 1).unwrap_or(0);
    match path[dir_end..].rfind('.') {
        Some(dot) if dot > 0 => path.split_at(dir_end + dot),
        _ => (path, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn routing_rules() -> Option<Vec<SubdirectoryRule>> {
        Some(vec![
            SubdirectoryRule::new("images", &[".png", ".jpg"]),
            SubdirectoryRule::new("css", &[".css"]),
        ])
    }

    #[test]
    fn declared_filename_wins() {
        let mut assigner = FilenameAssigner::new("index.html", None);
        let assigned = assigner.assign(&url("http://a.test/page"), Some("first.html"));
        assert_eq!(assigned, "first.html");
    }

    #[test]
    fn derives_name_from_url_path() {
        let mut assigner = FilenameAssigner::new("index.html", None);
        let assigned = assigner.assign(&url("http://a.test/assets/logo.png"), None);
        assert_eq!(assigned, "logo.png");
    }

    #[test]
    fn falls_back_to_default_filename() {
        let mut assigner = FilenameAssigner::new("index.html", None);
        assert_eq!(assigner.assign(&url("http://a.test/"), None), "index.html");
        assert_eq!(assigner.assign(&url("http://a.test"), None), "index_1.html");
    }

    #[test]
    fn ignores_query_when_deriving() {
        let mut assigner = FilenameAssigner::new("index.html", None);
        let assigned = assigner.assign(&url("http://a.test/style.css?v=3"), None);
        assert_eq!(assigned, "style.css");
    }

    #[test]
    fn routes_by_extension_first_match_wins() {
        let mut assigner = FilenameAssigner::new("index.html", routing_rules());
        assert_eq!(
            assigner.assign(&url("http://a.test/logo.png"), None),
            "images/logo.png"
        );
        assert_eq!(
            assigner.assign(&url("http://a.test/site.css"), None),
            "css/site.css"
        );
    }

    #[test]
    fn unmatched_extension_stays_at_root() {
        let mut assigner = FilenameAssigner::new("index.html", routing_rules());
        assert_eq!(
            assigner.assign(&url("http://a.test/page.html"), None),
            "page.html"
        );
    }

    #[test]
    fn null_subdirectories_disable_routing() {
        let mut assigner = FilenameAssigner::new("index.html", None);
        assert_eq!(
            assigner.assign(&url("http://a.test/logo.png"), None),
            "logo.png"
        );
    }

    #[test]
    fn routing_matches_extensions_case_insensitively() {
        let mut assigner = FilenameAssigner::new("index.html", routing_rules());
        assert_eq!(
            assigner.assign(&url("http://a.test/LOGO.PNG"), None),
            "images/LOGO.PNG"
        );
    }

    #[test]
    fn collisions_get_incrementing_suffixes() {
        let mut assigner = FilenameAssigner::new("index.html", None);
        assert_eq!(
            assigner.assign(&url("http://a.test/photo.png"), None),
            "photo.png"
        );
        assert_eq!(
            assigner.assign(&url("http://b.test/photo.png"), None),
            "photo_1.png"
        );
        assert_eq!(
            assigner.assign(&url("http://c.test/photo.png"), None),
            "photo_2.png"
        );
    }

    #[test]
    fn collisions_are_detected_within_a_directory() {
        let mut assigner = FilenameAssigner::new("index.html", routing_rules());
        assert_eq!(
            assigner.assign(&url("http://a.test/x/logo.png"), None),
            "images/logo.png"
        );
        assert_eq!(
            assigner.assign(&url("http://a.test/y/logo.png"), None),
            "images/logo_1.png"
        );
    }

    #[test]
    fn declared_name_with_directory_keeps_placement() {
        let mut assigner = FilenameAssigner::new("index.html", routing_rules());
        let assigned = assigner.assign(&url("http://a.test/logo.png"), Some("raw/keep.png"));
        assert_eq!(assigned, "raw/keep.png");
    }

    #[test]
    fn collision_suffix_without_extension() {
        let mut assigner = FilenameAssigner::new("index.html", None);
        assert_eq!(assigner.assign(&url("http://a.test/page"), None), "page");
        assert_eq!(assigner.assign(&url("http://b.test/page"), None), "page_1");
    }

    #[test]
    fn sanitizes_derived_names() {
        let mut assigner = FilenameAssigner::new("index.html", None);
        let assigned = assigner.assign(&url("http://a.test/a:b.html"), None);
        assert!(!assigned.contains(':'));
        assert!(assigned.ends_with(".html"));
    }
}
