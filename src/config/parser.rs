//! Options document loading
//!
//! A crawl can be described by a JSON document mirroring [`ScrapeOptions`].
//! JSON is used rather than a format without a null literal because an
//! explicit `"subdirectories": null` is meaningful and must survive loading.

use std::path::Path;

use crate::config::ScrapeOptions;
use crate::ConfigResult;

/// Loads and parses a JSON options document.
pub fn load_options(path: &Path) -> ConfigResult<ScrapeOptions> {
    let raw = std::fs::read_to_string(path)?;
    let options = serde_json::from_str(&raw)?;
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Setting;
    use crate::ConfigError;
    use std::io::Write;

    fn write_doc(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_minimal_document() {
        let file = write_doc(r#"{"urls": "http://example.com"}"#);
        let options = load_options(file.path()).unwrap();
        assert_eq!(options.urls.into_entries()[0].url(), "http://example.com");
        assert!(!options.recursive);
    }

    #[test]
    fn loads_explicit_null_subdirectories() {
        let file = write_doc(
            r#"{"urls": "http://example.com", "subdirectories": null, "recursive": true}"#,
        );
        let options = load_options(file.path()).unwrap();
        assert_eq!(options.subdirectories, Setting::Null);
        assert!(options.recursive);
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = load_options(Path::new("/nonexistent/options.json"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn malformed_document_is_parse_error() {
        let file = write_doc("{not json");
        let result = load_options(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
