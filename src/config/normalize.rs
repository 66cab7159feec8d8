//! Option normalization
//!
//! Turns raw, partially specified caller options into a complete
//! [`CrawlConfig`]:
//! - merges the defaults source under caller values
//! - extends `sources` with link-following rules when `recursive` is set
//! - preserves an explicit `subdirectories: null` instead of defaulting it
//! - merges the request configuration two levels deep
//! - wraps single-URL shorthand into a one-element sequence
//! - resolves a relative output directory against the working directory
//!
//! Invalid shapes fail with a [`ConfigError`] before any network activity.

use std::collections::HashSet;

use url::Url;

use crate::config::types::{CrawlConfig, ScrapeOptions, SeedDescriptor, Setting, SubdirectoryRule};
use crate::config::validation::validate;
use crate::config::{link_follow_rules, Defaults};
use crate::{ConfigError, ConfigResult};

/// Normalizes `options` against `defaults`, producing the immutable crawl
/// configuration.
pub fn normalize(options: ScrapeOptions, defaults: &Defaults) -> ConfigResult<CrawlConfig> {
    let urls = normalize_urls(options.urls)?;

    let default_filename = options
        .default_filename
        .unwrap_or_else(|| defaults.default_filename.clone());

    let mut sources = options.sources.unwrap_or_else(|| defaults.sources.clone());
    let mut link_rule_indices = HashSet::new();
    if options.recursive {
        for link_rule in link_follow_rules() {
            match sources.iter().position(|rule| *rule == link_rule) {
                // Caller already follows links with this rule; do not duplicate.
                Some(existing) => {
                    link_rule_indices.insert(existing);
                }
                None => {
                    sources.push(link_rule);
                    link_rule_indices.insert(sources.len() - 1);
                }
            }
        }
    }

    let subdirectories = match options.subdirectories {
        Setting::Unset => defaults.subdirectories.clone(),
        Setting::Null => None,
        Setting::Value(rules) => Some(rules),
    }
    .map(normalize_subdirectories);

    let request = defaults.request.merged_with(&options.request);

    let absolute_directory_path = match &options.directory {
        Some(dir) if dir.is_absolute() => Some(dir.clone()),
        Some(dir) => Some(std::env::current_dir()?.join(dir)),
        None => None,
    };

    let config = CrawlConfig {
        urls,
        directory: options.directory,
        absolute_directory_path,
        default_filename,
        sources,
        link_rule_indices,
        subdirectories,
        request,
        recursive: options.recursive,
        max_depth: options.max_depth,
        concurrency: options.concurrency.unwrap_or(defaults.concurrency),
    };

    validate(&config)?;
    Ok(config)
}

fn normalize_urls(input: crate::config::UrlInput) -> ConfigResult<Vec<SeedDescriptor>> {
    let entries = input.into_entries();
    let mut urls = Vec::with_capacity(entries.len());

    for entry in entries {
        let parsed = Url::parse(entry.url()).map_err(|e| ConfigError::InvalidUrl {
            url: entry.url().to_string(),
            message: e.to_string(),
        })?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ConfigError::InvalidUrl {
                url: entry.url().to_string(),
                message: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        urls.push(SeedDescriptor {
            url: parsed,
            filename: entry.filename().map(str::to_string),
        });
    }

    Ok(urls)
}

/// Lowercases extensions and guarantees a leading dot, so routing can compare
/// them verbatim against extensions derived from filenames.
fn normalize_subdirectories(rules: Vec<SubdirectoryRule>) -> Vec<SubdirectoryRule> {
    rules
        .into_iter()
        .map(|rule| SubdirectoryRule {
            directory: rule.directory,
            extensions: rule
                .extensions
                .into_iter()
                .map(|ext| {
                    let ext = ext.to_ascii_lowercase();
                    if ext.starts_with('.') {
                        ext
                    } else {
                        format!(".{ext}")
                    }
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RequestConfig, RequestOverrides, SourceRule, UrlInput};
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn test_defaults() -> Defaults {
        Defaults {
            default_filename: "dummyFilename.txt".to_string(),
            sources: vec![
                SourceRule::new("img", "src"),
                SourceRule::new("link[rel=\"stylesheet\"]", "href"),
            ],
            subdirectories: Some(vec![SubdirectoryRule::new("dir", &[".txt"])]),
            request: RequestConfig {
                headers: BTreeMap::from([("accept".to_string(), "text/html".to_string())]),
                timeout_secs: 30,
                connect_timeout_secs: 10,
                redirect_limit: 10,
            },
            concurrency: 4,
        }
    }

    fn options_with_urls() -> ScrapeOptions {
        ScrapeOptions {
            urls: UrlInput::from("http://example.com"),
            ..Default::default()
        }
    }

    #[test]
    fn uses_default_filename_when_none_passed() {
        let config = normalize(options_with_urls(), &test_defaults()).unwrap();
        assert_eq!(config.default_filename, "dummyFilename.txt");
    }

    #[test]
    fn uses_passed_default_filename() {
        let options = ScrapeOptions {
            default_filename: Some("myNewFileName.txt".to_string()),
            ..options_with_urls()
        };
        let config = normalize(options, &test_defaults()).unwrap();
        assert_eq!(config.default_filename, "myNewFileName.txt");
    }

    #[test]
    fn uses_default_sources_when_none_passed() {
        let defaults = test_defaults();
        let config = normalize(options_with_urls(), &defaults).unwrap();
        assert_eq!(config.sources, defaults.sources);
    }

    #[test]
    fn uses_passed_sources() {
        let options = ScrapeOptions {
            sources: Some(vec![SourceRule::new("img", "src")]),
            ..options_with_urls()
        };
        let config = normalize(options, &test_defaults()).unwrap();
        assert_eq!(config.sources, vec![SourceRule::new("img", "src")]);
    }

    #[test]
    fn extends_sources_when_recursive() {
        let options = ScrapeOptions {
            sources: Some(vec![SourceRule::new("img", "src")]),
            recursive: true,
            ..options_with_urls()
        };
        let config = normalize(options, &test_defaults()).unwrap();

        assert_eq!(config.sources.len(), 2);
        assert!(config.sources.contains(&SourceRule::new("img", "src")));
        assert!(config.sources.contains(&SourceRule::new("a", "href")));
        assert!(config.is_link_rule(1));
        assert!(!config.is_link_rule(0));
    }

    #[test]
    fn does_not_duplicate_link_rule_when_recursive() {
        let options = ScrapeOptions {
            sources: Some(vec![
                SourceRule::new("a", "href"),
                SourceRule::new("img", "src"),
            ]),
            recursive: true,
            ..options_with_urls()
        };
        let config = normalize(options, &test_defaults()).unwrap();

        assert_eq!(config.sources.len(), 2);
        assert!(config.is_link_rule(0));
        assert!(!config.is_link_rule(1));
    }

    #[test]
    fn no_link_rules_when_not_recursive() {
        let config = normalize(options_with_urls(), &test_defaults()).unwrap();
        assert!(config.link_rule_indices.is_empty());
    }

    #[test]
    fn uses_default_subdirectories_when_unset() {
        let defaults = test_defaults();
        let config = normalize(options_with_urls(), &defaults).unwrap();
        assert_eq!(config.subdirectories, defaults.subdirectories);
    }

    #[test]
    fn uses_passed_subdirectories() {
        let options = ScrapeOptions {
            subdirectories: Setting::Value(vec![SubdirectoryRule::new("js", &[".js"])]),
            ..options_with_urls()
        };
        let config = normalize(options, &test_defaults()).unwrap();
        assert_eq!(
            config.subdirectories,
            Some(vec![SubdirectoryRule::new("js", &[".js"])])
        );
    }

    #[test]
    fn preserves_explicit_null_subdirectories() {
        let options = ScrapeOptions {
            subdirectories: Setting::Null,
            ..options_with_urls()
        };
        let config = normalize(options, &test_defaults()).unwrap();
        assert_eq!(config.subdirectories, None);
    }

    #[test]
    fn normalizes_subdirectory_extensions() {
        let options = ScrapeOptions {
            subdirectories: Setting::Value(vec![SubdirectoryRule::new("img", &["PNG", ".JPG"])]),
            ..options_with_urls()
        };
        let config = normalize(options, &test_defaults()).unwrap();
        assert_eq!(
            config.subdirectories,
            Some(vec![SubdirectoryRule::new("img", &[".png", ".jpg"])])
        );
    }

    #[test]
    fn uses_default_request_when_none_passed() {
        let defaults = test_defaults();
        let config = normalize(options_with_urls(), &defaults).unwrap();
        assert_eq!(config.request, defaults.request);
    }

    #[test]
    fn merges_passed_request_with_defaults() {
        let options = ScrapeOptions {
            request: RequestOverrides {
                headers: Some(BTreeMap::from([(
                    "user-agent".to_string(),
                    "Mozilla/5.0 (Linux; Android 4.2.1;".to_string(),
                )])),
                ..Default::default()
            },
            ..options_with_urls()
        };
        let config = normalize(options, &test_defaults()).unwrap();

        // Defaults survive where the caller said nothing.
        assert_eq!(config.request.timeout_secs, 30);
        assert_eq!(
            config.request.headers.get("accept").map(String::as_str),
            Some("text/html")
        );
        assert_eq!(
            config.request.headers.get("user-agent").map(String::as_str),
            Some("Mozilla/5.0 (Linux; Android 4.2.1;")
        );
    }

    #[test]
    fn overrides_existing_request_fields() {
        let options = ScrapeOptions {
            request: RequestOverrides {
                timeout_secs: Some(555),
                ..Default::default()
            },
            ..options_with_urls()
        };
        let config = normalize(options, &test_defaults()).unwrap();
        assert_eq!(config.request.timeout_secs, 555);
        assert_eq!(config.request.connect_timeout_secs, 10);
    }

    #[test]
    fn wraps_single_url_string() {
        let config = normalize(options_with_urls(), &test_defaults()).unwrap();
        assert_eq!(config.urls.len(), 1);
        assert_eq!(config.urls[0].url, Url::parse("http://example.com").unwrap());
    }

    #[test]
    fn preserves_seed_order_and_filenames() {
        let options = ScrapeOptions {
            urls: serde_json::from_str(
                r#"["http://first-url.com",
                    {"url": "http://second-url.com"},
                    {"url": "http://third-url.com", "filename": "third.html"}]"#,
            )
            .unwrap(),
            ..Default::default()
        };
        let config = normalize(options, &test_defaults()).unwrap();

        assert_eq!(config.urls.len(), 3);
        assert_eq!(config.urls[0].url, Url::parse("http://first-url.com").unwrap());
        assert_eq!(config.urls[0].filename, None);
        assert_eq!(config.urls[1].url, Url::parse("http://second-url.com").unwrap());
        assert_eq!(config.urls[2].filename, Some("third.html".to_string()));
    }

    #[test]
    fn resolves_relative_directory_against_cwd() {
        let options = ScrapeOptions {
            directory: Some(PathBuf::from("my/relative/path")),
            ..options_with_urls()
        };
        let config = normalize(options, &test_defaults()).unwrap();

        let expected = std::env::current_dir().unwrap().join("my/relative/path");
        assert_eq!(config.absolute_directory_path, Some(expected));
    }

    #[test]
    fn keeps_absolute_directory() {
        let options = ScrapeOptions {
            directory: Some(PathBuf::from("/my/absolute/path")),
            ..options_with_urls()
        };
        let config = normalize(options, &test_defaults()).unwrap();
        assert_eq!(
            config.absolute_directory_path,
            Some(PathBuf::from("/my/absolute/path"))
        );
    }

    #[test]
    fn leaves_absolute_path_unset_without_directory() {
        let config = normalize(options_with_urls(), &test_defaults()).unwrap();
        assert_eq!(config.directory, None);
        assert_eq!(config.absolute_directory_path, None);
    }

    #[test]
    fn rejects_empty_urls() {
        let options = ScrapeOptions::default();
        let result = normalize(options, &test_defaults());
        assert!(matches!(result, Err(ConfigError::NoUrls)));
    }

    #[test]
    fn rejects_malformed_url() {
        let options = ScrapeOptions {
            urls: UrlInput::from("not a url"),
            ..Default::default()
        };
        let result = normalize(options, &test_defaults());
        assert!(matches!(result, Err(ConfigError::InvalidUrl { .. })));
    }

    #[test]
    fn rejects_non_http_scheme() {
        let options = ScrapeOptions {
            urls: UrlInput::from("ftp://example.com/file"),
            ..Default::default()
        };
        let result = normalize(options, &test_defaults());
        assert!(matches!(result, Err(ConfigError::InvalidUrl { .. })));
    }

    #[test]
    fn rejects_invalid_selector() {
        let options = ScrapeOptions {
            sources: Some(vec![SourceRule::new("img[", "src")]),
            ..options_with_urls()
        };
        let result = normalize(options, &test_defaults());
        assert!(matches!(result, Err(ConfigError::InvalidSelector { .. })));
    }

    #[test]
    fn rejects_zero_concurrency() {
        let options = ScrapeOptions {
            concurrency: Some(0),
            ..options_with_urls()
        };
        let result = normalize(options, &test_defaults());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }
}
