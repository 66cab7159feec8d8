//! Source pipeline: rule-driven extraction of child references
//!
//! Each source rule is a (selector, attribute) pair. Rules are applied in
//! declaration order and each rule's matches are emitted in document order,
//! so the overall emission order is rule order outer, document order inner
//! and is reproducible across runs for the same content.
//!
//! The pipeline holds no state across resources and is safe to run for
//! independent resources concurrently.

use scraper::{Html, Selector};
use url::Url;

use crate::config::SourceRule;
use crate::ExtractionError;

/// A raw child reference emitted by the pipeline
///
/// `raw` is the attribute value as found in the document; it still needs to
/// be resolved against the parent resource's URL. `rule_index` points into
/// the rule set that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedRef {
    pub raw: String,
    pub rule_index: usize,
}

/// Applies `rules` to `html` and returns every discovered reference.
///
/// Selectors are validated at configuration time, so a compile failure here
/// is unexpected; it is reported as an [`ExtractionError`] and the caller
/// treats the resource as resolved with zero children.
pub fn extract_references(
    html: &str,
    rules: &[SourceRule],
) -> std::result::Result<Vec<ExtractedRef>, ExtractionError> {
    let document = Html::parse_document(html);
    let mut refs = Vec::new();

    for (rule_index, rule) in rules.iter().enumerate() {
        let selector = Selector::parse(&rule.selector).map_err(|e| ExtractionError {
            selector: rule.selector.clone(),
            message: e.to_string(),
        })?;

        for element in document.select(&selector) {
            if let Some(value) = element.value().attr(&rule.attr) {
                let value = value.trim();
                if !value.is_empty() {
                    refs.push(ExtractedRef {
                        raw: value.to_string(),
                        rule_index,
                    });
                }
            }
        }
    }

    Ok(refs)
}

/// Resolves a raw reference against its parent resource's URL.
///
/// Returns `None` for references that cannot become fetchable resources:
/// - empty and fragment-only references
/// - `javascript:`, `mailto:`, `tel:` and `data:` schemes
/// - anything that does not resolve to an http(s) URL
///
/// Fragments are stripped from the result so that identical targets
/// deduplicate in the visited set.
pub fn resolve_reference(parent: &Url, raw: &str) -> Option<Url> {
    let raw = raw.trim();

    if raw.is_empty() || raw.starts_with('#') {
        return None;
    }

    if raw.starts_with("javascript:")
        || raw.starts_with("mailto:")
        || raw.starts_with("tel:")
        || raw.starts_with("data:")
    {
        return None;
    }

    let mut resolved = parent.join(raw).ok()?;
    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return None;
    }

    resolved.set_fragment(None);
    Some(resolved)
}
