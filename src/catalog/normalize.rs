//! Title clean-up for catalog records

use regex::Regex;
use std::sync::LazyLock;

/// Bengali digits followed by optional dots, dashes and whitespace
static NUMERAL_PREFIX: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^[\x{09E6}-\x{09EF}]+[.\-\s]*")
        .map_err(|e| tracing::warn!(error = %e, "numeral prefix pattern did not compile"))
        .ok()
});

const TITLE_AUTHOR_SEPARATOR: char = '–';

/// Remove a leading Bengali chapter number such as `১২. ` from a title
pub fn strip_numeral_prefix(title: &str) -> String {
    let title = title.trim();
    match NUMERAL_PREFIX.as_ref() {
        Some(re) => re.replace(title, "").trim().to_string(),
        None => title.to_string(),
    }
}

/// Split a listing caption of the form `title – author`
///
/// Captions without the en dash have no author part.
pub fn split_listing_title(caption: &str) -> (String, Option<String>) {
    match caption.split_once(TITLE_AUTHOR_SEPARATOR) {
        Some((title, author)) => {
            let author = author.trim();
            (
                title.trim().to_string(),
                (!author.is_empty()).then(|| author.to_string()),
            )
        }
        None => (caption.trim().to_string(), None),
    }
}

/// Title part of a detail page heading, falling back to the whole heading
pub(crate) fn heading_title(heading: &str) -> String {
    let (title, _) = split_listing_title(heading);
    if title.is_empty() {
        heading.trim().to_string()
    } else {
        title
    }
}
