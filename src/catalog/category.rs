//! Category label → publisher category id

use crate::config::CategoryLabel;

/// Keyword rules applied when no label matches exactly, first match wins
const KEYWORD_RULES: &[(&str, i64)] = &[
    ("ইতিহাস", 1),
    ("কৌতুক", 2),
    ("উপন্যাস", 3),
    ("থ্রিলার রহস্য রোমাঞ্চ অ্যাডভেঞ্চার", 4),
    ("গল্পগ্রন্থ", 5),
    ("গল্পের বই", 5),
    ("ভ্রমণ কাহিনী", 6),
    ("বৈজ্ঞানিক কল্পকাহিনী", 9),
    ("ধর্ম ও দর্শন", 10),
    ("ইসলামিক বই", 10),
    ("ধর্মীয় বই", 10),
    ("সংস্কৃত", 10),
    ("কাব্যগ্রন্থ / কবিতা", 12),
    ("প্রবন্ধ ও গবেষণা", 13),
    ("রচনা", 13),
    ("কিশোর সাহিত্য", 14),
    ("আত্মজীবনী ও স্মৃতিকথা", 15),
    ("আত্মউন্নয়নমূলক বই", 15),
    ("নাটক", 16),
    ("গোয়েন্দা", 18),
    ("ভৌতিক", 19),
    ("হরর", 19),
    ("ভূতের বই", 19),
    ("Editor's Choice", 5),
];

/// Resolves a book's catalog labels to a publisher category id
///
/// Resolution order: an exact label from the table, then the keyword rules
/// against all labels joined by spaces, then the default id.
#[derive(Clone, Debug)]
pub struct CategoryResolver {
    table: Vec<CategoryLabel>,
    default_id: i64,
}

impl CategoryResolver {
    /// Resolver over the given label table
    pub fn new(table: Vec<CategoryLabel>, default_id: i64) -> Self {
        Self { table, default_id }
    }

    /// Id used when nothing matches
    pub fn default_id(&self) -> i64 {
        self.default_id
    }

    /// Resolve a label set
    pub fn resolve(&self, labels: &[String]) -> i64 {
        let joined = labels
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if joined.is_empty() {
            return self.default_id;
        }

        let exact = self.table.iter().find(|entry| {
            let label = entry.label.trim();
            label == joined || labels.iter().any(|l| l.trim() == label)
        });
        if let Some(entry) = exact {
            return entry.id;
        }

        KEYWORD_RULES
            .iter()
            .find(|(keyword, _)| joined.contains(keyword))
            .map(|(_, id)| *id)
            .unwrap_or(self.default_id)
    }
}
