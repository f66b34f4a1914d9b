use agegate_types::{FieldValue, KeywordMatch, ListItem, Submission};

/// Terms flagged as adult content when no list is configured.
pub const DEFAULT_RESTRICTED_TERMS: &[&str] =
    &["sex", "nude", "porn", "drugs", "xxx", "adult", "nsfw"];

/// Submission fields scanned when no list is configured, in scan order.
pub const DEFAULT_SCANNED_FIELDS: &[&str] =
    &["content", "caption", "text", "title", "description", "texts"];

/// Case-insensitive restricted-term scanner over a fixed set of fields.
///
/// The scan stops at the first matching field or array element, so a
/// submission reports at most one term even when it contains several. Callers
/// must not treat the match as a complete list of violations.
#[derive(Clone, Debug)]
pub struct KeywordScanner {
    /// Lowercased, in caller order. The first matching term wins.
    terms: Vec<String>,
    fields: Vec<String>,
}

impl KeywordScanner {
    pub fn new<T, F>(terms: T, fields: F) -> Self
    where
        T: IntoIterator,
        T::Item: AsRef<str>,
        F: IntoIterator,
        F::Item: Into<String>,
    {
        Self {
            terms: terms
                .into_iter()
                .map(|t| t.as_ref().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Find the first restricted term in the submission.
    pub fn scan(&self, submission: &Submission) -> Option<KeywordMatch> {
        for field in &self.fields {
            match submission.get(field) {
                Some(FieldValue::Text(text)) => {
                    if let Some(term) = self.first_term_in(text) {
                        return Some(KeywordMatch {
                            term: term.to_string(),
                            field: field.clone(),
                            element: None,
                        });
                    }
                }
                Some(FieldValue::List(items)) => {
                    for (index, item) in items.iter().enumerate() {
                        if let Some(term) = self.first_term_in(item.text()) {
                            return Some(KeywordMatch {
                                term: term.to_string(),
                                field: field.clone(),
                                element: Some(index),
                            });
                        }
                    }
                }
                Some(FieldValue::Other(_)) | None => {}
            }
        }
        None
    }

    /// All scanned field values joined by spaces, in field order.
    ///
    /// Array elements are normalised the same way the scan normalises them.
    /// Empty values are skipped.
    pub fn scanned_text(&self, submission: &Submission) -> String {
        let mut parts: Vec<&str> = Vec::new();
        for field in &self.fields {
            match submission.get(field) {
                Some(FieldValue::Text(text)) => parts.push(text),
                Some(FieldValue::List(items)) => parts.extend(items.iter().map(ListItem::text)),
                Some(FieldValue::Other(_)) | None => {}
            }
        }
        parts.retain(|p| !p.is_empty());
        parts.join(" ")
    }

    fn first_term_in(&self, text: &str) -> Option<&str> {
        if text.is_empty() {
            return None;
        }
        let haystack = text.to_lowercase();
        self.terms
            .iter()
            .find(|term| haystack.contains(term.as_str()))
            .map(String::as_str)
    }
}

impl Default for KeywordScanner {
    fn default() -> Self {
        Self::new(
            DEFAULT_RESTRICTED_TERMS.iter().copied(),
            DEFAULT_SCANNED_FIELDS.iter().copied(),
        )
    }
}
