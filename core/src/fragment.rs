use crate::error::FragmentError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type FragmentId = u32;

/// Kind of documentation unit a fragment was cut from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Section,
    Page,
    Text,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Section => "section",
            Category::Page => "page",
            Category::Text => "text",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = FragmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "section" => Ok(Category::Section),
            "page" => Ok(Category::Page),
            "text" => Ok(Category::Text),
            _ => Err(FragmentError::UnknownCategory(s.to_string())),
        }
    }
}

/// One indexable unit of documentation text tied to a page location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub id: FragmentId,
    pub location: String,
    pub page: String,
    pub title: String,
    pub text: String,
    pub category: Category,
}

/// Raw record as emitted by the documentation generator. Every field is
/// optional so a single bad entry does not fail the whole input file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentRecord {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl FragmentRecord {
    pub fn new(location: &str, page: &str, title: &str, text: &str, category: Category) -> Self {
        Self {
            location: Some(location.to_string()),
            page: Some(page.to_string()),
            title: Some(title.to_string()),
            text: Some(text.to_string()),
            category: Some(category.as_str().to_string()),
        }
    }

    /// Validate the record and turn it into a fragment with the given id.
    /// A missing category defaults to `text`.
    pub fn into_fragment(self, id: FragmentId) -> Result<Fragment, FragmentError> {
        let location = match self.location {
            Some(l) if !l.trim().is_empty() => l,
            _ => return Err(FragmentError::MissingLocation),
        };
        let title = self.title.unwrap_or_default();
        let text = self.text.unwrap_or_default();
        if title.trim().is_empty() && text.trim().is_empty() {
            return Err(FragmentError::EmptyContent);
        }
        let category = match self.category {
            Some(c) => c.parse()?,
            None => Category::Text,
        };
        Ok(Fragment { id, location, page: self.page.unwrap_or_default(), title, text, category })
    }
}

impl From<&Fragment> for FragmentRecord {
    fn from(f: &Fragment) -> Self {
        FragmentRecord::new(&f.location, &f.page, &f.title, &f.text, f.category)
    }
}

/// A record rejected during ingestion. `position` is its index in the input sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFragment {
    pub position: usize,
    pub location: Option<String>,
    pub reason: FragmentError,
}

/// Arena of immutable fragments indexed by dense id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentStore {
    fragments: Vec<Fragment>,
}

impl FragmentStore {
    /// Accept records in input order, assigning ids `0..n` to the valid ones.
    pub fn ingest<I>(records: I) -> (Self, Vec<SkippedFragment>)
    where
        I: IntoIterator<Item = FragmentRecord>,
    {
        let mut fragments = Vec::new();
        let mut skipped = Vec::new();
        for (position, record) in records.into_iter().enumerate() {
            let location = record.location.clone();
            match record.into_fragment(fragments.len() as FragmentId) {
                Ok(fragment) => fragments.push(fragment),
                Err(reason) => {
                    tracing::warn!(position, ?location, %reason, "skipping malformed fragment");
                    skipped.push(SkippedFragment { position, location, reason });
                }
            }
        }
        (Self { fragments }, skipped)
    }

    pub fn get(&self, id: FragmentId) -> Option<&Fragment> {
        self.fragments.get(id as usize)
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Fragment> {
        self.fragments.iter()
    }

    pub fn as_slice(&self) -> &[Fragment] {
        &self.fragments
    }

    /// True when every fragment's id equals its position.
    pub(crate) fn ids_are_dense(&self) -> bool {
        self.fragments.iter().enumerate().all(|(i, f)| f.id as usize == i)
    }
}

impl<'a> IntoIterator for &'a FragmentStore {
    type Item = &'a Fragment;
    type IntoIter = std::slice::Iter<'a, Fragment>;

    fn into_iter(self) -> Self::IntoIter {
        self.fragments.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingest_assigns_dense_ids_and_skips_bad_records() {
        let records = vec![
            FragmentRecord::new("a/#x", "A", "Alpha", "", Category::Section),
            FragmentRecord { location: None, title: Some("orphan".into()), ..Default::default() },
            FragmentRecord::new("b/", "B", "", "   ", Category::Page),
            FragmentRecord::new("c/", "C", "Gamma", "body", Category::Text),
        ];
        let (store, skipped) = FragmentStore::ingest(records);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(0).unwrap().location, "a/#x");
        assert_eq!(store.get(1).unwrap().location, "c/");
        assert_eq!(store.get(1).unwrap().id, 1);
        assert_eq!(skipped.len(), 2);
        assert_eq!(skipped[0].position, 1);
        assert_eq!(skipped[0].reason, FragmentError::MissingLocation);
        assert_eq!(skipped[1].reason, FragmentError::EmptyContent);
    }

    #[test]
    fn unknown_category_is_rejected() {
        let mut rec = FragmentRecord::new("a/", "A", "t", "x", Category::Page);
        rec.category = Some("chapter".into());
        assert_eq!(rec.into_fragment(0), Err(FragmentError::UnknownCategory("chapter".into())));
    }

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!("Section".parse::<Category>().unwrap(), Category::Section);
        assert_eq!(Category::Page.to_string(), "page");
    }
}
