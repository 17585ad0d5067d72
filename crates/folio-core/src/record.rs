//! The persisted magazine record.
//!
//! A record stores the document twice: `content` is the flattened HTML the
//! public reader renders without any editor model, and `editor_pages` is
//! the structured page list the editor re-opens. Older records may carry
//! only `content`.

use crate::emitter::emit_content;
use crate::model::Page;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishStatus {
    #[default]
    Draft,
    Published,
}

/// Who saved the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedRecord {
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor_pages: Option<Vec<Page>>,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(default)]
    pub status: PublishStatus,
}

impl PersistedRecord {
    /// Build a record from structured pages; `content` and `slug` are
    /// derived.
    pub fn from_pages(title: &str, pages: &[Page]) -> Self {
        Self {
            title: title.to_string(),
            slug: slugify(title),
            category: None,
            cover_image_url: None,
            content: emit_content(pages),
            editor_pages: Some(pages.to_vec()),
            author: None,
            status: PublishStatus::Draft,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// URL slug for a title: lowercase alphanumerics separated by single
/// dashes. Falls back to `untitled`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::PageId;
    use pretty_assertions::assert_eq;

    #[test]
    fn slugs() {
        assert_eq!(slugify("Spring Issue: 2026!"), "spring-issue-2026");
        assert_eq!(slugify("  --  "), "untitled");
        assert_eq!(slugify("Café Culture"), "café-culture");
    }

    #[test]
    fn record_json_uses_camel_case() {
        let pages = vec![Page::blank(PageId(1)), Page::blank(PageId(2))];
        let mut record = PersistedRecord::from_pages("Hello", &pages);
        record.cover_image_url = Some("https://cdn.example/cover.jpg".into());
        let json = record.to_json().unwrap();
        assert!(json.contains(r#""coverImageUrl":"https://cdn.example/cover.jpg""#));
        assert!(json.contains(r##""editorPages":[{"id":1,"backgroundColor":"#ffffff","layers":[]}"##));
        assert!(json.contains(r#""status":"draft""#));
        assert_eq!(PersistedRecord::from_json(&json).unwrap(), record);
    }

    #[test]
    fn legacy_record_without_pages() {
        let record = PersistedRecord::from_json(r#"{"title":"Old","content":"<p>x</p>"}"#).unwrap();
        assert!(record.editor_pages.is_none());
        assert_eq!(record.status, PublishStatus::Draft);
        assert_eq!(record.slug, "");
    }
}
