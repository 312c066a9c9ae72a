//! Structured record extraction
//!
//! Extraction degrades gracefully per field: a missing title, author, or
//! date substitutes an explicit sentinel instead of failing the record.
//! The only wholesale misses are container-level (no comment containers,
//! no search cards), which yield empty collections.

use chromiumoxide::{Element, Page};
use serde::Serialize;
use std::collections::HashSet;
use std::time::Duration;

use super::selectors::{self, groups, SelectorGroup};

/// The application this engine browses
pub const TARGET_DOMAIN: &str = "xiaohongshu.com";

/// Home surface, also the auth-probe target
pub const HOME_URL: &str = "https://www.xiaohongshu.com";

pub const UNKNOWN_TITLE: &str = "无标题";
pub const UNKNOWN_AUTHOR: &str = "未知作者";
pub const UNKNOWN_DATE: &str = "未知时间";

/// Hard cap on comments returned per fetch
pub const MAX_COMMENTS: usize = 10;

/// Body text shorter than this is layout noise, not content
const MIN_BODY_CHARS: usize = 5;

/// Budget for one optional-field probe
const FIELD_TIMEOUT: Duration = Duration::from_secs(2);

/// Budget for locating the container set of a collection
const CONTAINER_TIMEOUT: Duration = Duration::from_secs(5);

/// Extracted post record. Always complete: absent fields carry sentinels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Note {
    pub url: String,
    pub title: String,
    pub author: String,
    pub published_at: String,
    pub body: String,
}

/// Extracted comment record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub author: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posted_at: Option<String>,
}

/// One search-result card
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteSummary {
    pub title: String,
    pub url: String,
}

/// Canonicalize a URL before it is used anywhere in the engine.
///
/// Strips a leading `@`, upgrades `http://` to `https://`, prefixes
/// `https://` when no scheme is present, and inserts the canonical `www.`
/// subdomain when the host is the bare target domain. Total and
/// idempotent: never fails, and a second application is a no-op.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_start_matches('@');

    let with_scheme = if let Some(rest) = trimmed.strip_prefix("http://") {
        format!("https://{rest}")
    } else if trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    match with_scheme.strip_prefix("https://") {
        Some(rest) if is_bare_target_host(rest) => format!("https://www.{rest}"),
        _ => with_scheme,
    }
}

/// True when the host is exactly the target domain with no subdomain
fn is_bare_target_host(rest: &str) -> bool {
    rest.strip_prefix(TARGET_DOMAIN)
        .is_some_and(|tail| tail.is_empty() || tail.starts_with('/') || tail.starts_with('?') || tail.starts_with(':'))
}

/// Extract the note on the current page.
///
/// Never fails: every field that cannot be resolved (or resolves to noise)
/// falls back to its sentinel, and the returned shape is always complete.
pub async fn extract_note(page: &Page, url: &str) -> Note {
    let title = read_field(page, &groups::NOTE_TITLE)
        .await
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string());
    let author = read_field(page, &groups::NOTE_AUTHOR)
        .await
        .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
    let published_at = read_field(page, &groups::NOTE_DATE)
        .await
        .unwrap_or_else(|| UNKNOWN_DATE.to_string());
    let body = read_field(page, &groups::NOTE_BODY)
        .await
        .filter(|text| text.chars().count() >= MIN_BODY_CHARS)
        .unwrap_or_default();

    Note {
        url: normalize_url(url),
        title,
        author,
        published_at,
        body,
    }
}

/// Extract up to `max_count` comments from the current page.
///
/// The first container selector that matches anything supplies every
/// container; results are never merged across selectors. A comment is
/// dropped only when author and body both came up empty.
pub async fn extract_comments(page: &Page, max_count: usize) -> Vec<Comment> {
    let Some((containers, selector)) =
        selectors::resolve_all(page, &groups::COMMENT_CONTAINERS, CONTAINER_TIMEOUT)
            .await
            .found()
    else {
        return Vec::new();
    };
    tracing::debug!(selector, matched = containers.len(), "comment containers resolved");

    let mut comments = Vec::new();
    for container in containers.into_iter().take(max_count) {
        let author = read_scoped(&container, &groups::COMMENT_AUTHOR)
            .await
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
        let body = read_scoped(&container, &groups::COMMENT_BODY)
            .await
            .unwrap_or_default();
        let posted_at = read_scoped(&container, &groups::COMMENT_DATE).await;

        if author == UNKNOWN_AUTHOR && body.is_empty() {
            continue;
        }
        comments.push(Comment {
            author,
            body,
            posted_at,
        });
    }
    comments
}

/// Extract search-result cards from the current page, deduplicated by
/// normalized URL (first-seen title wins) and truncated to `limit`.
pub async fn extract_search_results(page: &Page, limit: usize) -> Vec<NoteSummary> {
    let Some((cards, selector)) =
        selectors::resolve_all(page, &groups::SEARCH_CARDS, CONTAINER_TIMEOUT)
            .await
            .found()
    else {
        return Vec::new();
    };
    tracing::debug!(selector, matched = cards.len(), "search cards resolved");

    let mut raw = Vec::new();
    for card in cards {
        let Some(url) = card_href(&card).await else {
            // A card without a link cannot be acted on later; skip it.
            continue;
        };
        let title = read_scoped(&card, &groups::CARD_TITLE)
            .await
            .unwrap_or_else(|| UNKNOWN_TITLE.to_string());
        raw.push(NoteSummary { title, url });
    }

    dedup_by_url(raw, limit)
}

/// Normalize, drop repeat URLs keeping the first-seen title, truncate.
pub fn dedup_by_url(hits: Vec<NoteSummary>, limit: usize) -> Vec<NoteSummary> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for mut hit in hits {
        hit.url = normalize_url(&hit.url);
        if seen.insert(hit.url.clone()) {
            out.push(hit);
            if out.len() == limit {
                break;
            }
        }
    }
    out
}

async fn card_href(card: &Element) -> Option<String> {
    let (link, _) = selectors::resolve_scoped(card, &groups::CARD_LINK).await.found()?;
    let href = link.attribute("href").await.ok()??;
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    // Cards link relatively within the application.
    if href.starts_with('/') {
        Some(format!("{HOME_URL}{href}"))
    } else {
        Some(href.to_string())
    }
}

async fn read_field(page: &Page, group: &SelectorGroup) -> Option<String> {
    let (element, _) = selectors::resolve_first(page, group, FIELD_TIMEOUT).await.found()?;
    element_text(&element).await
}

async fn read_scoped(scope: &Element, group: &SelectorGroup) -> Option<String> {
    let (element, _) = selectors::resolve_scoped(scope, group).await.found()?;
    element_text(&element).await
}

async fn element_text(element: &Element) -> Option<String> {
    let text = element.inner_text().await.ok()??;
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn normalize_strips_leading_at() {
        assert_eq!(
            normalize_url("@https://www.xiaohongshu.com/explore/1"),
            "https://www.xiaohongshu.com/explore/1"
        );
    }

    #[test]
    fn normalize_upgrades_http() {
        assert_eq!(
            normalize_url("http://www.xiaohongshu.com/explore/1"),
            "https://www.xiaohongshu.com/explore/1"
        );
    }

    #[test]
    fn normalize_prefixes_missing_scheme() {
        assert_eq!(
            normalize_url("www.xiaohongshu.com/explore/1"),
            "https://www.xiaohongshu.com/explore/1"
        );
    }

    #[test]
    fn normalize_inserts_www_for_bare_domain() {
        assert_eq!(
            normalize_url("https://xiaohongshu.com/explore/1"),
            "https://www.xiaohongshu.com/explore/1"
        );
        assert_eq!(normalize_url("xiaohongshu.com"), "https://www.xiaohongshu.com");
    }

    #[test]
    fn normalize_leaves_subdomains_and_lookalikes_alone() {
        assert_eq!(
            normalize_url("https://m.xiaohongshu.com/x"),
            "https://m.xiaohongshu.com/x"
        );
        assert_eq!(
            normalize_url("https://xiaohongshu.company/x"),
            "https://xiaohongshu.company/x"
        );
    }

    #[test]
    fn dedup_keeps_first_seen_title() {
        let hits = vec![
            NoteSummary { title: "t1".into(), url: "https://www.xiaohongshu.com/explore/1".into() },
            NoteSummary { title: "t2".into(), url: "https://www.xiaohongshu.com/explore/2".into() },
            NoteSummary { title: "t3".into(), url: "http://xiaohongshu.com/explore/1".into() },
        ];
        let out = dedup_by_url(hits, 10);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].title, "t1");
        assert_eq!(out[0].url, "https://www.xiaohongshu.com/explore/1");
        assert_eq!(out[1].title, "t2");
    }

    #[test]
    fn dedup_truncates_to_limit() {
        let hits: Vec<_> = (0..8)
            .map(|i| NoteSummary {
                title: format!("t{i}"),
                url: format!("https://www.xiaohongshu.com/explore/{i}"),
            })
            .collect();
        let out = dedup_by_url(hits, 3);
        assert_eq!(out.len(), 3);
        assert_eq!(out[2].title, "t2");
    }

    proptest! {
        #[test]
        fn normalize_is_total_and_idempotent(raw in ".{0,80}") {
            let once = normalize_url(&raw);
            let twice = normalize_url(&once);
            prop_assert_eq!(&once, &twice);
            prop_assert!(once.starts_with("https://"));
        }
    }
}
