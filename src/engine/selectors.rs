//! Selector-fallback resolution
//!
//! The target application's markup is unstable by nature, so every "find
//! this thing on the page" operation goes through one primitive: an
//! ordered candidate list per semantic field, tried most-specific-first,
//! where the first candidate producing a match wins. Content extraction,
//! the login probe, and comment interaction all funnel through here.

use chromiumoxide::{Element, Page};
use std::time::Duration;
use tokio::time::Instant;

use super::error::EngineError;

/// Re-check cadence while waiting for a candidate to appear
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Ordered candidate locators for one semantic field
#[derive(Debug, Clone, Copy)]
pub struct SelectorGroup {
    pub field: &'static str,
    pub candidates: &'static [&'static str],
}

/// Outcome of a resolution attempt.
///
/// `NotFound` is deliberate and distinct from an error: field extraction
/// absorbs it into a sentinel default, while required interactive controls
/// escalate it via [`Resolve::required`].
pub enum Resolve<T> {
    Found { value: T, selector: &'static str },
    NotFound,
}

impl<T> Resolve<T> {
    pub fn found(self) -> Option<(T, &'static str)> {
        match self {
            Resolve::Found { value, selector } => Some((value, selector)),
            Resolve::NotFound => None,
        }
    }

    /// Escalate a miss on a control the operation cannot proceed without
    pub fn required(self, field: &'static str) -> Result<T, EngineError> {
        match self {
            Resolve::Found { value, .. } => Ok(value),
            Resolve::NotFound => Err(EngineError::ElementNotFound { field }),
        }
    }
}

/// Resolve the first matching element for `group`, polling until `timeout`.
///
/// Candidates are evaluated strictly in order on every pass; the first one
/// with a match is returned without evaluating the rest.
pub async fn resolve_first(page: &Page, group: &SelectorGroup, timeout: Duration) -> Resolve<Element> {
    let deadline = Instant::now() + timeout;
    loop {
        for &selector in group.candidates {
            if let Ok(element) = page.find_element(selector).await {
                return Resolve::Found {
                    value: element,
                    selector,
                };
            }
        }
        if Instant::now() >= deadline {
            return Resolve::NotFound;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Resolve every element matched by the first candidate that matches
/// anything at all. The winning candidate is used for the entire result —
/// matches are never merged across candidates.
pub async fn resolve_all(
    page: &Page,
    group: &SelectorGroup,
    timeout: Duration,
) -> Resolve<Vec<Element>> {
    let deadline = Instant::now() + timeout;
    loop {
        for &selector in group.candidates {
            if let Ok(elements) = page.find_elements(selector).await {
                if !elements.is_empty() {
                    return Resolve::Found {
                        value: elements,
                        selector,
                    };
                }
            }
        }
        if Instant::now() >= deadline {
            return Resolve::NotFound;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Single-pass resolution scoped to an already-matched container element
pub async fn resolve_scoped(scope: &Element, group: &SelectorGroup) -> Resolve<Element> {
    for &selector in group.candidates {
        if let Ok(element) = scope.find_element(selector).await {
            return Resolve::Found {
                value: element,
                selector,
            };
        }
    }
    Resolve::NotFound
}

/// Candidate tables, most specific and most stable first.
pub mod groups {
    use super::SelectorGroup;

    pub const LOGIN_PROMPT: SelectorGroup = SelectorGroup {
        field: "login-prompt",
        candidates: &[".login-container", ".login-btn", "#login-btn", ".sign-in"],
    };

    pub const NOTE_TITLE: SelectorGroup = SelectorGroup {
        field: "title",
        candidates: &["#detail-title", ".note-content .title", ".title"],
    };

    pub const NOTE_AUTHOR: SelectorGroup = SelectorGroup {
        field: "author",
        candidates: &[
            ".author-container .username",
            ".author-wrapper .username",
            ".info .name",
            ".user-nickname",
        ],
    };

    pub const NOTE_DATE: SelectorGroup = SelectorGroup {
        field: "published_at",
        candidates: &[".bottom-container .date", ".note-content .date", ".publish-time", "time"],
    };

    pub const NOTE_BODY: SelectorGroup = SelectorGroup {
        field: "body",
        candidates: &["#detail-desc", ".note-content .desc", ".desc"],
    };

    pub const COMMENT_CONTAINERS: SelectorGroup = SelectorGroup {
        field: "comments",
        candidates: &[
            ".comments-container .comment-item",
            ".comment-item",
            ".comment-list .comment",
        ],
    };

    pub const COMMENT_AUTHOR: SelectorGroup = SelectorGroup {
        field: "comment_author",
        candidates: &[".author-wrapper .name", ".author .name", ".user-name", ".nickname"],
    };

    pub const COMMENT_BODY: SelectorGroup = SelectorGroup {
        field: "comment_body",
        candidates: &[".content .note-text", ".note-text", ".comment-text", ".content"],
    };

    pub const COMMENT_DATE: SelectorGroup = SelectorGroup {
        field: "comment_date",
        candidates: &[".info .date", ".date", ".time"],
    };

    pub const SEARCH_CARDS: SelectorGroup = SelectorGroup {
        field: "search_cards",
        candidates: &["section.note-item", ".note-item", ".feeds-container section"],
    };

    pub const CARD_LINK: SelectorGroup = SelectorGroup {
        field: "card_link",
        candidates: &["a.cover", "a[href*='/explore/']", "a"],
    };

    pub const CARD_TITLE: SelectorGroup = SelectorGroup {
        field: "card_title",
        candidates: &[".footer .title span", ".footer .title", ".title"],
    };

    pub const COMMENT_INPUT: SelectorGroup = SelectorGroup {
        field: "comment_input",
        candidates: &[
            "#content-textarea",
            ".content-input",
            "[contenteditable='true']",
            ".comment-input",
        ],
    };

    pub const COMMENT_SUBMIT: SelectorGroup = SelectorGroup {
        field: "comment_submit",
        candidates: &[".submit", "button.submit", ".btn-submit"],
    };
}

#[cfg(test)]
mod tests {
    use super::groups;
    use super::SelectorGroup;

    const ALL: &[SelectorGroup] = &[
        groups::LOGIN_PROMPT,
        groups::NOTE_TITLE,
        groups::NOTE_AUTHOR,
        groups::NOTE_DATE,
        groups::NOTE_BODY,
        groups::COMMENT_CONTAINERS,
        groups::COMMENT_AUTHOR,
        groups::COMMENT_BODY,
        groups::COMMENT_DATE,
        groups::SEARCH_CARDS,
        groups::CARD_LINK,
        groups::CARD_TITLE,
        groups::COMMENT_INPUT,
        groups::COMMENT_SUBMIT,
    ];

    #[test]
    fn every_group_has_ordered_nonempty_candidates() {
        for group in ALL {
            assert!(!group.candidates.is_empty(), "{} has no candidates", group.field);
            for (i, a) in group.candidates.iter().enumerate() {
                for b in &group.candidates[i + 1..] {
                    assert_ne!(a, b, "{} repeats candidate {a}", group.field);
                }
            }
        }
    }

    #[test]
    fn field_names_are_unique() {
        for (i, a) in ALL.iter().enumerate() {
            for b in &ALL[i + 1..] {
                assert_ne!(a.field, b.field);
            }
        }
    }
}
