//! Request-payload validation
//!
//! Checks input shape before anything touches the browser. Violations are
//! `EngineError::Validation`, surfaced verbatim and never retried.

use crate::engine::{normalize_url, EngineError, TARGET_DOMAIN};

/// Characters rejected in search keywords
pub const FORBIDDEN_KEYWORD_CHARS: &[char] = &['<', '>', '"', '\'', '&', ';'];

const MAX_KEYWORDS_CHARS: usize = 50;
const MAX_COMMENT_CHARS: usize = 500;

/// Validate search keywords: 1–50 chars after trimming, none of the
/// forbidden characters. Returns the trimmed value.
pub fn keywords(raw: &str) -> Result<String, EngineError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation("关键词不能为空".into()));
    }
    if trimmed.chars().count() > MAX_KEYWORDS_CHARS {
        return Err(EngineError::Validation(format!(
            "关键词长度不能超过{MAX_KEYWORDS_CHARS}字符"
        )));
    }
    if trimmed.chars().any(|c| FORBIDDEN_KEYWORD_CHARS.contains(&c)) {
        return Err(EngineError::Validation("关键词包含非法字符".into()));
    }
    Ok(trimmed.to_string())
}

/// Validate a result limit: must be in [1, 20]
pub fn limit(raw: i64) -> Result<usize, EngineError> {
    if !(1..=20).contains(&raw) {
        return Err(EngineError::Validation("限制数量必须在1-20之间".into()));
    }
    usize::try_from(raw).map_err(|_| EngineError::Validation("限制数量必须在1-20之间".into()))
}

/// Validate comment text: 1–500 chars after trimming. Returns the trimmed
/// value.
pub fn comment(raw: &str) -> Result<String, EngineError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation("评论内容不能为空".into()));
    }
    if trimmed.chars().count() > MAX_COMMENT_CHARS {
        return Err(EngineError::Validation(format!(
            "评论长度不能超过{MAX_COMMENT_CHARS}字符"
        )));
    }
    Ok(trimmed.to_string())
}

/// Validate a note URL: must reference the target domain. Returns the
/// normalized URL.
pub fn note_url(raw: &str) -> Result<String, EngineError> {
    let normalized = normalize_url(raw);
    if !normalized.contains(TARGET_DOMAIN) {
        return Err(EngineError::Validation("无效的小红书URL".into()));
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn keywords_rejects_empty_and_whitespace() {
        assert!(keywords("").is_err());
        assert!(keywords("   ").is_err());
    }

    #[test]
    fn keywords_rejects_over_fifty_chars() {
        let long: String = "长".repeat(51);
        assert!(keywords(&long).is_err());
        let exactly: String = "长".repeat(50);
        assert_eq!(keywords(&exactly).unwrap(), exactly);
    }

    #[test]
    fn keywords_rejects_each_forbidden_char() {
        for c in FORBIDDEN_KEYWORD_CHARS {
            let input = format!("美食{c}");
            assert!(keywords(&input).is_err(), "accepted {c:?}");
        }
    }

    #[test]
    fn keywords_returns_trimmed_value() {
        assert_eq!(keywords("  美食攻略  ").unwrap(), "美食攻略");
    }

    #[test]
    fn limit_bounds_are_inclusive() {
        assert!(limit(0).is_err());
        assert!(limit(21).is_err());
        assert!(limit(-3).is_err());
        assert_eq!(limit(1).unwrap(), 1);
        assert_eq!(limit(20).unwrap(), 20);
    }

    #[test]
    fn comment_rejects_empty_and_oversized() {
        assert!(comment("").is_err());
        assert!(comment("  \n ").is_err());
        assert!(comment(&"赞".repeat(501)).is_err());
        assert_eq!(comment("  写得真好  ").unwrap(), "写得真好");
    }

    #[test]
    fn note_url_requires_target_domain() {
        assert!(note_url("https://example.com/explore/1").is_err());
        assert_eq!(
            note_url("xiaohongshu.com/explore/1").unwrap(),
            "https://www.xiaohongshu.com/explore/1"
        );
    }

    proptest! {
        #[test]
        fn clean_keywords_in_range_always_accepted(input in "[a-z0-9美食旅行]{1,50}") {
            let accepted = keywords(&input).unwrap();
            prop_assert_eq!(accepted, input.trim().to_string());
        }

        #[test]
        fn keywords_never_panics(input in ".{0,120}") {
            let _ = keywords(&input);
        }
    }
}
