//! Comment submission
//!
//! Locate the comment input, type, submit. Success means a submission path
//! completed without raising — there is no server-side confirmation that
//! the comment was accepted; that gap is inherited from the application's
//! lack of any feedback signal.

use std::time::Duration;

use super::auth::AuthStateMachine;
use super::error::EngineError;
use super::extract::normalize_url;
use super::navigator::Navigator;
use super::selectors::{self, groups, Resolve};

/// The input control must appear for the operation to make sense at all
const INPUT_TIMEOUT: Duration = Duration::from_secs(5);

/// A missing submit button is normal — Enter is the fallback path
const SUBMIT_TIMEOUT: Duration = Duration::from_secs(2);

/// Post `text` as a comment on the note at `url`.
///
/// Requires an authenticated session. The comment input is a required
/// control: exhausting its candidates is a terminal failure, unlike
/// field extraction which degrades to defaults.
pub async fn post_comment(
    navigator: &Navigator,
    auth: &AuthStateMachine,
    url: &str,
    text: &str,
) -> Result<(), EngineError> {
    auth.require_logged_in(navigator).await?;

    let url = normalize_url(url);
    let page = navigator.navigate(&url).await?;

    let input = selectors::resolve_first(&page, &groups::COMMENT_INPUT, INPUT_TIMEOUT)
        .await
        .required(groups::COMMENT_INPUT.field)?;

    input
        .click()
        .await
        .map_err(|e| EngineError::Operation(format!("聚焦评论框失败: {e}")))?;
    input
        .type_str(text.trim())
        .await
        .map_err(|e| EngineError::Operation(format!("输入评论失败: {e}")))?;

    match selectors::resolve_first(&page, &groups::COMMENT_SUBMIT, SUBMIT_TIMEOUT).await {
        Resolve::Found { value: button, selector } => {
            tracing::debug!(selector, "submitting via button");
            button
                .click()
                .await
                .map_err(|e| EngineError::Operation(format!("提交评论失败: {e}")))?;
        }
        Resolve::NotFound => {
            tracing::debug!("no submit button, falling back to Enter");
            input
                .press_key("Enter")
                .await
                .map_err(|e| EngineError::Operation(format!("提交评论失败: {e}")))?;
        }
    }

    tracing::info!(%url, "comment submitted");
    Ok(())
}
