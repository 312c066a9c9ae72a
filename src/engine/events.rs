//! Streamed multi-step operations
//!
//! Login and search are modeled as finite, forward-only sequences of
//! progress events produced into a bounded channel. Exactly one terminal
//! event (`completed`, `timeout`, or `error`) closes every sequence.
//! Cancellation is consumer-driven: when the receiver is dropped, the next
//! send fails and the producer stops — the in-flight browser operation is
//! allowed to finish rather than being aborted mid-mutation.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use super::extract::NoteSummary;
use super::Engine;

const EVENT_BUFFER: usize = 16;

/// One step of a streamed operation
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProgressEvent {
    Initializing {
        message: String,
    },
    Checking {
        message: String,
    },
    ManualActionRequired {
        message: String,
    },
    Searching {
        message: String,
    },
    Parsing {
        message: String,
    },
    Progress {
        message: String,
        note: NoteSummary,
        /// Monotonically non-decreasing completion fraction in [0, 1]
        fraction: f64,
    },
    Completed {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<Vec<NoteSummary>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        total: Option<usize>,
    },
    Timeout {
        message: String,
    },
    Error {
        message: String,
    },
}

impl ProgressEvent {
    /// Wire name of the variant, used as the SSE event type
    pub fn status(&self) -> &'static str {
        match self {
            ProgressEvent::Initializing { .. } => "initializing",
            ProgressEvent::Checking { .. } => "checking",
            ProgressEvent::ManualActionRequired { .. } => "manual_action_required",
            ProgressEvent::Searching { .. } => "searching",
            ProgressEvent::Parsing { .. } => "parsing",
            ProgressEvent::Progress { .. } => "progress",
            ProgressEvent::Completed { .. } => "completed",
            ProgressEvent::Timeout { .. } => "timeout",
            ProgressEvent::Error { .. } => "error",
        }
    }

    /// Whether this event closes the sequence
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProgressEvent::Completed { .. } | ProgressEvent::Timeout { .. } | ProgressEvent::Error { .. }
        )
    }

    fn completed(message: impl Into<String>) -> Self {
        ProgressEvent::Completed {
            message: message.into(),
            data: None,
            total: None,
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn completion_fraction(index: usize, total: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        (index + 1) as f64 / total as f64
    }
}

/// Send one event; false means the consumer is gone and production must stop.
async fn emit(tx: &mpsc::Sender<ProgressEvent>, event: ProgressEvent) -> bool {
    tx.send(event).await.is_ok()
}

/// Stream the login sequence:
/// `initializing → checking → (completed | manual_action_required → (completed | timeout))`.
pub fn login_flow(engine: Arc<Engine>) -> ReceiverStream<ProgressEvent> {
    let (tx, rx) = mpsc::channel(EVENT_BUFFER);

    tokio::spawn(async move {
        if !emit(&tx, ProgressEvent::Initializing { message: "正在启动浏览器会话...".into() }).await {
            return;
        }
        if let Err(e) = engine.warm_up().await {
            emit(&tx, ProgressEvent::Error { message: e.to_string() }).await;
            return;
        }

        if !emit(&tx, ProgressEvent::Checking { message: "正在检查登录状态...".into() }).await {
            return;
        }
        match engine.check_login_status().await {
            Ok(super::auth::AuthState::LoggedIn) => {
                emit(&tx, ProgressEvent::completed("已登录")).await;
            }
            Ok(_) => {
                if !emit(
                    &tx,
                    ProgressEvent::ManualActionRequired {
                        message: "请在浏览器窗口中完成登录".into(),
                    },
                )
                .await
                {
                    return;
                }

                // Stop polling once the consumer disconnects, but only at
                // the loop's safe points — never mid-navigation.
                let cancel = CancellationToken::new();
                let watchdog = {
                    let cancel = cancel.clone();
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        tx.closed().await;
                        cancel.cancel();
                    })
                };

                let observed = engine.wait_for_login(&cancel).await;
                watchdog.abort();

                match observed {
                    Ok(true) => {
                        emit(&tx, ProgressEvent::completed("登录成功")).await;
                    }
                    Ok(false) => {
                        if !cancel.is_cancelled() {
                            emit(&tx, ProgressEvent::Timeout { message: "登录超时，请重试".into() })
                                .await;
                        }
                    }
                    Err(e) => {
                        emit(&tx, ProgressEvent::Error { message: e.to_string() }).await;
                    }
                }
            }
            Err(e) => {
                emit(&tx, ProgressEvent::Error { message: e.to_string() }).await;
            }
        }
    });

    ReceiverStream::new(rx)
}

/// Stream the search sequence:
/// `searching → parsing → progress* → completed`, one `progress` per hit.
pub fn search_flow(engine: Arc<Engine>, keywords: String, limit: usize) -> ReceiverStream<ProgressEvent> {
    let (tx, rx) = mpsc::channel(EVENT_BUFFER);

    tokio::spawn(async move {
        if !emit(&tx, ProgressEvent::Searching { message: format!("搜索关键词: {keywords}") }).await {
            return;
        }

        let page = match engine.open_search(&keywords).await {
            Ok(page) => page,
            Err(e) => {
                emit(&tx, ProgressEvent::Error { message: e.to_string() }).await;
                return;
            }
        };

        if !emit(&tx, ProgressEvent::Parsing { message: "解析搜索结果...".into() }).await {
            return;
        }

        let hits = super::extract::extract_search_results(&page, limit).await;
        let total = hits.len();

        for (index, hit) in hits.iter().enumerate() {
            let event = ProgressEvent::Progress {
                message: format!("找到笔记: {}", hit.title),
                note: hit.clone(),
                fraction: completion_fraction(index, total),
            };
            if !emit(&tx, event).await {
                return;
            }
        }

        emit(
            &tx,
            ProgressEvent::Completed {
                message: "搜索完成".into(),
                data: Some(hits),
                total: Some(total),
            },
        )
        .await;
    });

    ReceiverStream::new(rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tokio_stream::StreamExt;

    /// An engine whose session can never launch: the profile path sits
    /// under a plain file, so initialization fails before any download.
    fn broken_engine() -> (Arc<Engine>, tempfile::NamedTempFile) {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = Config {
            browser_data_dir: file.path().join("profile"),
            ..Config::default()
        };
        (Arc::new(Engine::new(config)), file)
    }

    #[tokio::test]
    async fn login_flow_closes_with_exactly_one_terminal_event() {
        let (engine, _file) = broken_engine();

        let events: Vec<_> = login_flow(engine).collect().await;
        assert!(!events.is_empty());
        assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
        let last = events.last().unwrap();
        assert!(last.is_terminal());
        assert_eq!(last.status(), "error");
        assert_eq!(events[0].status(), "initializing");
    }

    #[tokio::test]
    async fn search_flow_closes_with_exactly_one_terminal_event() {
        let (engine, _file) = broken_engine();

        let events: Vec<_> = search_flow(engine, "美食".into(), 3).collect().await;
        assert_eq!(events[0].status(), "searching");
        assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
        assert_eq!(events.last().unwrap().status(), "error");
    }

    #[test]
    fn fractions_are_monotonic_and_bounded() {
        let total = 7;
        let fractions: Vec<_> = (0..total).map(|i| completion_fraction(i, total)).collect();
        for pair in fractions.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
        assert!(fractions.iter().all(|f| (0.0..=1.0).contains(f)));
        assert!((fractions[total - 1] - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_result_set_is_complete() {
        assert!((completion_fraction(0, 0) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn terminal_variants_are_exactly_three() {
        let terminal = [
            ProgressEvent::completed("done"),
            ProgressEvent::Timeout { message: "t".into() },
            ProgressEvent::Error { message: "e".into() },
        ];
        assert!(terminal.iter().all(ProgressEvent::is_terminal));

        let interim = [
            ProgressEvent::Initializing { message: "i".into() },
            ProgressEvent::Checking { message: "c".into() },
            ProgressEvent::ManualActionRequired { message: "m".into() },
            ProgressEvent::Searching { message: "s".into() },
            ProgressEvent::Parsing { message: "p".into() },
        ];
        assert!(!interim.iter().any(ProgressEvent::is_terminal));
    }

    #[test]
    fn events_serialize_with_snake_case_status_tag() {
        let event = ProgressEvent::Progress {
            message: "找到笔记: 例子".into(),
            note: NoteSummary {
                title: "例子".into(),
                url: "https://www.xiaohongshu.com/explore/1".into(),
            },
            fraction: 0.5,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["status"], "progress");
        assert_eq!(value["note"]["title"], "例子");

        let manual = ProgressEvent::ManualActionRequired { message: "m".into() };
        assert_eq!(serde_json::to_value(&manual).unwrap()["status"], "manual_action_required");
        assert_eq!(manual.status(), "manual_action_required");
    }

    #[test]
    fn login_completed_omits_payload_fields() {
        let value = serde_json::to_value(ProgressEvent::completed("已登录")).unwrap();
        assert!(value.get("data").is_none());
        assert!(value.get("total").is_none());
    }
}
