//! Pipeline orchestration: prompt → provider → extraction → assembly.
//!
//! The provider call is the only suspension point, so it is the only place
//! timeout, cancellation and retry apply. Everything after it is pure and
//! available on its own as [`extract_and_assemble`].

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::models::profile::ProfileContext;
use crate::synthesis::assembler::assemble;
use crate::synthesis::fields::{coverage, extract};
use crate::synthesis::kind::{GenerationKind, KindTag};
use crate::synthesis::prompt_builder;
use crate::synthesis::provider::{GenerationError, GenerativeClient, ProviderError};
use crate::synthesis::records::SynthesisRecord;

/// Bounded exponential backoff for transient provider errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total provider calls allowed, including the first. `1` disables retry.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Delay after the `failed_attempts`-th failure: `base * 2^(n-1)`, capped.
    pub fn delay_for(&self, failed_attempts: u32) -> Duration {
        let factor = 2u32.saturating_pow(failed_attempts.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthesisSettings {
    /// Upper bound on a single provider call.
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            retry: RetryPolicy::default(),
        }
    }
}

fn failed(kind: KindTag, attempts: u32, source: ProviderError) -> GenerationError {
    GenerationError {
        kind,
        attempts,
        source,
    }
}

/// Runs one generation request end to end.
///
/// Fails only when the provider does (or the request is cancelled or times
/// out); the provider error is returned unchanged inside [`GenerationError`].
/// Any text the provider returns yields a fully populated record.
pub async fn synthesize(
    client: &dyn GenerativeClient,
    settings: &SynthesisSettings,
    profile: &ProfileContext,
    kind: &GenerationKind,
    cancel: &CancellationToken,
) -> Result<SynthesisRecord, GenerationError> {
    let tag = kind.tag();
    let prompt = prompt_builder::build(profile, kind);
    debug!(
        kind = %tag,
        prompt_chars = prompt.system.len() + prompt.body.len(),
        "Built synthesis prompt"
    );

    let max_attempts = settings.retry.max_attempts.max(1);
    let mut attempts = 0;

    let raw = loop {
        if cancel.is_cancelled() {
            return Err(failed(tag, attempts, ProviderError::Cancelled));
        }
        attempts += 1;

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ProviderError::Cancelled),
            result = tokio::time::timeout(settings.timeout, client.generate(&prompt)) => {
                result.unwrap_or(Err(ProviderError::Timeout(settings.timeout)))
            }
        };

        match outcome {
            Ok(raw) => break raw,
            Err(err) if err.is_transient() && attempts < max_attempts => {
                let delay = settings.retry.delay_for(attempts);
                warn!(
                    kind = %tag,
                    attempt = attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Provider call failed, retrying"
                );
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        return Err(failed(tag, attempts, ProviderError::Cancelled));
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            Err(err) => {
                warn!(kind = %tag, attempts, error = %err, "Provider call failed");
                return Err(failed(tag, attempts, err));
            }
        }
    };

    if cancel.is_cancelled() {
        return Err(failed(tag, attempts, ProviderError::Cancelled));
    }

    Ok(extract_and_assemble(kind, &raw))
}

/// The synchronous half of the pipeline: raw provider text → record.
pub fn extract_and_assemble(kind: &GenerationKind, raw: &str) -> SynthesisRecord {
    let fields = extract(kind, raw);
    let cov = coverage(kind, &fields);
    info!(
        kind = %kind.tag(),
        located = cov.located,
        expected = cov.expected,
        hit_rate = cov.ratio(),
        raw_chars = raw.len(),
        "Extracted synthesis fields"
    );
    if fields.is_empty() && !raw.trim().is_empty() {
        warn!(
            kind = %kind.tag(),
            "Provider response matched no section labels, record built from fallbacks"
        );
    }

    assemble(kind, &fields, raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthesis::kind::{Difficulty, HomeworkType, NarrativeSubtype};
    use crate::synthesis::provider::testing::ScriptedClient;

    fn narrative() -> GenerationKind {
        GenerationKind::Narrative {
            subtype: NarrativeSubtype::Story,
        }
    }

    fn profile() -> ProfileContext {
        ProfileContext {
            mood: 3,
            ..Default::default()
        }
    }

    fn retrying(max_attempts: u32) -> SynthesisSettings {
        SynthesisSettings {
            timeout: Duration::from_secs(5),
            retry: RetryPolicy {
                max_attempts,
                base_delay: Duration::from_millis(500),
                max_delay: Duration::from_secs(8),
            },
        }
    }

    #[tokio::test]
    async fn test_synthesize_builds_record_from_response() {
        let client = ScriptedClient::replying("Title: Calm Harbor\nDescription: A grounding story.\n");
        let record = synthesize(
            &client,
            &SynthesisSettings::default(),
            &profile(),
            &narrative(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        let SynthesisRecord::Narrative(n) = record else {
            panic!("expected narrative");
        };
        assert_eq!(n.title, "Calm Harbor");
        assert_eq!(n.content, "Description: A grounding story.");
        assert_eq!(n.duration_minutes, 1);
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_provider_error_is_returned_unchanged_without_retry_by_default() {
        let client = ScriptedClient::new(vec![Err(ProviderError::RateLimited)]);
        let err = synthesize(
            &client,
            &SynthesisSettings::default(),
            &profile(),
            &narrative(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind, KindTag::Narrative);
        assert_eq!(err.attempts, 1);
        assert_eq!(err.source, ProviderError::RateLimited);
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_are_retried_with_backoff() {
        let client = ScriptedClient::new(vec![
            Err(ProviderError::Unavailable("reset".into())),
            Err(ProviderError::RateLimited),
            Ok("Key Themes:\n- sleep\n".into()),
        ]);
        let kind = GenerationKind::ClinicalSynthesis {
            session_notes: vec![],
        };
        let start = tokio::time::Instant::now();

        let record = synthesize(
            &client,
            &retrying(3),
            &profile(),
            &kind,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(client.calls(), 3);
        // 500ms after the first failure, 1s after the second
        assert!(start.elapsed() >= Duration::from_millis(1500));
        let SynthesisRecord::ClinicalSynthesis(c) = record else {
            panic!("expected clinical synthesis");
        };
        assert_eq!(c.key_themes, vec!["sleep"]);
    }

    #[tokio::test]
    async fn test_permanent_errors_are_not_retried() {
        let rejected = ProviderError::Rejected {
            status: 400,
            message: "bad request".into(),
        };
        let client = ScriptedClient::new(vec![Err(rejected.clone())]);
        let err = synthesize(
            &client,
            &retrying(3),
            &profile(),
            &narrative(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.source, rejected);
        assert_eq!(err.attempts, 1);
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_budget_is_bounded() {
        let client = ScriptedClient::new(vec![
            Err(ProviderError::Unavailable("down".into())),
            Err(ProviderError::Unavailable("still down".into())),
            Ok("never reached".into()),
        ]);
        let err = synthesize(
            &client,
            &retrying(2),
            &profile(),
            &narrative(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.attempts, 2);
        assert_eq!(err.source, ProviderError::Unavailable("still down".into()));
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_provider_times_out() {
        let client = ScriptedClient::replying("Title: Late").with_delay(Duration::from_secs(30));
        let settings = SynthesisSettings {
            timeout: Duration::from_secs(2),
            retry: RetryPolicy::default(),
        };
        let err = synthesize(
            &client,
            &settings,
            &profile(),
            &narrative(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.source, ProviderError::Timeout(Duration::from_secs(2)));
    }

    #[tokio::test]
    async fn test_cancelled_before_call_never_reaches_provider() {
        let client = ScriptedClient::replying("Title: Unused");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = synthesize(
            &client,
            &SynthesisSettings::default(),
            &profile(),
            &narrative(),
            &cancel,
        )
        .await
        .unwrap_err();

        assert_eq!(err.source, ProviderError::Cancelled);
        assert_eq!(err.attempts, 0);
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_call_stops_waiting() {
        let client = ScriptedClient::replying("Title: Slow").with_delay(Duration::from_secs(30));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let kind = GenerationKind::Homework {
            homework_type: HomeworkType::Journaling,
            duration_days: 3,
            difficulty: Difficulty::Beginner,
        };

        let settings = SynthesisSettings::default();
        let profile = profile();

        let (result, _) = tokio::join!(
            synthesize(&client, &settings, &profile, &kind, &cancel),
            async move {
                tokio::time::sleep(Duration::from_secs(1)).await;
                trigger.cancel();
            }
        );

        let err = result.unwrap_err();
        assert_eq!(err.source, ProviderError::Cancelled);
        assert_eq!(err.kind, KindTag::Homework);
        assert_eq!(client.calls(), 1);
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for(2), Duration::from_secs(1));
        assert_eq!(policy.delay_for(3), Duration::from_secs(2));
        assert_eq!(policy.delay_for(10), Duration::from_secs(8));
        assert_eq!(policy.delay_for(64), Duration::from_secs(8));
    }

    #[test]
    fn test_extract_and_assemble_is_total() {
        for raw in ["", "garbage", "Day 1:\n\n\n"] {
            let record = extract_and_assemble(
                &GenerationKind::Homework {
                    homework_type: HomeworkType::Exposure,
                    duration_days: 4,
                    difficulty: Difficulty::Advanced,
                },
                raw,
            );
            let SynthesisRecord::Homework(plan) = record else {
                panic!("expected homework");
            };
            assert_eq!(plan.daily_tasks.len(), 4);
        }
    }
}
