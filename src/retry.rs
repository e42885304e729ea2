use std::sync::Mutex;
use std::time::Duration;

use tokio::time::{Instant, sleep, sleep_until};
use tracing::{info, warn};

use crate::accounting::RunAccounting;
use crate::client::PaidRequest;
use crate::error::ApiError;
use crate::types::{CallResult, Endpoint};

/// Delay schedule between retry attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay before every retry.
    Fixed(Duration),
    /// `step * (attempt + 1)`: one step, then two, then three.
    Linear(Duration),
}

impl Backoff {
    pub fn delay(self, attempt: u32) -> Duration {
        match self {
            Self::Fixed(delay) => delay,
            Self::Linear(step) => step * (attempt + 1),
        }
    }
}

/// Per-call-site retry budget. Governs transient failures only; anything
/// non-transient propagates on the first attempt.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn fixed(max_retries: u32, delay: Duration) -> Self {
        Self {
            max_retries,
            backoff: Backoff::Fixed(delay),
        }
    }

    pub fn linear(max_retries: u32, step: Duration) -> Self {
        Self {
            max_retries,
            backoff: Backoff::Linear(step),
        }
    }
}

/// Ordered alternates for an unreliable endpoint, tried until one succeeds.
#[derive(Debug, Default)]
pub struct FallbackPlan {
    entries: Vec<PlanEntry>,
}

#[derive(Debug)]
pub struct PlanEntry {
    pub endpoint: Endpoint,
    pub label: String,
}

impl FallbackPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, endpoint: Endpoint, label: impl Into<String>) -> Self {
        self.entries.push(PlanEntry {
            endpoint,
            label: label.into(),
        });
        self
    }
}

/// A result tagged with the plan entry that produced it.
#[derive(Debug)]
pub struct Fetched {
    pub label: String,
    pub result: CallResult,
}

/// Minimum-interval throttle on call starts.
///
/// The signer's upstream chain RPC rate-limits across all calls of a run,
/// invisibly to any single one, so the cadence is unconditional rather than
/// a reaction to some signal.
struct Pacer {
    interval: Duration,
    next_start: Mutex<Option<Instant>>,
}

impl Pacer {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_start: Mutex::new(None),
        }
    }

    async fn pace(&self) {
        if self.interval.is_zero() {
            return;
        }
        let start = {
            let mut slot = self.next_start.lock().unwrap_or_else(|e| e.into_inner());
            let now = Instant::now();
            let start = match *slot {
                Some(prev) => (prev + self.interval).max(now),
                None => now,
            };
            *slot = Some(start);
            start
        };
        sleep_until(start).await;
    }
}

/// Wraps the paid client with bounded retry, backoff, pacing, ordered
/// fallback, and cost accounting.
pub struct Orchestrator<C> {
    client: C,
    pacer: Pacer,
    accounting: RunAccounting,
}

impl<C: PaidRequest> Orchestrator<C> {
    /// Orchestrator with pacing disabled.
    pub fn new(client: C) -> Self {
        Self {
            client,
            pacer: Pacer::new(Duration::ZERO),
            accounting: RunAccounting::new(),
        }
    }

    /// Enforce a minimum interval between successive call starts.
    pub fn with_pacing(mut self, interval: Duration) -> Self {
        self.pacer = Pacer::new(interval);
        self
    }

    pub fn accounting(&self) -> &RunAccounting {
        &self.accounting
    }

    /// Resolve one logical call: pace, attempt, retry transient failures up
    /// to the policy's budget, record the cost once on terminal success.
    ///
    /// Retry attempts are spaced by the policy's backoff, not by the pacer —
    /// backoff delays already dominate the pacing interval.
    pub async fn execute(
        &self,
        endpoint: &Endpoint,
        label: &str,
        policy: RetryPolicy,
    ) -> Result<CallResult, ApiError> {
        self.pacer.pace().await;
        let mut attempt: u32 = 0;
        loop {
            match self.client.send(endpoint).await {
                Ok(result) => {
                    self.accounting.record(result.price);
                    info!("{label}: settled for {}", result.price);
                    return Ok(result);
                }
                Err(err) if err.is_transient() && attempt < policy.max_retries => {
                    let delay = policy.backoff.delay(attempt);
                    attempt += 1;
                    warn!(
                        "{label}: {err} — retrying in {delay:?} ({attempt}/{})",
                        policy.max_retries
                    );
                    sleep(delay).await;
                }
                Err(err) => {
                    warn!("{label}: giving up — {err}");
                    return Err(err);
                }
            }
        }
    }

    /// Try each plan entry in order until one succeeds.
    ///
    /// Moves to the next entry only after exhausting retries on a transient
    /// failure; a non-transient failure propagates immediately, since the
    /// fallback routes around load, not around caller error. `Ok(None)`
    /// means every entry was exhausted — a "try again later" state whose
    /// severity the caller decides.
    pub async fn execute_with_fallback(
        &self,
        plan: &FallbackPlan,
        policy: RetryPolicy,
    ) -> Result<Option<Fetched>, ApiError> {
        for entry in &plan.entries {
            match self.execute(&entry.endpoint, &entry.label, policy).await {
                Ok(result) => {
                    return Ok(Some(Fetched {
                        label: entry.label.clone(),
                        result,
                    }));
                }
                Err(err) if err.is_transient() => {
                    warn!("{}: exhausted retries ({err}) — trying next endpoint", entry.label);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(None)
    }

    /// Start two independent calls and wait for both.
    ///
    /// Each branch swallows its own failure into `None`, so one endpoint
    /// going down never aborts the other. Only the join point synchronizes.
    pub async fn execute_pair(
        &self,
        a: (&Endpoint, &str),
        b: (&Endpoint, &str),
        policy: RetryPolicy,
    ) -> (Option<CallResult>, Option<CallResult>) {
        tokio::join!(
            self.execute_isolated(a.0, a.1, policy),
            self.execute_isolated(b.0, b.1, policy)
        )
    }

    async fn execute_isolated(
        &self,
        endpoint: &Endpoint,
        label: &str,
        policy: RetryPolicy,
    ) -> Option<CallResult> {
        match self.execute(endpoint, label, policy).await {
            Ok(result) => Some(result),
            Err(err) => {
                warn!("{label}: branch failed — {err}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::json;

    /// Paid-request double that replays scripted outcomes per path and
    /// records when each send started.
    struct ScriptedClient {
        routes: Mutex<HashMap<String, VecDeque<Result<CallResult, ApiError>>>>,
        calls: Mutex<Vec<(String, Instant)>>,
    }

    impl ScriptedClient {
        fn new() -> Self {
            Self {
                routes: Mutex::new(HashMap::new()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn route(self, path: &str, outcomes: Vec<Result<CallResult, ApiError>>) -> Self {
            self.routes
                .lock()
                .unwrap()
                .insert(path.to_string(), outcomes.into());
            self
        }

        fn calls(&self) -> Vec<(String, Instant)> {
            self.calls.lock().unwrap().clone()
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl PaidRequest for ScriptedClient {
        async fn send(&self, endpoint: &Endpoint) -> Result<CallResult, ApiError> {
            self.calls
                .lock()
                .unwrap()
                .push((endpoint.path.clone(), Instant::now()));
            self.routes
                .lock()
                .unwrap()
                .get_mut(&endpoint.path)
                .and_then(VecDeque::pop_front)
                .expect("unscripted call")
        }
    }

    fn settled(price: Decimal) -> Result<CallResult, ApiError> {
        Ok(CallResult {
            data: json!({"ok": true}),
            price,
            settlement: Some("receipt".into()),
        })
    }

    fn rejected(status: u16) -> Result<CallResult, ApiError> {
        Err(ApiError::PaymentRejected {
            status,
            excerpt: "rejected".into(),
        })
    }

    const PATH: &str = "/api/v1/smart-money/netflows";
    const ALT: &str = "/api/v1/screener/trending";

    #[tokio::test(start_paused = true)]
    async fn transient_failure_retries_after_backoff() {
        let client =
            ScriptedClient::new().route(PATH, vec![Err(ApiError::Timeout), settled(dec!(0.25))]);
        let orch = Orchestrator::new(client);

        let result = orch
            .execute(
                &Endpoint::get(PATH),
                "netflows",
                RetryPolicy::fixed(1, Duration::from_millis(3000)),
            )
            .await
            .unwrap();
        assert_eq!(result.price, dec!(0.25));

        let calls = orch.client.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].1 - calls[0].1, Duration::from_millis(3000));

        let summary = orch.accounting().summary();
        assert_eq!(summary.call_count, 1);
        assert_eq!(summary.total_cost, dec!(0.25));
    }

    #[tokio::test(start_paused = true)]
    async fn non_transient_failure_propagates_without_retry() {
        let client = ScriptedClient::new().route(PATH, vec![rejected(400)]);
        let orch = Orchestrator::new(client);

        let started = Instant::now();
        let err = orch
            .execute(
                &Endpoint::get(PATH),
                "netflows",
                RetryPolicy::fixed(5, Duration::from_secs(3)),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::PaymentRejected { status: 400, .. }));
        assert_eq!(orch.client.call_count(), 1);
        assert_eq!(Instant::now() - started, Duration::ZERO);
        assert_eq!(orch.accounting().summary().call_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn protocol_mismatch_is_never_retried() {
        let client = ScriptedClient::new().route(
            PATH,
            vec![Err(ApiError::ProtocolMismatch {
                detail: "expected 402".into(),
            })],
        );
        let orch = Orchestrator::new(client);

        let err = orch
            .execute(
                &Endpoint::get(PATH),
                "netflows",
                RetryPolicy::linear(3, Duration::from_secs(5)),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ProtocolMismatch { .. }));
        assert_eq!(orch.client.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_propagate_the_last_error() {
        let client = ScriptedClient::new().route(
            PATH,
            vec![
                Err(ApiError::ServerError { status: 503 }),
                Err(ApiError::ServerError { status: 503 }),
                Err(ApiError::Timeout),
            ],
        );
        let orch = Orchestrator::new(client);

        let err = orch
            .execute(
                &Endpoint::get(PATH),
                "netflows",
                RetryPolicy::fixed(2, Duration::from_secs(1)),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Timeout));
        assert_eq!(orch.client.call_count(), 3);
        assert_eq!(orch.accounting().summary().call_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn linear_backoff_escalates_per_attempt() {
        let client = ScriptedClient::new().route(
            PATH,
            vec![
                Err(ApiError::Timeout),
                Err(ApiError::Timeout),
                Err(ApiError::Timeout),
                settled(dec!(0.10)),
            ],
        );
        let orch = Orchestrator::new(client);

        orch.execute(
            &Endpoint::get(PATH),
            "netflows",
            RetryPolicy::linear(3, Duration::from_millis(5000)),
        )
        .await
        .unwrap();

        let calls = orch.client.calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[1].1 - calls[0].1, Duration::from_millis(5000));
        assert_eq!(calls[2].1 - calls[1].1, Duration::from_millis(10000));
        assert_eq!(calls[3].1 - calls[2].1, Duration::from_millis(15000));
    }

    #[tokio::test(start_paused = true)]
    async fn fallback_moves_on_after_exhausting_primary() {
        let client = ScriptedClient::new()
            .route(PATH, vec![Err(ApiError::Timeout), Err(ApiError::Timeout)])
            .route(ALT, vec![settled(dec!(0.05))]);
        let orch = Orchestrator::new(client);

        let plan = FallbackPlan::new()
            .push(Endpoint::get(PATH), "primary")
            .push(Endpoint::get(ALT), "secondary");
        let fetched = orch
            .execute_with_fallback(&plan, RetryPolicy::fixed(1, Duration::from_secs(1)))
            .await
            .unwrap()
            .expect("secondary should succeed");

        assert_eq!(fetched.label, "secondary");
        assert_eq!(fetched.result.price, dec!(0.05));

        let paths: Vec<String> = orch.client.calls().into_iter().map(|(p, _)| p).collect();
        assert_eq!(paths, vec![PATH, PATH, ALT]);

        // Only the entry that ultimately succeeded is accounted.
        let summary = orch.accounting().summary();
        assert_eq!(summary.call_count, 1);
        assert_eq!(summary.total_cost, dec!(0.05));
    }

    #[tokio::test(start_paused = true)]
    async fn fallback_stops_on_non_transient_failure() {
        let client = ScriptedClient::new()
            .route(PATH, vec![rejected(403)])
            .route(ALT, vec![settled(dec!(0.05))]);
        let orch = Orchestrator::new(client);

        let plan = FallbackPlan::new()
            .push(Endpoint::get(PATH), "primary")
            .push(Endpoint::get(ALT), "secondary");
        let err = orch
            .execute_with_fallback(&plan, RetryPolicy::fixed(2, Duration::from_secs(1)))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::PaymentRejected { status: 403, .. }));
        // The secondary must never be attempted.
        assert_eq!(orch.client.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn fallback_exhaustion_is_none_not_an_error() {
        let client = ScriptedClient::new()
            .route(PATH, vec![Err(ApiError::RateLimited)])
            .route(ALT, vec![Err(ApiError::Timeout)]);
        let orch = Orchestrator::new(client);

        let plan = FallbackPlan::new()
            .push(Endpoint::get(PATH), "primary")
            .push(Endpoint::get(ALT), "secondary");
        let outcome = orch
            .execute_with_fallback(&plan, RetryPolicy::fixed(0, Duration::from_secs(1)))
            .await
            .unwrap();

        assert!(outcome.is_none());
        assert_eq!(orch.client.call_count(), 2);
        assert_eq!(orch.accounting().summary().call_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn paired_branches_isolate_failures() {
        let client = ScriptedClient::new()
            .route(PATH, vec![rejected(400)])
            .route(ALT, vec![settled(dec!(0.15))]);
        let orch = Orchestrator::new(client);

        let a = Endpoint::get(PATH);
        let b = Endpoint::get(ALT);
        let (left, right) = orch
            .execute_pair(
                (&a, "left"),
                (&b, "right"),
                RetryPolicy::fixed(0, Duration::from_secs(1)),
            )
            .await;

        assert!(left.is_none());
        assert_eq!(right.unwrap().price, dec!(0.15));

        let summary = orch.accounting().summary();
        assert_eq!(summary.call_count, 1);
        assert_eq!(summary.total_cost, dec!(0.15));
    }

    #[tokio::test(start_paused = true)]
    async fn pacing_spaces_successive_call_starts() {
        let client = ScriptedClient::new()
            .route(PATH, vec![settled(dec!(0.01))])
            .route(ALT, vec![settled(dec!(0.01))]);
        let orch = Orchestrator::new(client).with_pacing(Duration::from_secs(5));
        let policy = RetryPolicy::fixed(0, Duration::from_secs(1));

        let started = Instant::now();
        orch.execute(&Endpoint::get(PATH), "first", policy)
            .await
            .unwrap();
        orch.execute(&Endpoint::get(ALT), "second", policy)
            .await
            .unwrap();

        let calls = orch.client.calls();
        // First call starts immediately, the second a full interval later.
        assert_eq!(calls[0].1 - started, Duration::ZERO);
        assert_eq!(calls[1].1 - calls[0].1, Duration::from_secs(5));
    }
}
