//! Integration tests for the discovery pipeline.
//!
//! These tests drive the full flow through scripted backends:
//! 1. Resolve domains and build the strict query
//! 2. Execute with retry/backoff and backend rotation
//! 3. Filter and rank
//! 4. Fall back to the relaxed query when strict finds nothing

use std::sync::Arc;
use std::time::Duration;

use edu_discovery::{
    testing::{hit, Script, ScriptedBackend},
    BackendError, BlockingSearchBackend, DiscoveryOrchestrator, DiscoveryRequest, DomainPolicy,
    ExecutorConfig, FailureKind, Offloaded, PhaseOutcome, RawHit, RetryPolicy, SearchBackend,
    SearchExecutor, SearchQuery,
};

/// Retry settings with the default schedule but no jitter.
fn deterministic_config() -> ExecutorConfig {
    ExecutorConfig::new().with_retry(RetryPolicy::new().without_jitter())
}

fn orchestrator(backends: Vec<Arc<dyn SearchBackend>>) -> DiscoveryOrchestrator {
    let executor = SearchExecutor::new(backends, deterministic_config()).unwrap();
    DiscoveryOrchestrator::new(DomainPolicy::default(), executor).unwrap()
}

fn gravity_request() -> DiscoveryRequest {
    DiscoveryRequest::new(8, "Physics", "Gravity")
}

#[tokio::test]
async fn test_empty_strict_search_falls_back_to_site_free_query() {
    let backend = ScriptedBackend::new("scripted");
    let log = backend.call_log();
    let discovery = orchestrator(vec![Arc::new(backend)]);

    let report = discovery.search_detailed(&gravity_request()).await.unwrap();

    let queries = log.queries();
    assert_eq!(queries.len(), 2);
    assert!(queries[0].contains("(site:khanacademy.org OR site:ck12.org"));
    assert!(!queries[1].contains("site:"));
    assert_eq!(
        queries[1],
        r#""Grade 8" "Physics" "Gravity" -college -university -"AP " -thesis -doctoral"#
    );

    assert_eq!(report.strict.outcome, PhaseOutcome::Empty);
    assert_eq!(
        report.relaxed.as_ref().map(|r| &r.outcome),
        Some(&PhaseOutcome::Empty)
    );
    assert!(report.results.is_empty());
    assert!(!report.had_failures());
}

#[tokio::test(start_paused = true)]
async fn test_rate_limited_backend_recovers_with_growing_backoff() {
    let backend = ScriptedBackend::new("flaky")
        .then(Script::RateLimited)
        .then(Script::RateLimited)
        .then(Script::Hits(vec![
            hit("https://www.ck12.org/physics/gravity/"),
            hit("https://random.net/gravity-facts"),
        ]));
    let log = backend.call_log();
    let discovery = orchestrator(vec![Arc::new(backend)]);

    let start = tokio::time::Instant::now();
    let results = discovery.search(&gravity_request()).await.unwrap();

    assert_eq!(results.len(), 2);
    assert!(results[0].is_trusted());

    let at = log.offsets_from(start);
    assert_eq!(at.len(), 3);
    let first_gap = at[1] - at[0];
    let second_gap = at[2] - at[1];
    assert_eq!(first_gap, Duration::from_secs(2));
    assert_eq!(second_gap, Duration::from_secs(4));
}

#[tokio::test]
async fn test_all_backends_failing_yields_empty_strict_then_relaxed() {
    let primary = ScriptedBackend::new("primary").always(Script::Fail("connection reset".into()));
    let secondary = ScriptedBackend::new("secondary")
        .then(Script::Fail("dns failure".into()))
        .then(Script::Hits(vec![hit("https://openstax.org/books/physics/gravity")]));
    let primary_log = primary.call_log();
    let secondary_log = secondary.call_log();

    // The executor on its own surfaces the exhaustion.
    let executor = SearchExecutor::new(
        vec![
            Arc::new(ScriptedBackend::new("a").always(Script::Fail("down".into()))),
            Arc::new(ScriptedBackend::new("b").always(Script::Fail("down".into()))),
        ],
        deterministic_config(),
    )
    .unwrap();
    let err = executor
        .fetch(&SearchQuery::new("\"Grade 8\" \"Physics\"", 10))
        .await
        .unwrap_err();
    assert_eq!(err.failures().count(), 2);
    assert_eq!(err.last.kind, FailureKind::Other);
    assert_eq!(err.last.attempts, 1);

    // The orchestrator absorbs it and runs the relaxed phase.
    let discovery = orchestrator(vec![Arc::new(primary), Arc::new(secondary)]);
    let report = discovery.search_detailed(&gravity_request()).await.unwrap();

    assert!(matches!(
        report.strict.outcome,
        PhaseOutcome::Failed { blocked: false, .. }
    ));
    assert_eq!(
        report.relaxed.as_ref().map(|r| &r.outcome),
        Some(&PhaseOutcome::Found { count: 1 })
    );
    assert_eq!(report.results[0].domain(), "openstax.org");
    assert_eq!(primary_log.len(), 2);
    assert_eq!(secondary_log.len(), 2);
}

#[tokio::test]
async fn test_every_phase_failing_is_still_not_an_error() {
    let discovery = orchestrator(vec![Arc::new(
        ScriptedBackend::new("captcha").always(Script::Challenge),
    )]);

    let report = discovery.search_detailed(&gravity_request()).await.unwrap();

    assert!(report.results.is_empty());
    assert!(report.had_failures());
    assert!(matches!(
        report.relaxed.map(|r| r.outcome),
        Some(PhaseOutcome::Failed { blocked: true, .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_backoff_in_one_call_does_not_delay_another() {
    let backend = ScriptedBackend::new("shared").respond_with(|q| {
        if q.text.contains("Gravity") {
            Script::RateLimited
        } else {
            Script::Hits(vec![hit("https://www.khanacademy.org/math/fractions")])
        }
    });
    let discovery = Arc::new(orchestrator(vec![Arc::new(backend)]));
    let start = tokio::time::Instant::now();

    let slow = {
        let discovery = Arc::clone(&discovery);
        tokio::spawn(async move {
            let results = discovery.search(&gravity_request()).await.unwrap();
            (results, start.elapsed())
        })
    };
    let fast = {
        let discovery = Arc::clone(&discovery);
        tokio::spawn(async move {
            let request = DiscoveryRequest::new(4, "Math", "Fractions");
            let results = discovery.search(&request).await.unwrap();
            (results, start.elapsed())
        })
    };

    let (fast_results, fast_elapsed) = fast.await.unwrap();
    let (slow_results, slow_elapsed) = slow.await.unwrap();

    assert_eq!(fast_results.len(), 1);
    assert_eq!(fast_elapsed, Duration::ZERO);

    // Two phases, each 2s + 4s of backoff before giving up.
    assert!(slow_results.is_empty());
    assert_eq!(slow_elapsed, Duration::from_secs(12));
}

#[tokio::test]
async fn test_strict_mode_only_returns_trusted_hits() {
    let backend = ScriptedBackend::new("scripted").always(Script::Hits(vec![
        hit("https://random.net/gravity"),
        hit("https://www.physicsclassroom.com/class/circles"),
    ]));
    let discovery = orchestrator(vec![Arc::new(backend)]);

    let strict = gravity_request().strict(true);
    assert!(discovery.search(&strict).await.unwrap().is_empty());

    let with_extra = gravity_request()
        .strict(true)
        .with_extra_domains(["physicsclassroom.com"]);
    let results = discovery.search(&with_extra).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].domain(), "physicsclassroom.com");
}

#[tokio::test]
async fn test_request_blocklist_applies() {
    let backend = ScriptedBackend::new("scripted").always(Script::Hits(vec![
        hit("https://www.ck12.org/physics/gravity/"),
        hit("https://spammy-worksheets.com/gravity"),
    ]));
    let discovery = orchestrator(vec![Arc::new(backend)]);

    let request = gravity_request().with_blocked_domains(["spammy-worksheets.com"]);
    let results = discovery.search(&request).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].domain(), "ck12.org");
}

#[tokio::test]
async fn test_preferred_backend_answers_first() {
    let bing = ScriptedBackend::new("bing").always(Script::Hits(vec![hit("https://ck12.org/a")]));
    let ddg = ScriptedBackend::new("duckduckgo").always(Script::Hits(vec![hit("https://openstax.org/b")]));
    let bing_log = bing.call_log();
    let discovery = orchestrator(vec![Arc::new(ddg), Arc::new(bing)]);

    let results = discovery
        .search(&gravity_request().with_preferred_backend("bing"))
        .await
        .unwrap();

    assert_eq!(results[0].domain(), "ck12.org");
    assert_eq!(bing_log.len(), 1);
}

struct BlockingLibrary;

impl BlockingSearchBackend for BlockingLibrary {
    fn name(&self) -> &'static str {
        "blocking-library"
    }

    fn search_blocking(&self, query: &SearchQuery) -> Result<Vec<RawHit>, BackendError> {
        std::thread::sleep(Duration::from_millis(5));
        if query.text.contains("site:") {
            Ok(vec![])
        } else {
            Ok(vec![hit("https://www.britannica.com/science/gravity-physics")])
        }
    }
}

#[tokio::test]
async fn test_blocking_backend_runs_through_offload_adapter() {
    let discovery = orchestrator(vec![Arc::new(Offloaded::new(BlockingLibrary))]);

    let report = discovery.search_detailed(&gravity_request()).await.unwrap();

    assert_eq!(report.strict.outcome, PhaseOutcome::Empty);
    assert_eq!(report.results.len(), 1);
    assert!(report.results[0].is_trusted());
}

#[tokio::test]
async fn test_results_serialize_with_public_field_names() {
    let backend = ScriptedBackend::new("scripted").always(Script::Hits(vec![RawHit::new(
        "https://www.ck12.org/physics/gravity/",
    )
    .with_title("Gravity")
    .with_snippet("Gravity pulls.")]));
    let discovery = orchestrator(vec![Arc::new(backend)]);

    let results = discovery.search(&gravity_request()).await.unwrap();
    let json = serde_json::to_value(&results).unwrap();

    assert_eq!(
        json,
        serde_json::json!([{
            "title": "Gravity",
            "url": "https://www.ck12.org/physics/gravity/",
            "snippet": "Gravity pulls.",
            "domain": "ck12.org",
            "is_trusted": true
        }])
    );
}
