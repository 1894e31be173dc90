// src/checker/regressions.rs
// =============================================================================
// Tests pinned to bugs that were found and fixed:
// - reachable favorites lost their length and last-modified on the way to
//   the summary
// - reqwest errors were classified by words in the URL
// - HEAD fallback and redirect hops interacting with cancel
// - a late cancel turning a complete run into a "partial" one
// =============================================================================

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::checker::session::settled_state;
use crate::checker::testing::{
    check, checker, methods, Method, Outcome, Reply, ScriptedClient, Step, UrlChecker,
};
use crate::checker::{
    BookmarkRef, CheckReport, CheckResult, CheckSession, HttpClient, ReportEntry,
    ReqwestClient, ResultAggregator, SessionState, TransportError,
};
use crate::config::CheckerConfig;
use crate::report::render_summary;

fn bookmark(url: &str, title: &str) -> BookmarkRef {
    BookmarkRef::new(Url::parse(url).unwrap(), title)
}

fn reachable(length: Option<u64>, day: Option<u32>) -> Outcome {
    Outcome::Accessible {
        http_status: 200,
        content_length: length,
        last_modified: day.map(|d| Utc.with_ymd_and_hms(2015, 10, d, 7, 28, 0).unwrap()),
    }
}

// Bind then drop a listener so the port is very likely closed
fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

#[test]
fn aggregator_keeps_reachable_entries_in_completion_order() {
    let mut aggregator = ResultAggregator::new(3);
    aggregator.record(2, &bookmark("https://c.example/", "c"), reachable(Some(10), None));
    aggregator.record(0, &bookmark("https://a.example/", "a"), Outcome::failed_status(404));
    aggregator.record(1, &bookmark("https://b.example/", "b"), reachable(None, Some(21)));

    let report = aggregator.finalize();
    let titles: Vec<_> = report
        .accessible_details
        .iter()
        .map(|e| e.bookmark.title.as_str())
        .collect();
    assert_eq!(titles, vec!["c", "b"]);
    assert_eq!(report.accessible_details[0].outcome, reachable(Some(10), None));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["accessible_details"][0]["content_length"], 10);
}

#[test]
fn summary_shows_length_and_last_modified_of_reachable_favorites() {
    let result = CheckResult {
        state: SessionState::Completed,
        report: CheckReport {
            total: 1,
            accessible_count: 1,
            accessible_details: vec![ReportEntry {
                bookmark: bookmark("https://docs.example/", "Docs"),
                outcome: reachable(Some(5120), Some(21)),
            }],
            ..CheckReport::default()
        },
    };

    let text = render_summary(&result);
    let line = text
        .lines()
        .find(|line| line.contains("<https://docs.example/>"))
        .unwrap();
    assert!(line.contains("Length: 5120"), "{}", line);
    assert!(line.contains("Last-modified: Wed, 21 Oct 2015 07:28:00 +0000"), "{}", line);
}

#[tokio::test]
async fn length_and_last_modified_survive_a_whole_session() {
    let reply = Reply {
        status: 200,
        content_length: Some("5120".to_string()),
        last_modified: Some("Wed, 21 Oct 2015 07:28:00 GMT".to_string()),
        ..Reply::default()
    };
    let client = ScriptedClient::new().otherwise(vec![Step::Respond(reply)]);
    let session = CheckSession::new(Arc::new(client), &CheckerConfig::default());

    let result = session
        .start(vec![bookmark("https://docs.example/", "Docs")], None)
        .unwrap()
        .finish()
        .await
        .unwrap();

    assert_eq!(result.report.accessible_details.len(), 1);
    assert_eq!(result.report.accessible_details[0].outcome, reachable(Some(5120), Some(21)));

    let text = render_summary(&result);
    assert!(text.contains("Length: 5120"), "{}", text);
    assert!(text.contains("Last-modified: Wed, 21 Oct 2015"), "{}", text);

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["report"]["accessible_details"][0]["content_length"], 5120);
}

// reqwest's top-level message carries the URL; words in it must not decide
// the error kind
#[tokio::test]
async fn refused_connection_is_connect_whatever_the_path_says() {
    let client = ReqwestClient::new(&CheckerConfig::default()).unwrap();
    let port = closed_port();

    for path in ["plain", "resolve-guide", "tls-notes", "dns-ssl-certificate"] {
        let target = Url::parse(&format!("http://127.0.0.1:{}/{}", port, path)).unwrap();
        let result = client.send(Method::Head, &target).await;
        assert_eq!(result, Err(TransportError::Connect), "path /{}", path);
    }
}

#[tokio::test]
async fn head_not_implemented_falls_back_to_ranged_get() {
    let client = ScriptedClient::new()
        .script_for(
            Method::Head,
            "https://a.example/",
            vec![Step::Respond(Reply::with_status(501))],
        )
        .respond("https://a.example/", Reply::with_status(200));
    let seen = client.clone();

    let outcome = check(&checker(client, 5), "https://a.example/", &CancellationToken::new()).await;

    assert!(matches!(outcome, Outcome::Accessible { http_status: 200, .. }));
    assert_eq!(methods(&seen), vec![Method::Head, Method::RangedGet]);
}

#[tokio::test]
async fn ranged_get_is_kept_for_later_redirect_hops() {
    let client = ScriptedClient::new()
        .script_for(
            Method::Head,
            "https://old.example/",
            vec![Step::Respond(Reply::with_status(405))],
        )
        .redirect("https://old.example/", 301, "https://new.example/")
        .respond("https://new.example/", Reply::with_status(200));
    let seen = client.clone();

    let outcome = check(&checker(client, 5), "https://old.example/", &CancellationToken::new()).await;

    assert_eq!(
        outcome,
        Outcome::Redirected {
            final_url: Url::parse("https://new.example/").unwrap(),
            http_status: 200,
        }
    );
    assert_eq!(
        methods(&seen),
        vec![Method::Head, Method::RangedGet, Method::RangedGet]
    );
}

#[tokio::test]
async fn get_rejected_after_head_rejected_is_failed_not_looped() {
    let client = ScriptedClient::new().respond("https://strict.example/", Reply::with_status(405));
    let seen = client.clone();

    let outcome = check(&checker(client, 5), "https://strict.example/", &CancellationToken::new()).await;

    assert_eq!(outcome, Outcome::failed_status(405));
    assert_eq!(methods(&seen), vec![Method::Head, Method::RangedGet]);
}

#[tokio::test]
async fn cancel_between_redirect_hops_stops_the_chain() {
    let cancel = CancellationToken::new();
    // The first hop answers with a redirect and cancels the run on its way out
    let client = ScriptedClient::new()
        .script(
            "https://chain.example/0",
            vec![
                Step::Trigger(cancel.clone()),
                Step::Respond(Reply {
                    status: 301,
                    location: Some("https://chain.example/1".into()),
                    ..Reply::default()
                }),
            ],
        )
        .respond("https://chain.example/1", Reply::with_status(200));
    let seen = client.clone();
    let url_checker: UrlChecker = checker(client, 5);

    let outcome = check(&url_checker, "https://chain.example/0", &cancel).await;

    assert!(outcome.was_cancelled());
    assert_eq!(seen.calls().lock().unwrap().len(), 1);
}

#[test]
fn late_cancel_after_every_outcome_is_in_still_completes() {
    let whole = CheckReport {
        total: 2,
        accessible_count: 1,
        broken_count: 1,
        ..CheckReport::default()
    };
    assert_eq!(
        settled_state(SessionState::Cancelling, &whole, 0),
        SessionState::Completed
    );
    assert_eq!(
        settled_state(SessionState::Running, &whole, 0),
        SessionState::Completed
    );

    let partial = CheckReport {
        total: 3,
        ..whole.clone()
    };
    assert_eq!(
        settled_state(SessionState::Cancelling, &partial, 0),
        SessionState::Cancelled
    );
    // Same counts, but one request was cut short
    assert_eq!(
        settled_state(SessionState::Cancelling, &whole, 1),
        SessionState::Cancelled
    );
}
