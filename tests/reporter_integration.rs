//! End-to-end tests: event sequences in, Serenity JSON reports out

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio::sync::oneshot;

use serenity_scribe::{
    CaptureError, ErrorInfo, Event, Outcome, PendingScreenshot, ReportError, Scenario, Screenshot,
    SerenityReporter, Step, TestResult,
};

fn login() -> Scenario {
    Scenario::new("s1", "Login", "Auth", "features/auth.feature")
}

fn scenario_started(scenario: Scenario, timestamp: i64) -> Event {
    Event::ScenarioStarted { scenario, timestamp }
}

fn scenario_completed(scenario: Scenario, result: TestResult, timestamp: i64) -> Event {
    Event::ScenarioCompleted {
        outcome: Outcome::new(scenario, result),
        timestamp,
    }
}

fn step_started(step: Step, timestamp: i64) -> Event {
    Event::StepStarted { step, timestamp }
}

fn step_completed(name: &str, result: TestResult, timestamp: i64) -> Event {
    Event::StepCompleted {
        outcome: Outcome::new(Step::new(name), result),
        timestamp,
    }
}

/// A capture that resolves to `path` once the returned sender fires
fn delayed_capture() -> (oneshot::Sender<&'static str>, PendingScreenshot) {
    let (tx, rx) = oneshot::channel::<&'static str>();
    let pending = PendingScreenshot::from_future(async move {
        rx.await
            .map(|path| Screenshot { path: path.into() })
            .map_err(|_| CaptureError::new("capture abandoned"))
    });
    (tx, pending)
}

async fn report(events: Vec<Event>) -> Vec<Value> {
    SerenityReporter::new().report_on(events).await.unwrap()
}

#[tokio::test]
async fn test_single_scenario_single_step() {
    let reports = report(vec![
        scenario_started(login(), 0),
        step_started(Step::new("enter creds"), 1),
        step_completed("enter creds", TestResult::Success, 5),
        scenario_completed(login(), TestResult::Success, 6),
    ])
    .await;

    assert_eq!(
        reports,
        vec![json!({
            "name": "Login",
            "title": "Login",
            "description": "",
            "tags": [],
            "startTime": 0,
            "manual": false,
            "duration": 6,
            "result": "SUCCESS",
            "testSteps": [{
                "description": "enter creds",
                "startTime": 1,
                "duration": 4,
                "result": "SUCCESS",
                "children": []
            }],
            "userStory": {
                "id": "auth",
                "storyName": "Auth",
                "path": "features/auth.feature",
                "type": "feature"
            }
        })]
    );
    assert!(reports[0].get("testFailureCause").is_none());
}

#[tokio::test]
async fn test_nested_steps() {
    let reports = report(vec![
        scenario_started(login(), 0),
        step_started(Step::new("A"), 1),
        step_started(Step::new("B"), 2),
        step_completed("B", TestResult::Success, 3),
        step_completed("A", TestResult::Success, 4),
        scenario_completed(login(), TestResult::Success, 5),
    ])
    .await;

    let steps = reports[0]["testSteps"].as_array().unwrap();
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0]["description"], "A");
    assert_eq!(steps[0]["children"].as_array().unwrap().len(), 1);
    assert_eq!(steps[0]["children"][0]["description"], "B");
    assert_eq!(steps[0]["children"][0]["duration"], 1);
}

#[tokio::test]
async fn test_failed_step_carries_exception() {
    let error = ErrorInfo::new("AssertionError", "expected true")
        .with_stack("AssertionError: expected true\n    at LoginSteps.submit (steps/login.js:17:11)");
    let reports = report(vec![
        scenario_started(login(), 0),
        step_started(Step::new("submit"), 1),
        Event::StepCompleted {
            outcome: Outcome::new(Step::new("submit"), TestResult::Failure).with_error(error.clone()),
            timestamp: 2,
        },
        Event::ScenarioCompleted {
            outcome: Outcome::new(login(), TestResult::Failure).with_error(error),
            timestamp: 3,
        },
    ])
    .await;

    let expected = json!({
        "errorType": "AssertionError",
        "message": "expected true",
        "stackTrace": [{
            "declaringClass": "LoginSteps",
            "methodName": "submit",
            "fileName": "steps/login.js",
            "lineNumber": 17
        }]
    });
    assert_eq!(reports[0]["testSteps"][0]["exception"], expected);
    assert_eq!(reports[0]["testSteps"][0]["result"], "FAILURE");
    assert_eq!(reports[0]["testFailureCause"], expected);
}

#[tokio::test]
async fn test_one_report_per_started_scenario() {
    let logout = Scenario::new("s2", "Logout", "Auth", "features/auth.feature");
    let signup = Scenario::new("s3", "Sign up", "User Accounts", "features/accounts.feature");
    let reports = report(vec![
        scenario_started(login(), 0),
        scenario_completed(login(), TestResult::Success, 1),
        scenario_started(logout.clone(), 2),
        scenario_completed(logout, TestResult::Skipped, 3),
        scenario_started(signup, 4),
    ])
    .await;

    let names: Vec<_> = reports.iter().map(|r| r["name"].clone()).collect();
    assert_eq!(names, vec![json!("Login"), json!("Logout"), json!("Sign up")]);

    // never completed: no result and no duration at all
    assert!(reports[2].get("result").is_none());
    assert!(reports[2].get("duration").is_none());
    assert_eq!(reports[2]["userStory"]["id"], "user-accounts");
}

#[tokio::test]
async fn test_empty_event_sequence() {
    assert!(report(vec![]).await.is_empty());
}

#[tokio::test]
async fn test_sibling_order_survives_resolution_order() {
    let (first_tx, first_shot) = delayed_capture();
    let (second_tx, second_shot) = delayed_capture();

    let events = vec![
        scenario_started(login(), 0),
        step_started(Step::new("first").with_screenshot(first_shot), 1),
        step_completed("first", TestResult::Success, 2),
        step_started(Step::new("second").with_screenshot(second_shot), 3),
        step_completed("second", TestResult::Success, 4),
        scenario_completed(login(), TestResult::Success, 5),
    ];

    // resolve the later sibling first
    let resolver = tokio::spawn(async move {
        second_tx.send("second.png").unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        first_tx.send("first.png").unwrap();
    });

    let reports = report(events).await;
    resolver.await.unwrap();

    let steps = reports[0]["testSteps"].as_array().unwrap();
    assert_eq!(steps[0]["description"], "first");
    assert_eq!(steps[0]["screenshots"], json!([{ "screenshot": "first.png" }]));
    assert_eq!(steps[1]["description"], "second");
    assert_eq!(steps[1]["screenshots"], json!([{ "screenshot": "second.png" }]));
}

#[tokio::test]
async fn test_screenshots_from_start_and_completion_are_merged() {
    let done = Step::new("checkout").with_screenshot(PendingScreenshot::ready("after.png"));
    let reports = report(vec![
        scenario_started(login(), 0),
        step_started(
            Step::new("checkout")
                .with_screenshot(PendingScreenshot::ready("before.png"))
                .with_screenshot(PendingScreenshot::ready("during.png")),
            1,
        ),
        Event::StepCompleted {
            outcome: Outcome::new(done, TestResult::Success),
            timestamp: 2,
        },
    ])
    .await;

    assert_eq!(
        reports[0]["testSteps"][0]["screenshots"],
        json!([
            { "screenshot": "before.png" },
            { "screenshot": "during.png" },
            { "screenshot": "after.png" }
        ])
    );
}

#[tokio::test]
async fn test_failed_capture_fails_the_whole_batch() {
    let other = Scenario::new("s2", "Logout", "Auth", "features/auth.feature");
    let result = SerenityReporter::new()
        .report_on(vec![
            scenario_started(login(), 0),
            step_started(Step::new("fine"), 1),
            step_completed("fine", TestResult::Success, 2),
            scenario_completed(login(), TestResult::Success, 3),
            scenario_started(other.clone(), 4),
            step_started(Step::new("snap").with_screenshot(PendingScreenshot::failed("no display")), 5),
            step_completed("snap", TestResult::Success, 6),
            scenario_completed(other, TestResult::Success, 7),
        ])
        .await;

    match result {
        Err(ReportError::Screenshot { step, source }) => {
            assert_eq!(step, "snap");
            assert_eq!(source.reason, "no display");
        }
        other => panic!("expected screenshot failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_lenient_scenario_completion_leaves_open_step_incomplete() {
    let reports = report(vec![
        scenario_started(login(), 0),
        step_started(Step::new("never finishes"), 1),
        scenario_completed(login(), TestResult::Compromised, 8),
    ])
    .await;

    assert_eq!(reports[0]["result"], "COMPROMISED");
    assert_eq!(reports[0]["duration"], 8);
    let step = &reports[0]["testSteps"][0];
    assert_eq!(step["description"], "never finishes");
    assert!(step.get("result").is_none());
    assert!(step.get("duration").is_none());
}

#[tokio::test]
async fn test_strict_mode_rejects_unbalanced_steps() {
    let result = SerenityReporter::new()
        .strict(true)
        .report_on(vec![
            scenario_started(login(), 0),
            step_started(Step::new("never finishes"), 1),
            scenario_completed(login(), TestResult::Success, 2),
        ])
        .await;

    assert!(matches!(result, Err(ReportError::MalformedEvents { index: 2, .. })));
}

#[tokio::test]
async fn test_unrecognized_events_are_ignored() {
    let reports = report(vec![
        Event::Unrecognized {
            kind: "TestRunStarted".to_string(),
            timestamp: 0,
        },
        scenario_started(login(), 1),
        Event::Unrecognized {
            kind: "FeatureStarted".to_string(),
            timestamp: 2,
        },
        scenario_completed(login(), TestResult::Success, 3),
    ])
    .await;

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0]["duration"], 2);
}

#[tokio::test]
async fn test_render_keeps_scenario_ids() {
    let rendered = SerenityReporter::new()
        .render(vec![scenario_started(login(), 0)])
        .await
        .unwrap();
    assert_eq!(rendered.len(), 1);
    assert_eq!(rendered[0].scenario_id, "s1");
    assert_eq!(rendered[0].value["name"], "Login");
}
