//! Dispatcher behaviour over a full session: lifecycle ordering, argument
//! validation, confirmations and result delivery.

use async_trait::async_trait;
use frontend_tools::dispatch::{
    Delivery, Dispatcher, InvocationState, InvocationUpdate, PromptError, Selection, ToolCard,
    ToolInvocation,
};
use frontend_tools::transport::{ImageCheck, ImageProbe, ResultSink, TransportError};
use frontend_tools::Error;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use url::Url;

/// Records results; fails the first `failures` sends.
#[derive(Default)]
struct TestSink {
    sent: Mutex<Vec<(String, Value)>>,
    failures: AtomicUsize,
}

impl TestSink {
    fn failing(times: usize) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failures: AtomicUsize::new(times),
        }
    }

    fn sent(&self) -> Vec<(String, Value)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResultSink for TestSink {
    async fn send_result(&self, call_id: &str, result: Value) -> Result<(), TransportError> {
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(TransportError::Status(503));
        }
        self.sent
            .lock()
            .unwrap()
            .push((call_id.to_string(), result));
        Ok(())
    }
}

struct StaticProbe;

#[async_trait]
impl ImageProbe for StaticProbe {
    async fn probe(&self, url: &Url) -> ImageCheck {
        if url.path().ends_with("missing.png") {
            ImageCheck::NotLoadable("HTTP 404".to_string())
        } else {
            ImageCheck::Loadable
        }
    }
}

/// Cannot reach the image host for the first `outages` probes.
struct FlakyProbe {
    outages: AtomicUsize,
    probes: AtomicUsize,
}

impl FlakyProbe {
    fn new(outages: usize) -> Self {
        Self {
            outages: AtomicUsize::new(outages),
            probes: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ImageProbe for FlakyProbe {
    async fn probe(&self, _url: &Url) -> ImageCheck {
        self.probes.fetch_add(1, Ordering::SeqCst);
        let remaining = self.outages.load(Ordering::SeqCst);
        if remaining > 0 {
            self.outages.store(remaining - 1, Ordering::SeqCst);
            return ImageCheck::Unreachable("request failed: connection refused".to_string());
        }
        ImageCheck::Loadable
    }
}

fn session(sink: Arc<TestSink>) -> Dispatcher {
    Dispatcher::builtin(sink, Arc::new(StaticProbe)).unwrap()
}

fn update(
    message_id: &str,
    call_id: &str,
    tool: &str,
    state: InvocationState,
    args: Value,
) -> InvocationUpdate {
    InvocationUpdate::new(message_id, ToolInvocation::new(call_id, tool, state, args))
}

fn tool_info(status: &str) -> Value {
    json!({
        "tool_name": "web_search",
        "tool_description": "Searches the web",
        "tool_status": status
    })
}

#[tokio::test]
async fn test_duplicate_executing_is_idempotent() {
    let sink = Arc::new(TestSink::default());
    let mut d = session(sink.clone());

    let executing = update("m1", "c1", "display_tool_info", InvocationState::Executing, tool_info("executing"));
    assert!(d.ingest(executing.clone()).is_empty());
    let once = d.view().render();
    assert!(d.ingest(executing).is_empty());

    assert_eq!(d.view().render(), once);
    assert_eq!(d.view().len(), 1);
    assert!(sink.sent().is_empty());
}

#[tokio::test]
async fn test_interleaved_updates_keep_latest_state_per_call() {
    use InvocationState::*;
    let sink = Arc::new(TestSink::default());
    let mut d = session(sink.clone());

    let feed = [
        ("a", Pending),
        ("b", Pending),
        ("a", Completed),
        ("c", Executing),
        ("a", Executing),
        ("b", Executing),
        ("c", Pending),
        ("b", Failed),
        ("a", Pending),
        ("c", Completed),
        ("b", Completed),
    ];
    for (call_id, state) in feed {
        d.ingest(update("m1", call_id, "display_tool_info", state, tool_info(state.as_str())));
    }

    let states: Vec<(String, InvocationState)> = d
        .view()
        .render()
        .into_iter()
        .map(|r| (r.call_id, r.state))
        .collect();
    assert_eq!(
        states,
        vec![
            ("a".to_string(), Completed),
            ("b".to_string(), Failed),
            ("c".to_string(), Completed),
        ]
    );
    assert!(sink.sent().is_empty(), "display tools never send results");
}

#[tokio::test]
async fn test_invalid_color_is_reported_and_not_applied() {
    let sink = Arc::new(TestSink::default());
    let mut d = session(sink.clone());

    d.process(update(
        "m1",
        "c1",
        "change_background_color",
        InvocationState::Executing,
        json!({"colorHexCode": "not-a-color"}),
    ))
    .await;

    assert_eq!(
        sink.sent(),
        vec![(
            "c1".to_string(),
            json!({
                "success": false,
                "error": "Invalid color format. Please use a valid hex color code (e.g. #FF5733)"
            })
        )]
    );
    assert_eq!(d.background_color(), None);
}

#[tokio::test]
async fn test_valid_color_is_applied_once() {
    let sink = Arc::new(TestSink::default());
    let mut d = session(sink.clone());
    let args = json!({"colorHexCode": "#FFC0CB"});

    d.process(update("m1", "c1", "change_background_color", InvocationState::Pending, args.clone()))
        .await;
    d.process(update("m1", "c1", "change_background_color", InvocationState::Executing, args))
        .await;

    assert_eq!(d.background_color(), Some("#FFC0CB"));
    assert_eq!(
        sink.sent(),
        vec![(
            "c1".to_string(),
            json!({"success": true, "message": "Background color changed to #FFC0CB"})
        )]
    );
}

#[tokio::test]
async fn test_negative_price_is_rejected() {
    let sink = Arc::new(TestSink::default());
    let mut d = session(sink.clone());

    d.process(update(
        "m1",
        "c1",
        "display_product_card",
        InvocationState::Executing,
        json!({"product_name": "Widget", "price": -5}),
    ))
    .await;

    assert_eq!(
        sink.sent(),
        vec![(
            "c1".to_string(),
            json!({"success": false, "error": "Price must be a positive number"})
        )]
    );
    let rendered = d.view().render();
    assert_eq!(
        rendered[0].card,
        ToolCard::Invalid {
            tool: "display_product_card".to_string(),
            error: "Price must be a positive number".to_string()
        }
    );
}

#[tokio::test]
async fn test_product_card_with_broken_image() {
    let sink = Arc::new(TestSink::default());
    let mut d = session(sink.clone());

    d.process(update(
        "m1",
        "c1",
        "display_product_card",
        InvocationState::Executing,
        json!({
            "product_id": "p-1",
            "product_name": "Widget",
            "price": 12.5,
            "image_url": "https://cdn.example.com/missing.png"
        }),
    ))
    .await;

    assert_eq!(sink.sent()[0].1["error"], "Image failed to load: HTTP 404");
    match &d.view().render()[0].card {
        ToolCard::ProductCard { displayed, .. } => assert!(!displayed),
        other => panic!("unexpected card {:?}", other),
    }
}

#[tokio::test]
async fn test_confirmation_yes_sends_once_and_removes_prompt() {
    let sink = Arc::new(TestSink::default());
    let mut d = session(sink.clone());
    let args = json!({
        "question_text": "Book it?",
        "buttons": [{"label": "Yes", "value": true}, {"label": "No", "value": false}]
    });

    d.ingest(update("m1", "c1", "ask_user_confirmation", InvocationState::Executing, args));
    assert_eq!(d.pending_confirmation(), Some("c1"));

    let selection = d.select_option("c1", 0).await.unwrap();
    assert_eq!(selection, Selection::Resolved(json!({"confirmed": true})));
    assert_eq!(sink.sent(), vec![("c1".to_string(), json!({"confirmed": true}))]);
    assert_eq!(d.pending_confirmation(), None);

    let again = d.select_option("c1", 1).await.unwrap_err();
    assert!(matches!(again, Error::Prompt(PromptError::AlreadyResolved)));
    assert_eq!(sink.sent().len(), 1);

    match &d.view().render()[0].card {
        ToolCard::Confirmation { prompt, answer, .. } => {
            assert!(prompt.is_none());
            assert_eq!(answer, &Some(json!({"confirmed": true})));
        }
        other => panic!("unexpected card {:?}", other),
    }
}

#[tokio::test]
async fn test_confirmation_no_sends_false() {
    let sink = Arc::new(TestSink::default());
    let mut d = session(sink.clone());
    let args = json!({
        "question_text": "Book it?",
        "buttons": [{"label": "Yes", "value": true}, {"label": "No", "value": false}]
    });

    d.ingest(update("m1", "c1", "ask_user_confirmation", InvocationState::Executing, args));
    d.select_label("c1", "No").await.unwrap();
    assert_eq!(sink.sent(), vec![("c1".to_string(), json!({"confirmed": false}))]);
}

#[tokio::test]
async fn test_free_text_answer_is_sent_on_submit_only() {
    let sink = Arc::new(TestSink::default());
    let mut d = session(sink.clone());
    let args = json!({
        "question_text": "When?",
        "buttons": [{"label": "Today", "value": "today"}, {"label": "Other", "value": "other"}]
    });

    d.ingest(update("m1", "c1", "ask_user_confirmation", InvocationState::Executing, args));
    assert_eq!(d.select_option("c1", 1).await.unwrap(), Selection::AwaitingText);
    d.update_text("c1", "next").unwrap();
    d.update_text("c1", "next friday").unwrap();
    assert!(sink.sent().is_empty());

    d.submit_text("c1").await.unwrap();
    assert_eq!(sink.sent(), vec![("c1".to_string(), json!({"confirmed": "next friday"}))]);
}

#[tokio::test]
async fn test_only_latest_turn_prompts() {
    let sink = Arc::new(TestSink::default());
    let mut d = session(sink);
    let args = json!({"question_text": "Continue?"});

    d.ingest(update("m1", "c1", "ask_user_confirmation", InvocationState::Executing, args.clone()));
    d.ingest(update("m2", "c2", "display_tool_info", InvocationState::Executing, tool_info("executing")));
    assert_eq!(d.pending_confirmation(), None);

    d.ingest(update("m3", "c3", "ask_user_confirmation", InvocationState::Executing, args.clone()));
    d.ingest(update("m3", "c4", "ask_user_confirmation", InvocationState::Executing, args));
    assert_eq!(d.pending_confirmation(), Some("c3"));

    let prompts = d
        .view()
        .render()
        .into_iter()
        .filter(|r| matches!(r.card, ToolCard::Confirmation { prompt: Some(_), .. }))
        .count();
    assert_eq!(prompts, 1);
}

#[tokio::test]
async fn test_text_only_turn_ends_older_prompt() {
    let sink = Arc::new(TestSink::default());
    let mut d = session(sink.clone());

    d.ingest(update("m1", "c1", "ask_user_confirmation", InvocationState::Executing, json!({"question_text": "Continue?"})));
    assert_eq!(d.pending_confirmation(), Some("c1"));

    d.observe_turn("m2");
    assert_eq!(d.pending_confirmation(), None);
    let err = d.select_option("c1", 0).await.unwrap_err();
    assert!(matches!(err, Error::Prompt(PromptError::NotActive { .. })));
    assert!(sink.sent().is_empty());

    // Re-observing the current turn changes nothing.
    d.observe_turn("m2");
    d.observe_turn("m1");
    assert_eq!(d.view().latest_turn(), Some("m2"));
}

#[tokio::test]
async fn test_unknown_tool_renders_fallback() {
    let sink = Arc::new(TestSink::default());
    let mut d = session(sink.clone());

    let jobs = d.ingest(update("m1", "c1", "does_not_exist", InvocationState::Pending, json!({"q": 1})));
    assert!(jobs.is_empty());

    let rendered = d.view().render();
    assert_eq!(rendered.len(), 1);
    assert_eq!(
        rendered[0].card,
        ToolCard::Unknown {
            name: "does_not_exist".to_string(),
            arguments: json!({"q": 1})
        }
    );
    assert!(sink.sent().is_empty());
}

#[tokio::test]
async fn test_failed_send_raises_banner_and_retry_sends_once() {
    let sink = Arc::new(TestSink::failing(1));
    let mut d = session(sink.clone());

    let deliveries = d
        .process(update(
            "m1",
            "c1",
            "change_background_color",
            InvocationState::Executing,
            json!({"colorHexCode": "#00F"}),
        ))
        .await;
    assert!(matches!(deliveries[0], Delivery::Failed { .. }));
    assert_eq!(d.banners().len(), 1);
    assert!(d.banners()[0].retryable);
    assert!(sink.sent().is_empty());

    assert_eq!(d.retry("c1").await.unwrap(), Delivery::Sent);
    assert!(d.banners().is_empty());
    assert_eq!(d.retry("c1").await.unwrap(), Delivery::Sent);
    assert_eq!(sink.sent().len(), 1);
}

#[tokio::test]
async fn test_jobs_may_complete_out_of_order() {
    let sink = Arc::new(TestSink::default());
    let mut d = session(sink.clone());

    let mut first = d.ingest(update("m1", "c1", "change_background_color", InvocationState::Executing, json!({"colorHexCode": "#111"})));
    let mut second = d.ingest(update("m1", "c2", "change_background_color", InvocationState::Executing, json!({"colorHexCode": "#222"})));
    let (first, second) = (first.pop().unwrap(), second.pop().unwrap());

    let done_second = second.run().await;
    d.ingest(update("m1", "c3", "display_tool_info", InvocationState::Pending, tool_info("pending")));
    let done_first = first.run().await;

    d.complete(done_second).await;
    d.complete(done_first).await;

    let ids: Vec<String> = sink.sent().into_iter().map(|(id, _)| id).collect();
    assert_eq!(ids, ["c2", "c1"]);
    assert_eq!(d.background_color(), Some("#111"));
}

#[tokio::test]
async fn test_unreachable_image_raises_banner_and_retry_reruns_handler() {
    let sink = Arc::new(TestSink::default());
    let probe = Arc::new(FlakyProbe::new(1));
    let mut d = Dispatcher::builtin(sink.clone(), probe.clone()).unwrap();

    let deliveries = d
        .process(update(
            "m1",
            "c1",
            "display_product_card",
            InvocationState::Executing,
            json!({
                "product_id": "p-1",
                "product_name": "Widget",
                "price": 19.99,
                "image_url": "https://cdn.example.com/widget.png"
            }),
        ))
        .await;
    assert!(matches!(deliveries.as_slice(), [Delivery::Interrupted { .. }]));
    assert!(sink.sent().is_empty());
    assert_eq!(d.banners().len(), 1);
    assert!(d.banners()[0].retryable);
    assert!(d.banners()[0].message.contains("connection refused"));

    assert_eq!(d.retry("c1").await.unwrap(), Delivery::Sent);
    assert_eq!(probe.probes.load(Ordering::SeqCst), 2);
    assert!(d.banners().is_empty());
    assert_eq!(
        sink.sent(),
        vec![(
            "c1".to_string(),
            json!({"success": true, "product_id": "p-1", "message": "Product card displayed"})
        )]
    );
    match &d.view().render()[0].card {
        ToolCard::ProductCard { displayed, .. } => assert!(displayed),
        other => panic!("unexpected card {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_image_is_a_plain_failure() {
    let sink = Arc::new(TestSink::default());
    let mut d = session(sink.clone());

    d.process(update(
        "m1",
        "c1",
        "display_product_card",
        InvocationState::Executing,
        json!({
            "product_id": "p-1",
            "product_name": "Widget",
            "price": 19.99,
            "image_url": "https://cdn.example.com/missing.png"
        }),
    ))
    .await;
    assert!(d.banners().is_empty());
    assert_eq!(sink.sent().len(), 1);
    assert_eq!(d.retry("c1").await.unwrap(), Delivery::Sent);
    assert_eq!(sink.sent().len(), 1);
}
