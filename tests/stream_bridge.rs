//! Serving side to client side over the data-stream protocol: a proxy call
//! is rewritten, streamed, decoded, dispatched and answered.

use frontend_tools::catalogue::ToolCatalogue;
use frontend_tools::dispatch::{Delivery, Dispatcher, InvocationState};
use frontend_tools::serving::{FrontendActionProxy, PROXY_TOOL_NAME};
use frontend_tools::transport::stream::{decode_part, encode_part};
use frontend_tools::transport::{
    ChannelSink, HttpImageProbe, StreamDecoder, StreamEvent, StreamPart,
};
use frontend_tools::types::ToolCall;
use serde_json::json;
use std::sync::Arc;

fn proxy() -> FrontendActionProxy {
    FrontendActionProxy::new(Arc::new(ToolCatalogue::builtin().clone()))
}

#[tokio::test]
async fn test_proxy_call_round_trip() {
    let call = ToolCall {
        id: "call_42".into(),
        name: PROXY_TOOL_NAME.into(),
        arguments: json!({
            "frontend_tool_name": "change_background_color",
            "frontend_tool_args": {"colorHexCode": "#abc"}
        }),
    };
    let line = encode_part(&proxy().stream_part(&call).unwrap());

    let mut decoder = StreamDecoder::new("msg_1");
    assert!(matches!(
        decoder.feed("0:\"Changing the color\"\n").unwrap(),
        Some(StreamEvent::TurnStarted { .. })
    ));
    let update = decoder.feed(&line).unwrap().and_then(StreamEvent::into_update).unwrap();
    assert_eq!(update.invocation.state, InvocationState::Pending);

    let (sink, mut results) = ChannelSink::new();
    let mut dispatcher =
        Dispatcher::builtin(Arc::new(sink), Arc::new(HttpImageProbe::new().unwrap())).unwrap();
    let deliveries = dispatcher.process(update).await;
    assert_eq!(deliveries, vec![Delivery::Sent]);
    assert_eq!(dispatcher.background_color(), Some("#abc"));

    let outbound = results.recv().await.unwrap();
    let reply = encode_part(&outbound.to_part());
    assert_eq!(
        decode_part(&reply).unwrap(),
        StreamPart::ToolResult {
            tool_call_id: "call_42".into(),
            result: json!({"success": true, "message": "Background color changed to #abc"}),
        }
    );

    // The backend echoes the result; the call is completed and nothing is resent.
    let completed = decoder.feed(&reply).unwrap().unwrap();
    assert!(dispatcher.process_event(completed).await.is_empty());
    assert_eq!(
        dispatcher.view().entry("call_42").unwrap().state(),
        InvocationState::Completed
    );
    assert!(results.try_recv().is_err());
}

#[tokio::test]
async fn test_product_card_image_is_probed_over_http() {
    let mut server = mockito::Server::new_async().await;
    let image = server
        .mock("GET", "/widget.png")
        .with_status(200)
        .with_header("content-type", "image/png")
        .with_body([0x89, b'P', b'N', b'G'])
        .create_async()
        .await;

    let line = format!(
        "9:{}\n",
        json!({
            "toolCallId": "call_7",
            "toolName": "display_product_card",
            "args": {
                "product_id": "p-7",
                "product_name": "Widget",
                "price": 19.99,
                "image_url": format!("{}/widget.png", server.url())
            }
        })
    );
    let update = StreamDecoder::new("msg_2")
        .feed(&line)
        .unwrap()
        .and_then(StreamEvent::into_update)
        .unwrap();

    let (sink, mut results) = ChannelSink::new();
    let mut dispatcher =
        Dispatcher::builtin(Arc::new(sink), Arc::new(HttpImageProbe::new().unwrap())).unwrap();
    dispatcher.process(update).await;

    image.assert_async().await;
    let outbound = results.recv().await.unwrap();
    assert_eq!(
        outbound.result,
        json!({"success": true, "product_id": "p-7", "message": "Product card displayed"})
    );
}

#[tokio::test]
async fn test_text_only_turn_retires_older_confirmation() {
    let (sink, _results) = ChannelSink::new();
    let mut dispatcher =
        Dispatcher::builtin(Arc::new(sink), Arc::new(HttpImageProbe::new().unwrap())).unwrap();

    let mut first = StreamDecoder::new("m1");
    for line in [
        "0:\"Let me check with you.\"\n",
        "9:{\"toolCallId\":\"c1\",\"toolName\":\"ask_user_confirmation\",\"args\":{\"question_text\":\"Book it?\"}}\n",
    ] {
        if let Some(event) = first.feed(line).unwrap() {
            dispatcher.process_event(event).await;
        }
    }
    assert_eq!(dispatcher.pending_confirmation(), Some("c1"));

    let mut second = StreamDecoder::new("m2");
    for line in ["0:\"Sure, anything else?\"\n", "d:{\"finishReason\":\"stop\"}\n"] {
        if let Some(event) = second.feed(line).unwrap() {
            dispatcher.process_event(event).await;
        }
    }
    assert_eq!(dispatcher.pending_confirmation(), None);
    assert!(dispatcher.select_option("c1", 0).await.is_err());
}
