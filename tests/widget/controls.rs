use std::collections::BTreeMap;

use omnichat_widget::messages::types::ADAPTIVE_CARD_METADATA_KEY;
use omnichat_widget::messages::{FileAttachment, MessageKind, Role};
use omnichat_widget::session::WidgetEvent;
use serde_json::{Value, json};

use crate::widget_harness::{
    Harness, ScriptedFactory, ScriptedTransport, agent, connect, raw_config,
};

fn suggested_actions() -> String {
    json!({
        "text": "What can I help with?",
        "suggestedActions": { "actions": [
            { "type": "imBack", "title": "Track Order", "value": "track my order" },
            { "type": "imBack", "title": "Returns", "value": "Returns" }
        ]}
    })
    .to_string()
}

fn click(entry: u64, control: usize) -> WidgetEvent {
    WidgetEvent::ActivateControl {
        entry,
        control,
        inputs: BTreeMap::new(),
    }
}

#[tokio::test]
async fn suggested_action_sends_value_and_disables_group() {
    let transport = ScriptedTransport::new();
    let mut widget = Harness::mount(raw_config(true), ScriptedFactory::new(transport.clone()));
    connect(&mut widget, "Ada", "").await;

    transport.push(agent("card-1", &suggested_actions()));
    let snap = widget
        .wait_for("suggested actions", |s| {
            s.entries.iter().any(|e| e.kind == MessageKind::SuggestedActions)
        })
        .await;
    let card = snap.entries[0].id;

    widget.send(click(card, 0)).await;
    let snap = widget
        .wait_for("echo", |s| s.texts_by(Role::User) == vec!["Track Order"])
        .await;
    assert!(!snap.entries[0].groups[0].enabled);
    assert_eq!(transport.sent()[0].content, "track my order");

    widget.send(click(card, 1)).await;
    let snap = widget.settle().await;
    assert_eq!(transport.sent().len(), 1, "a used group accepts no more clicks");
    assert_eq!(snap.texts_by(Role::User), vec!["Track Order"]);
}

#[tokio::test]
async fn failed_activation_re_enables_the_group() {
    let transport = ScriptedTransport::new();
    let mut widget = Harness::mount(raw_config(true), ScriptedFactory::new(transport.clone()));
    connect(&mut widget, "Ada", "").await;

    transport.push(agent("card-1", &suggested_actions()));
    let snap = widget.wait_for("card", |s| !s.entries.is_empty()).await;
    let card = snap.entries[0].id;

    transport.fail_sends(true);
    widget.send(click(card, 1)).await;
    let snap = widget.settle().await;
    assert!(snap.entries[0].groups[0].enabled);
    assert!(snap.texts_by(Role::User).is_empty());

    transport.fail_sends(false);
    widget.send(click(card, 1)).await;
    widget
        .wait_for("retry echo", |s| s.texts_by(Role::User) == vec!["Returns"])
        .await;
    assert_eq!(transport.sent()[0].content, "Returns");
}

#[tokio::test]
async fn adaptive_submit_carries_inputs_and_bot_metadata() {
    let transport = ScriptedTransport::new();
    let mut widget = Harness::mount(raw_config(true), ScriptedFactory::new(transport.clone()));
    connect(&mut widget, "Ada", "").await;

    let card = json!({
        "type": "AdaptiveCard",
        "body": [
            { "type": "TextBlock", "text": "Rate us" },
            { "type": "Input.Text", "id": "comment" }
        ],
        "actions": [
            { "type": "Action.Submit", "title": "Send", "data": { "actionSubmitId": "Send" } }
        ]
    })
    .to_string();
    transport.push(agent("card-1", &card));
    let snap = widget.wait_for("adaptive card", |s| !s.entries.is_empty()).await;
    assert_eq!(snap.entries[0].input_ids(), vec!["comment"]);

    widget
        .send(WidgetEvent::ActivateControl {
            entry: snap.entries[0].id,
            control: 0,
            inputs: BTreeMap::from([("comment".to_string(), "quick and kind".to_string())]),
        })
        .await;
    widget
        .wait_for("echo", |s| s.texts_by(Role::User) == vec!["Send"])
        .await;

    let sent = transport.sent();
    let payload: Value = serde_json::from_str(&sent[0].content).expect("submit payload is json");
    assert_eq!(payload["value"]["comment"], "quick and kind");
    assert_eq!(payload["value"]["actionSubmitId"], "Send");
    assert!(sent[0].metadata.contains_key(ADAPTIVE_CARD_METADATA_KEY));
}

#[tokio::test]
async fn open_url_controls_bypass_the_transport() {
    let transport = ScriptedTransport::new();
    let mut widget = Harness::mount(raw_config(true), ScriptedFactory::new(transport.clone()));
    connect(&mut widget, "Ada", "").await;

    let hero = json!({
        "attachments": [{
            "contentType": "application/vnd.microsoft.card.hero",
            "content": {
                "title": "Order #42",
                "buttons": [
                    { "type": "openUrl", "title": "Track", "value": "https://track.example.com/42" },
                    { "type": "openUrl", "title": "Script", "value": "javascript:alert(1)" }
                ]
            }
        }]
    })
    .to_string();
    transport.push(agent("hero-1", &hero));
    let snap = widget.wait_for("hero card", |s| !s.entries.is_empty()).await;
    let card = snap.entries[0].id;

    widget.send(click(card, 0)).await;
    widget.send(click(card, 1)).await;
    widget.send(click(card, 0)).await;
    let snap = widget.settle().await;
    assert_eq!(
        snap.opened,
        vec!["https://track.example.com/42", "https://track.example.com/42"]
    );
    assert!(snap.entries[0].groups[0].enabled);
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn failed_text_send_adds_a_notice() {
    let transport = ScriptedTransport::new();
    let mut widget = Harness::mount(raw_config(true), ScriptedFactory::new(transport.clone()));
    connect(&mut widget, "Ada", "").await;

    transport.fail_sends(true);
    widget.send(WidgetEvent::SubmitText("are you there?".into())).await;
    let snap = widget
        .wait_for("failure notice", |s| {
            s.texts().contains(&"Failed to send. Try again.".to_string())
        })
        .await;
    assert_eq!(snap.texts_by(Role::User), vec!["are you there?"]);
}

#[tokio::test]
async fn uploads_respect_the_size_limit() {
    let transport = ScriptedTransport::new();
    let mut widget = Harness::mount(raw_config(true), ScriptedFactory::new(transport.clone()));
    connect(&mut widget, "Ada", "").await;

    widget
        .send(WidgetEvent::AttachFile(FileAttachment::new(
            "video.mp4",
            vec![0; 1_000_001],
        )))
        .await;
    let snap = widget.wait_for("size alert", |s| !s.alerts.is_empty()).await;
    assert_eq!(snap.alerts, vec!["File too large (max 1MB)"]);
    assert!(transport.uploads().is_empty());

    widget
        .send(WidgetEvent::AttachFile(FileAttachment::new(
            "receipt.pdf",
            b"%PDF-1.4".to_vec(),
        )))
        .await;
    widget
        .wait_for("upload echo", |s| {
            s.texts_by(Role::User) == vec!["📎 receipt.pdf"]
        })
        .await;
    assert_eq!(transport.uploads(), vec!["receipt.pdf"]);
}
