use std::time::Duration;

use omnichat_widget::config::resolve;
use omnichat_widget::messages::{InboundMessage, Role};
use omnichat_widget::session::{ANONYMOUS_NAME, ViewState, WidgetEvent};

use crate::widget_harness::{
    Harness, ScriptedFactory, ScriptedTransport, agent, connect, raw_config,
};

#[tokio::test]
async fn prechat_round_trip_sends_question_and_renders_reply() {
    let transport = ScriptedTransport::new();
    let factory = ScriptedFactory::new(transport.clone());
    let mut widget = Harness::mount(raw_config(true), factory.clone());

    let active = connect(&mut widget, "Ada", "Where is my order?").await;
    assert!(active.window_open);
    assert_eq!(factory.created(), 1);
    assert_eq!(transport.started_with()[0].name, "Ada");
    assert_eq!(transport.started_with()[0].email, "ada@example.com");

    transport.push(agent("m1", "Let me check that for you."));
    let snap = widget
        .wait_for("agent reply", |s| s.texts_by(Role::Agent).len() == 1)
        .await;
    assert_eq!(snap.texts_by(Role::User), vec!["Where is my order?"]);
    assert_eq!(snap.entries.last().map(|e| e.sender.as_str()), Some("Sarah"));

    widget.settle().await;
    assert_eq!(transport.sent()[0].content, "Where is my order?");

    widget.finish().await;
    assert_eq!(transport.ended(), 1, "an active chat is ended on shutdown");
}

#[tokio::test]
async fn incomplete_prechat_alerts_without_connecting() {
    let transport = ScriptedTransport::new();
    let factory = ScriptedFactory::new(transport.clone());
    let mut widget = Harness::mount(raw_config(true), factory.clone());

    widget.send(WidgetEvent::ToggleWindow).await;
    widget
        .send(WidgetEvent::SubmitPrechat {
            name: "  ".into(),
            email: "ada@example.com".into(),
            question: String::new(),
        })
        .await;

    let snap = widget.wait_for("alert", |s| !s.alerts.is_empty()).await;
    assert_eq!(snap.alerts, vec!["Please fill all required fields"]);
    assert_eq!(snap.state, ViewState::AwaitingPrechat);
    assert_eq!(factory.created(), 0);
}

#[tokio::test]
async fn opening_without_prechat_connects_anonymously() {
    let transport = ScriptedTransport::new();
    let mut widget = Harness::mount(raw_config(false), ScriptedFactory::new(transport.clone()));

    let first = widget.wait_for("initial refresh", |_| true).await;
    assert_eq!(first.state, ViewState::Idle);

    widget.send(WidgetEvent::ToggleWindow).await;
    widget
        .wait_for("active session", |s| s.state == ViewState::Active)
        .await;
    assert_eq!(transport.started_with()[0].name, ANONYMOUS_NAME);
}

#[tokio::test]
async fn start_failure_returns_to_prechat_with_alert() {
    let transport = ScriptedTransport::new();
    transport.fail_start("widget is offline");
    let mut widget = Harness::mount(raw_config(true), ScriptedFactory::new(transport.clone()));

    widget.send(WidgetEvent::ToggleWindow).await;
    widget
        .send(WidgetEvent::SubmitPrechat {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            question: String::new(),
        })
        .await;

    let snap = widget.wait_for("connect alert", |s| !s.alerts.is_empty()).await;
    assert_eq!(snap.alerts, vec!["Failed to connect: widget is offline"]);
    assert_eq!(snap.state, ViewState::AwaitingPrechat);
}

#[tokio::test]
async fn pushed_and_polled_copies_render_once() {
    let transport = ScriptedTransport::new();
    let mut widget = Harness::mount(raw_config(true), ScriptedFactory::new(transport.clone()));
    connect(&mut widget, "Ada", "").await;

    transport.push(agent("m1", "Hello there"));
    widget
        .wait_for("pushed message", |s| s.texts().contains(&"Hello there".to_string()))
        .await;

    transport.add_to_history(agent("m2", "Only seen by polling"));
    transport.add_to_history(InboundMessage::new(Role::User, "my own echo").with_id("u1"));
    widget
        .wait_for("polled message", |s| {
            s.texts().contains(&"Only seen by polling".to_string())
        })
        .await;

    let snap = widget.settle().await;
    assert_eq!(
        snap.texts_by(Role::Agent),
        vec!["Hello there", "Only seen by polling"]
    );
    assert!(snap.texts_by(Role::User).is_empty());
}

#[tokio::test]
async fn typing_indicator_clears_on_timeout_and_on_message() {
    let transport = ScriptedTransport::new();
    let mut widget = Harness::mount(raw_config(true), ScriptedFactory::new(transport.clone()));
    connect(&mut widget, "Ada", "").await;

    transport.typing(true);
    widget.wait_for("typing shown", |s| s.typing).await;
    widget.wait_for("typing expired", |s| !s.typing).await;

    transport.typing(true);
    widget.wait_for("typing shown again", |s| s.typing).await;
    transport.push(agent("m1", "Done typing"));
    let snap = widget
        .wait_for("reply clears typing", |s| !s.typing && !s.entries.is_empty())
        .await;
    assert_eq!(snap.texts_by(Role::Agent), vec!["Done typing"]);
}

#[tokio::test]
async fn unread_counts_while_collapsed() {
    let transport = ScriptedTransport::new();
    let mut widget = Harness::mount(raw_config(true), ScriptedFactory::new(transport.clone()));
    connect(&mut widget, "Ada", "").await;

    widget.send(WidgetEvent::Minimize).await;
    widget.wait_for("collapsed", |s| !s.window_open).await;

    transport.push(agent("m1", "Are you still there?"));
    transport.push(agent("m2", "Just checking"));
    widget.wait_for("two unread", |s| s.unread == 2).await;

    widget.send(WidgetEvent::ToggleWindow).await;
    let snap = widget.wait_for("badge reset", |s| s.window_open).await;
    assert_eq!(snap.unread, 0);
}

#[tokio::test]
async fn closing_an_active_chat_asks_first_then_ends_it() {
    let transport = ScriptedTransport::new();
    let mut widget = Harness::mount(raw_config(true), ScriptedFactory::new(transport.clone()));
    connect(&mut widget, "Ada", "").await;

    widget.send(WidgetEvent::CloseRequested).await;
    let snap = widget.wait_for("confirm prompt", |s| s.confirm_visible).await;
    assert!(snap.window_open);

    widget.send(WidgetEvent::CancelEnd).await;
    let snap = widget.wait_for("prompt dismissed", |s| !s.confirm_visible).await;
    assert_eq!(snap.state, ViewState::Active);

    widget.send(WidgetEvent::CloseRequested).await;
    widget.send(WidgetEvent::ConfirmEnd).await;
    widget.wait_for("ended", |s| s.state == ViewState::Ended).await;
    widget.settle().await;
    assert_eq!(transport.ended(), 1);
}

#[tokio::test]
async fn agent_ending_then_starting_over() {
    let transport = ScriptedTransport::new();
    let factory = ScriptedFactory::new(transport.clone());
    let mut widget = Harness::mount(raw_config(true), factory.clone());
    connect(&mut widget, "Ada", "").await;
    transport.push(agent("m1", "Anything else?"));
    widget.wait_for("message", |s| !s.entries.is_empty()).await;

    transport.agent_ends();
    widget.wait_for("ended", |s| s.state == ViewState::Ended).await;

    widget.send(WidgetEvent::SubmitText("hello?".into())).await;
    let snap = widget.settle().await;
    assert_eq!(snap.texts_by(Role::User), Vec::<String>::new());

    widget.send(WidgetEvent::StartNewChat).await;
    let snap = widget
        .wait_for("fresh pre-chat", |s| s.state == ViewState::AwaitingPrechat)
        .await;
    assert!(snap.entries.is_empty());

    widget
        .send(WidgetEvent::SubmitPrechat {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            question: String::new(),
        })
        .await;
    widget
        .wait_for("second session", |s| s.state == ViewState::Active)
        .await;
    assert_eq!(factory.created(), 2);

    // The scripted history still holds m1. The reset forgot it, so the new
    // session's first poll shows it once more, and only once.
    widget
        .wait_for("history re-polled", |s| !s.entries.is_empty())
        .await;
    let snap = widget.settle().await;
    assert_eq!(snap.texts_by(Role::Agent), vec!["Anything else?"]);

    let controller = widget.finish().await;
    assert_eq!(*controller.config(), resolve(raw_config(true)).unwrap());
}

#[tokio::test]
async fn new_chat_request_while_connecting_keeps_the_start() {
    let transport = ScriptedTransport::new();
    transport.delay_start(Duration::from_millis(500));
    let factory = ScriptedFactory::new(transport.clone());
    let mut widget = Harness::mount(raw_config(true), factory.clone());

    widget.send(WidgetEvent::ToggleWindow).await;
    widget
        .send(WidgetEvent::SubmitPrechat {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            question: "hello".into(),
        })
        .await;
    widget
        .wait_for("connecting", |s| s.state == ViewState::Connecting)
        .await;

    widget.send(WidgetEvent::StartNewChat).await;
    let snap = widget.settle().await;
    assert_eq!(snap.state, ViewState::Connecting);

    let snap = widget
        .wait_for("session up", |s| s.state == ViewState::Active)
        .await;
    assert_eq!(snap.texts_by(Role::User), vec!["hello"]);
    widget.settle().await;
    assert_eq!(transport.sent()[0].content, "hello");
    assert_eq!(transport.ended(), 0);
    assert_eq!(factory.created(), 1);
}

#[tokio::test]
async fn callbacks_from_an_ended_chat_are_ignored_after_a_reset() {
    let transport = ScriptedTransport::new();
    let mut widget = Harness::mount(raw_config(true), ScriptedFactory::new(transport.clone()));
    connect(&mut widget, "Ada", "").await;

    transport.agent_ends();
    widget.wait_for("ended", |s| s.state == ViewState::Ended).await;
    widget.send(WidgetEvent::StartNewChat).await;
    widget
        .wait_for("fresh pre-chat", |s| s.state == ViewState::AwaitingPrechat)
        .await;

    transport.push(agent("late-1", "Sorry, one more thing"));
    transport.typing(true);
    transport.agent_ends();
    let snap = widget.settle().await;
    assert_eq!(snap.state, ViewState::AwaitingPrechat);
    assert!(snap.entries.is_empty());
    assert!(!snap.typing);
    assert_eq!(snap.unread, 0);
}
