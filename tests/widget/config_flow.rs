use std::sync::Arc;

use omnichat_widget::config::{GistEndpoints, RawWidgetConfig, fetch_gist_config};
use omnichat_widget::error::{ConfigError, WidgetError};
use omnichat_widget::messages::Role;
use omnichat_widget::session::{ViewState, WidgetEvent, WidgetHost};
use omnichat_widget::transport::{DemoTiming, demo_factory};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::widget_harness::{Harness, ScriptedFactory, ScriptedTransport, raw_config};

const FILE_CONFIG: &str = r#"
orgId = "org-123"
orgUrl = "https://org.omnichannelengagementhub.com"
headerTitle = "Contoso Help"
pollIntervalMs = 20
"#;

#[test]
fn missing_connection_fields_mount_nothing() {
    let transport = ScriptedTransport::new();
    let factory = ScriptedFactory::new(transport);
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("widget.toml");
    std::fs::write(&file, FILE_CONFIG).unwrap();

    let raw = RawWidgetConfig::load_from_path(&file).unwrap();
    let mut host = WidgetHost::new();
    let Err(err) = host.mount(raw, factory.clone()) else {
        panic!("a config without widgetId must not mount");
    };

    assert!(matches!(
        err,
        WidgetError::Config(ConfigError::MissingConnectionFields { ref missing }) if missing == &["widgetId"]
    ));
    assert!(!host.is_mounted());
    assert_eq!(factory.created(), 0);
}

#[tokio::test]
async fn gist_config_overlays_the_file_config() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/raw/gist-1/config.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{ "widgetId": "widget-from-gist", "headerTitle": "Gist Help", "enablePrechatForm": false }"#,
        ))
        .mount(&server)
        .await;
    let endpoints = GistEndpoints {
        raw_base: server.uri(),
        api_base: server.uri(),
    };

    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("widget.toml");
    std::fs::write(&file, FILE_CONFIG).unwrap();
    let base = RawWidgetConfig::load_from_path(&file).unwrap();
    let remote = fetch_gist_config(&reqwest::Client::new(), &endpoints, "gist-1")
        .await
        .unwrap();

    let transport = ScriptedTransport::new();
    let mut widget = Harness::mount(
        base.merged_with(remote),
        ScriptedFactory::new(transport.clone()),
    );
    widget.send(WidgetEvent::ToggleWindow).await;
    widget
        .wait_for("anonymous session", |s| s.state == ViewState::Active)
        .await;

    let controller = widget.finish().await;
    assert_eq!(controller.config().header_title, "Gist Help");
    assert_eq!(controller.config().connection.widget_id, "widget-from-gist");
    assert_eq!(controller.config().connection.org_id, "org-123");
}

#[tokio::test]
async fn demo_agent_greets_and_answers() {
    let mut widget = Harness::mount(
        raw_config(true),
        Arc::new(demo_factory(DemoTiming::immediate())),
    );

    widget.send(WidgetEvent::ToggleWindow).await;
    widget
        .send(WidgetEvent::SubmitPrechat {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            question: String::new(),
        })
        .await;
    let snap = widget
        .wait_for("greeting", |s| !s.texts_by(Role::Agent).is_empty())
        .await;
    assert_eq!(
        snap.texts_by(Role::Agent),
        vec!["Hi Ada! 👋 I'm Sarah. How can I help you today?"]
    );
    assert_eq!(
        snap.texts_by(Role::System),
        vec!["Demo Mode - Connected with Sarah"]
    );

    widget
        .send(WidgetEvent::SubmitText("can I see the menu?".into()))
        .await;
    let snap = widget
        .wait_for("menu card", |s| s.entries.iter().any(|e| !e.groups.is_empty()))
        .await;
    let menu = snap.entries.iter().find(|e| !e.groups.is_empty()).unwrap();
    let labels: Vec<&str> = menu.groups[0].controls.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(labels, vec!["Track Order", "Returns", "Talk to a person"]);
}
