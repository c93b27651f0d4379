use omnichat_widget::messages::cards::{CardElement, DecodedCard};
use omnichat_widget::messages::{FileAttachment, Role};
use omnichat_widget::session::{HostSurface, ViewState, WidgetController, WidgetEvent};
use omnichat_widget::timeline::{EntryBody, TimelineEntry};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const HELP: &str = "\
commands:
  /open                      toggle the chat window
  /min                       minimize the window
  /close                     close (asks to end an active chat)
  /confirm | /cancel         answer the end-chat prompt
  /start <name> <email> [question]
  /new                       start a new chat after it ended
  /attach <path>             upload a file
  /click <entry> <control> [id=value ...]
  /quit
anything else is sent as a message";

/// What one line typed into the demo means.
#[derive(Debug, Clone, PartialEq)]
pub enum LineAction {
    Event(WidgetEvent),
    Attach(PathBuf),
    Help,
    Quit,
    Invalid(String),
}

pub fn parse_line(line: &str) -> Option<LineAction> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let Some(command) = line.strip_prefix('/') else {
        return Some(LineAction::Event(WidgetEvent::SubmitText(line.to_string())));
    };

    let mut words = command.split_whitespace();
    let action = match words.next().unwrap_or_default() {
        "open" => LineAction::Event(WidgetEvent::ToggleWindow),
        "min" => LineAction::Event(WidgetEvent::Minimize),
        "close" => LineAction::Event(WidgetEvent::CloseRequested),
        "confirm" => LineAction::Event(WidgetEvent::ConfirmEnd),
        "cancel" => LineAction::Event(WidgetEvent::CancelEnd),
        "new" => LineAction::Event(WidgetEvent::StartNewChat),
        "help" => LineAction::Help,
        "quit" | "exit" => LineAction::Quit,
        "start" => {
            let name = words.next().unwrap_or_default().to_string();
            let email = words.next().unwrap_or_default().to_string();
            let question = words.collect::<Vec<_>>().join(" ");
            LineAction::Event(WidgetEvent::SubmitPrechat {
                name,
                email,
                question,
            })
        }
        "attach" => match words.next() {
            Some(path) => LineAction::Attach(omnichat_widget::config::expand_path(path)),
            None => LineAction::Invalid("usage: /attach <path>".into()),
        },
        "click" => parse_click(words),
        other => LineAction::Invalid(format!("unknown command /{other}, try /help")),
    };
    Some(action)
}

fn parse_click<'a>(mut words: impl Iterator<Item = &'a str>) -> LineAction {
    let usage = || LineAction::Invalid("usage: /click <entry> <control> [id=value ...]".into());
    let (Some(entry), Some(control)) = (
        words.next().and_then(|w| w.parse().ok()),
        words.next().and_then(|w| w.parse().ok()),
    ) else {
        return usage();
    };
    let inputs: BTreeMap<String, String> = words
        .filter_map(|pair| pair.split_once('='))
        .map(|(id, value)| (id.to_string(), value.to_string()))
        .collect();
    LineAction::Event(WidgetEvent::ActivateControl {
        entry,
        control,
        inputs,
    })
}

pub async fn read_attachment(path: PathBuf) -> anyhow::Result<FileAttachment> {
    let data = tokio::fs::read(&path).await?;
    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    Ok(FileAttachment::new(name, data))
}

/// Prints the widget to stdout, one line per change.
#[derive(Debug, Default)]
pub struct TerminalSurface {
    shown: usize,
    last_status: Option<(ViewState, bool)>,
    typing: bool,
    confirm: bool,
    unread: u32,
}

impl HostSurface for TerminalSurface {
    fn refresh(&mut self, controller: &WidgetController) {
        let status = (controller.state(), controller.window_open());
        if self.last_status != Some(status) {
            let window = if status.1 { "open" } else { "collapsed" };
            println!(
                "== {} | {} [{window}]",
                controller.config().header_title,
                controller.status_line()
            );
            if status.0 == ViewState::AwaitingPrechat && status.1 {
                let prechat = &controller.config().prechat;
                println!("   {}: {}", prechat.welcome_title, prechat.welcome_message);
                println!("   /start <name> <email> [question]  ({})", prechat.start_btn_text);
            }
            if status.0 == ViewState::Ended {
                println!("   /new to start another chat");
            }
            self.last_status = Some(status);
        }

        let entries = controller.timeline().entries();
        if entries.len() < self.shown {
            self.shown = 0;
        }
        for entry in &entries[self.shown..] {
            for line in render_entry(entry) {
                println!("{line}");
            }
        }
        self.shown = entries.len();

        if controller.agent_typing() != self.typing {
            self.typing = controller.agent_typing();
            if self.typing {
                println!("   (agent is typing...)");
            }
        }
        if controller.confirm_visible() && !self.confirm {
            println!("   End this chat? /confirm or /cancel");
        }
        self.confirm = controller.confirm_visible();

        let unread = controller.unread().count();
        if unread != self.unread && unread > 0 {
            println!("   ({unread} unread)");
        }
        self.unread = unread;
    }

    fn notify(&mut self, message: &str) {
        println!("!! {message}");
    }

    fn open_url(&mut self, url: &str) {
        println!("-> open {url}");
    }
}

pub fn render_entry(entry: &TimelineEntry) -> Vec<String> {
    let who = match entry.role {
        Role::User => "you".to_string(),
        Role::System => String::new(),
        Role::Agent => match &entry.avatar {
            Some(avatar) => format!("{} ({}, {})", entry.sender, avatar.initials, avatar.style),
            None => entry.sender.clone(),
        },
    };

    let mut lines = match &entry.body {
        EntryBody::Notice(text) => vec![format!("   * {text}")],
        EntryBody::Text(text) => vec![format!("{who}> {text}")],
        EntryBody::Card(card) => {
            let mut lines = vec![format!("{who}> [{}]", entry.kind)];
            lines.extend(card_lines(card));
            lines
        }
    };

    let mut index = 0;
    for group in &entry.groups {
        let marker = if group.enabled { "" } else { " (disabled)" };
        for control in &group.controls {
            lines.push(format!("     [{} {index}] {}{marker}", entry.id, control.label));
            index += 1;
        }
    }
    lines
}

fn card_lines(card: &DecodedCard) -> Vec<String> {
    match card {
        DecodedCard::Adaptive(view) => view
            .body
            .iter()
            .map(|element| match element {
                CardElement::Text(text) => format!("     {text}"),
                CardElement::Image { url, alt } => {
                    format!("     <image {}>", alt.as_deref().unwrap_or(url))
                }
                CardElement::Fact { title, value } => format!("     {title}: {value}"),
                CardElement::Input {
                    id,
                    label,
                    placeholder,
                } => format!(
                    "     {} [{id}=...] {}",
                    label.as_deref().unwrap_or("input"),
                    placeholder.as_deref().unwrap_or_default()
                ),
            })
            .collect(),
        DecodedCard::Hero { cards, .. } => cards
            .iter()
            .flat_map(|card| {
                [&card.title, &card.subtitle, &card.text]
                    .into_iter()
                    .flatten()
                    .map(|line| format!("     {line}"))
                    .collect::<Vec<_>>()
            })
            .collect(),
        DecodedCard::Suggested(view) => view
            .text
            .iter()
            .map(|text| format!("     {text}"))
            .collect(),
    }
}
