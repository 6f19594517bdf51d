//! UI-agnostic conversation state
//!
//! This module contains the conversation log and the messages it holds. It
//! doesn't depend on any specific UI framework; renderers read the entries and
//! the scroll state and draw them however they like.

use chrono::{Local, Timelike};
use serde::{Deserialize, Serialize};

/// Text shown next to the spinner while a request is in flight.
pub const LOADING_TEXT: &str = "AI Chatbot is thinking...";

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    /// Bold label rendered in front of the message text.
    pub fn label(&self) -> &'static str {
        match self {
            ChatRole::User => "User:",
            ChatRole::Assistant => "Chatbot:",
        }
    }
}

/// A chat message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub timestamp: String,
}

impl ChatMessage {
    /// Create a message stamped with the current local time. The content is
    /// neutralized so that it is always displayed literally.
    pub fn new(role: ChatRole, content: &str) -> Self {
        Self::with_timestamp(role, content, format_timestamp(&Local::now()))
    }

    pub fn with_timestamp(role: ChatRole, content: &str, timestamp: String) -> Self {
        Self {
            role,
            content: sanitize_text(content),
            timestamp,
        }
    }

    /// ` [H:MM:SS AM]` suffix appended after the text.
    pub fn timestamp_suffix(&self) -> String {
        format!(" [{}]", self.timestamp)
    }

    /// Label, text, and timestamp flattened into one string.
    pub fn plain_text(&self) -> String {
        format!("{} {}{}", self.role.label(), self.content, self.timestamp_suffix())
    }
}

/// Format a time of day as `H:MM:SS AM/PM`.
pub fn format_timestamp<T: Timelike>(time: &T) -> String {
    let (is_pm, hour) = time.hour12();
    format!(
        "{}:{:02}:{:02} {}",
        hour,
        time.minute(),
        time.second(),
        if is_pm { "PM" } else { "AM" }
    )
}

/// Drop terminal control characters so message text can't emit escape
/// sequences. Newlines survive, tabs become spaces.
pub fn sanitize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\n' => out.push('\n'),
            '\t' => out.push_str("    "),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

/// One row in the conversation log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    Message(ChatMessage),
    /// The loading indicator. There is never more than one.
    Loading,
}

/// Ordered conversation plus the view state needed to keep it scrolled.
#[derive(Debug, Clone)]
pub struct ConversationLog {
    entries: Vec<LogEntry>,
    scroll: u16,
    follow_tail: bool,
}

impl Default for ConversationLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationLog {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            scroll: 0,
            follow_tail: true,
        }
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.entries.iter().filter_map(|entry| match entry {
            LogEntry::Message(msg) => Some(msg),
            LogEntry::Loading => None,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push_message(&mut self, message: ChatMessage) {
        self.entries.push(LogEntry::Message(message));
        self.scroll_to_bottom();
    }

    /// Append the loading indicator. Returns false if it was already shown.
    pub fn show_loading(&mut self) -> bool {
        if self.is_loading() {
            return false;
        }
        self.entries.push(LogEntry::Loading);
        self.scroll_to_bottom();
        true
    }

    /// Remove the loading indicator if present.
    pub fn hide_loading(&mut self) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| *entry != LogEntry::Loading);
        self.entries.len() != before
    }

    pub fn is_loading(&self) -> bool {
        self.entries.contains(&LogEntry::Loading)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.scroll = 0;
        self.follow_tail = true;
    }

    // Scroll state

    /// Pin the view to the last entry. The renderer turns this into an offset
    /// once it knows the wrapped height.
    pub fn scroll_to_bottom(&mut self) {
        self.follow_tail = true;
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.follow_tail = false;
        self.scroll = self.scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.follow_tail = false;
        self.scroll = self.scroll.saturating_add(lines);
    }

    pub fn follows_tail(&self) -> bool {
        self.follow_tail
    }

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    /// Compute the scroll offset for a view `visible` lines tall showing
    /// `total` lines of content. Scrolling manually back to the bottom
    /// re-pins the view.
    pub fn resolve_scroll(&mut self, total: u16, visible: u16) -> u16 {
        let max_scroll = total.saturating_sub(visible);
        if self.follow_tail || self.scroll >= max_scroll {
            self.scroll = max_scroll;
            self.follow_tail = true;
        }
        self.scroll
    }
}
