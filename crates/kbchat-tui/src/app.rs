use std::sync::Arc;

use kbchat_core::{
    ChatController, ChatTransport, ChatWidgets, Config, ConversationLog, EndpointSelector,
    InputField,
};
use ratatui::layout::Rect;

/// Controls that can hold keyboard focus, in Tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input,
    Endpoint,
    Send,
    Clear,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::Input => Focus::Endpoint,
            Focus::Endpoint => Focus::Send,
            Focus::Send => Focus::Clear,
            Focus::Clear => Focus::Input,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            Focus::Input => Focus::Clear,
            Focus::Endpoint => Focus::Input,
            Focus::Send => Focus::Endpoint,
            Focus::Clear => Focus::Send,
        }
    }
}

/// Screen regions recorded during render for mouse hit-testing.
#[derive(Debug, Default, Clone, Copy)]
pub struct Areas {
    pub chat: Option<Rect>,
    pub input: Option<Rect>,
    pub endpoint: Option<Rect>,
    pub send: Option<Rect>,
    pub clear: Option<Rect>,
}

pub struct App {
    pub should_quit: bool,
    pub focus: Focus,
    pub controller: ChatController,
    pub server_url: String,

    // Spinner frame, advanced on Tick while a request is pending
    pub animation_frame: usize,

    pub areas: Areas,
}

impl App {
    pub fn new(config: &Config, transport: Arc<dyn ChatTransport>) -> Self {
        let widgets = ChatWidgets {
            input: InputField::new(),
            selector: EndpointSelector::new(config.endpoint()),
            log: ConversationLog::new(),
        };

        Self {
            should_quit: false,
            focus: Focus::Input,
            controller: ChatController::new(widgets, transport),
            server_url: config.server_url().to_string(),
            animation_frame: 0,
            areas: Areas::default(),
        }
    }

    /// Send control activated.
    pub fn send(&mut self) {
        self.controller.send_message();
    }

    /// Clear control activated.
    pub fn clear(&mut self) {
        self.controller.clear_chat();
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn focus_previous(&mut self) {
        self.focus = self.focus.previous();
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.controller.log().is_loading() {
            self.animation_frame = self.animation_frame.wrapping_add(1);
        }
    }
}
