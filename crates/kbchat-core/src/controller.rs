//! The chat controller: validates input, dispatches requests, and writes the
//! outcome into the conversation log.
//!
//! Requests run on spawned tasks and report back through a channel, so the
//! UI task owns every mutation of the log. Only one request is live at a
//! time: sending again aborts the in-flight request and any completion that
//! does not belong to the live request is dropped.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::client::ChatTransport;
use crate::endpoint::Endpoint;
use crate::error::ChatError;
use crate::state::{ChatMessage, ChatRole, ConversationLog};
use crate::widgets::{EndpointSelector, InputField};

pub const INVALID_INPUT_TEXT: &str = "Invalid input: Please type a message before sending.";
pub const SERVER_ERROR_TEXT: &str = "An error occurred while processing your request.";
pub const NETWORK_ERROR_TEXT: &str = "Network error: Unable to reach the server.";
pub const MALFORMED_RESPONSE_TEXT: &str =
    "Malformed response: The server reply could not be read.";

/// The UI elements the controller reads from and writes to.
#[derive(Debug, Default)]
pub struct ChatWidgets {
    pub input: InputField,
    pub selector: EndpointSelector,
    pub log: ConversationLog,
}

/// Result of one request, delivered back to the UI task.
#[derive(Debug)]
pub struct Completion {
    pub request_id: u64,
    pub outcome: Result<String, ChatError>,
}

#[derive(Debug)]
struct PendingRequest {
    id: u64,
    endpoint: Endpoint,
    task: JoinHandle<()>,
}

pub struct ChatController {
    widgets: ChatWidgets,
    transport: Arc<dyn ChatTransport>,
    pending: Option<PendingRequest>,
    next_request_id: u64,
    completion_tx: mpsc::UnboundedSender<Completion>,
    completion_rx: mpsc::UnboundedReceiver<Completion>,
}

/// Trimmed message text, or [`ChatError::EmptyInput`] if nothing is left.
pub fn validate_input(raw: &str) -> Result<String, ChatError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(ChatError::EmptyInput);
    }
    Ok(text.to_string())
}

impl ChatController {
    pub fn new(widgets: ChatWidgets, transport: Arc<dyn ChatTransport>) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        Self {
            widgets,
            transport,
            pending: None,
            next_request_id: 1,
            completion_tx,
            completion_rx,
        }
    }

    pub fn input(&self) -> &InputField {
        &self.widgets.input
    }

    pub fn input_mut(&mut self) -> &mut InputField {
        &mut self.widgets.input
    }

    pub fn selector(&self) -> &EndpointSelector {
        &self.widgets.selector
    }

    pub fn selector_mut(&mut self) -> &mut EndpointSelector {
        &mut self.widgets.selector
    }

    pub fn log(&self) -> &ConversationLog {
        &self.widgets.log
    }

    pub fn log_mut(&mut self) -> &mut ConversationLog {
        &mut self.widgets.log
    }

    /// Id of the request whose reply is still awaited.
    pub fn pending_request(&self) -> Option<u64> {
        self.pending.as_ref().map(|p| p.id)
    }

    /// Read the input field and post it to the selected endpoint.
    ///
    /// Returns the id of the spawned request, or `None` if the input was
    /// empty. Must be called from within a tokio runtime.
    pub fn send_message(&mut self) -> Option<u64> {
        let text = match validate_input(self.widgets.input.value()) {
            Ok(text) => text,
            Err(err) => {
                tracing::debug!(error = %err, "rejected message");
                self.display_message(ChatRole::Assistant, INVALID_INPUT_TEXT);
                return None;
            }
        };

        if let Some(stale) = self.pending.take() {
            tracing::info!(
                request_id = stale.id,
                endpoint = stale.endpoint.as_str(),
                "superseding in-flight request"
            );
            stale.task.abort();
            self.hide_loading_indicator();
        }

        self.display_message(ChatRole::User, &text);
        self.show_loading_indicator();

        let endpoint = self.widgets.selector.endpoint();
        let request_id = self.next_request_id;
        self.next_request_id += 1;

        tracing::info!(request_id, endpoint = endpoint.as_str(), "sending message");

        let transport = Arc::clone(&self.transport);
        let tx = self.completion_tx.clone();
        let task = tokio::spawn(async move {
            let outcome = transport.send(endpoint, &text).await;
            // The receiver lives as long as the controller.
            let _ = tx.send(Completion {
                request_id,
                outcome,
            });
        });

        self.pending = Some(PendingRequest {
            id: request_id,
            endpoint,
            task,
        });

        self.widgets.input.clear();
        Some(request_id)
    }

    /// Append a message to the log and scroll to it.
    pub fn display_message(&mut self, role: ChatRole, text: &str) {
        self.widgets.log.push_message(ChatMessage::new(role, text));
    }

    pub fn show_loading_indicator(&mut self) {
        self.widgets.log.show_loading();
        self.widgets.log.scroll_to_bottom();
    }

    pub fn hide_loading_indicator(&mut self) {
        self.widgets.log.hide_loading();
    }

    /// Empty the log. A request still in flight is not cancelled; its reply
    /// lands in the cleared log.
    pub fn clear_chat(&mut self) {
        tracing::debug!(entries = self.widgets.log.len(), "clearing chat");
        self.widgets.log.clear();
    }

    /// Wait for the next request completion.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        self.completion_rx.recv().await
    }

    /// Render a completion into the log. Returns false if it belonged to a
    /// superseded request and was dropped.
    pub fn apply_completion(&mut self, completion: Completion) -> bool {
        let is_current = self
            .pending
            .as_ref()
            .is_some_and(|p| p.id == completion.request_id);
        if !is_current {
            tracing::debug!(
                request_id = completion.request_id,
                "dropping completion for superseded request"
            );
            return false;
        }
        self.pending = None;
        self.hide_loading_indicator();

        match completion.outcome {
            Ok(reply) => {
                tracing::info!(request_id = completion.request_id, "reply received");
                self.display_message(ChatRole::Assistant, &reply);
            }
            Err(err) => {
                tracing::warn!(request_id = completion.request_id, error = %err, "request failed");
                let text = match err {
                    ChatError::Malformed(_) => MALFORMED_RESPONSE_TEXT,
                    ChatError::Network(_) => NETWORK_ERROR_TEXT,
                    _ => SERVER_ERROR_TEXT,
                };
                self.display_message(ChatRole::Assistant, text);
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::LogEntry;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Transport that records calls and replays canned outcomes.
    struct MockTransport {
        calls: Mutex<Vec<(Endpoint, String)>>,
        reply: fn() -> Result<String, ChatError>,
    }

    impl MockTransport {
        fn new(reply: fn() -> Result<String, ChatError>) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                reply,
            })
        }

        fn calls(&self) -> Vec<(Endpoint, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatTransport for MockTransport {
        async fn send(&self, endpoint: Endpoint, message: &str) -> Result<String, ChatError> {
            self.calls
                .lock()
                .unwrap()
                .push((endpoint, message.to_string()));
            (self.reply)()
        }
    }

    fn controller(transport: Arc<MockTransport>) -> ChatController {
        ChatController::new(ChatWidgets::default(), transport)
    }

    fn assistant_texts(controller: &ChatController) -> Vec<String> {
        controller
            .log()
            .messages()
            .filter(|m| m.role == ChatRole::Assistant)
            .map(|m| m.content.clone())
            .collect()
    }

    async fn settle(controller: &mut ChatController) {
        let completion = controller.next_completion().await.unwrap();
        controller.apply_completion(completion);
    }

    #[tokio::test]
    async fn test_send_appends_user_entry_before_network() {
        let transport = MockTransport::new(|| Ok("hello".to_string()));
        let mut controller = controller(transport.clone());
        controller.input_mut().set_value("  what is rust?  ");

        assert!(controller.send_message().is_some());

        // The request task has not run yet on this single-threaded runtime.
        assert!(transport.calls().is_empty());
        assert_eq!(controller.input().value(), "");
        let entries = controller.log().entries();
        assert_eq!(entries.len(), 2);
        match &entries[0] {
            LogEntry::Message(msg) => {
                assert_eq!(msg.role, ChatRole::User);
                assert_eq!(msg.content, "what is rust?");
            }
            other => panic!("expected user message, got {:?}", other),
        }
        assert_eq!(entries[1], LogEntry::Loading);
    }

    #[tokio::test]
    async fn test_empty_input_sends_nothing() {
        let transport = MockTransport::new(|| Ok("unused".to_string()));
        let mut controller = controller(transport.clone());
        controller.input_mut().set_value("   \t ");

        assert!(controller.send_message().is_none());
        tokio::task::yield_now().await;

        assert!(transport.calls().is_empty());
        assert_eq!(assistant_texts(&controller), vec![INVALID_INPUT_TEXT]);
        assert_eq!(controller.log().len(), 1);
        assert!(controller.pending_request().is_none());
    }

    #[test]
    fn test_validate_input() {
        assert_eq!(validate_input("  hi there \n").unwrap(), "hi there");
        assert!(matches!(validate_input(""), Err(ChatError::EmptyInput)));
        assert!(matches!(validate_input(" \t\n "), Err(ChatError::EmptyInput)));
    }

    #[tokio::test]
    async fn test_success_appends_reply_and_hides_indicator() {
        let transport = MockTransport::new(|| Ok("hello".to_string()));
        let mut controller = controller(transport.clone());
        controller.input_mut().set_value("hi");
        controller.send_message();

        settle(&mut controller).await;

        assert_eq!(assistant_texts(&controller), vec!["hello"]);
        assert!(!controller.log().is_loading());
        assert!(controller.pending_request().is_none());
        assert_eq!(transport.calls(), vec![(Endpoint::Answer, "hi".to_string())]);
    }

    #[tokio::test]
    async fn test_server_error_shows_generic_text() {
        let transport = MockTransport::new(|| Err(ChatError::Server { status: 500 }));
        let mut controller = controller(transport);
        controller.input_mut().set_value("hi");
        controller.send_message();

        settle(&mut controller).await;

        assert_eq!(assistant_texts(&controller), vec![SERVER_ERROR_TEXT]);
        assert!(!controller.log().is_loading());
    }

    #[tokio::test]
    async fn test_network_error_shows_network_text() {
        let transport =
            MockTransport::new(|| Err(ChatError::Network("connection refused".to_string())));
        let mut controller = controller(transport);
        controller.input_mut().set_value("hi");
        controller.send_message();

        settle(&mut controller).await;

        assert_eq!(assistant_texts(&controller), vec![NETWORK_ERROR_TEXT]);
        assert!(!controller.log().is_loading());
    }

    #[tokio::test]
    async fn test_malformed_reply_is_reported() {
        let transport =
            MockTransport::new(|| Err(ChatError::Malformed("missing field `message`".to_string())));
        let mut controller = controller(transport);
        controller.input_mut().set_value("hi");
        controller.send_message();

        settle(&mut controller).await;

        assert_eq!(assistant_texts(&controller), vec![MALFORMED_RESPONSE_TEXT]);
    }

    #[tokio::test]
    async fn test_selector_drives_endpoint() {
        let transport = MockTransport::new(|| Ok("ok".to_string()));
        let mut controller = controller(transport.clone());

        controller.selector_mut().select_next(); // answer -> search
        controller.input_mut().set_value("find docs");
        controller.send_message();
        settle(&mut controller).await;

        *controller.selector_mut() =
            EndpointSelector::with_options(vec!["bogus".to_string()], 0);
        controller.input_mut().set_value("fallback");
        controller.send_message();
        settle(&mut controller).await;

        assert_eq!(
            transport.calls(),
            vec![
                (Endpoint::Search, "find docs".to_string()),
                (Endpoint::Answer, "fallback".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_clear_then_send_starts_empty() {
        let transport = MockTransport::new(|| Ok("reply".to_string()));
        let mut controller = controller(transport);
        controller.input_mut().set_value("first");
        controller.send_message();
        settle(&mut controller).await;
        assert_eq!(controller.log().len(), 2);

        controller.clear_chat();
        assert!(controller.log().is_empty());

        controller.input_mut().set_value("second");
        controller.send_message();
        let first = &controller.log().entries()[0];
        assert!(matches!(first, LogEntry::Message(m) if m.content == "second"));
    }

    #[tokio::test]
    async fn test_superseded_completion_is_dropped() {
        let transport = MockTransport::new(|| Ok("reply".to_string()));
        let mut controller = controller(transport);

        controller.input_mut().set_value("one");
        let first = controller.send_message().unwrap();
        controller.input_mut().set_value("two");
        let second = controller.send_message().unwrap();
        assert_ne!(first, second);

        // Only one indicator, and it sits after the newest message.
        let entries = controller.log().entries();
        assert_eq!(entries.iter().filter(|e| **e == LogEntry::Loading).count(), 1);
        assert_eq!(entries.last(), Some(&LogEntry::Loading));

        let stale = Completion {
            request_id: first,
            outcome: Ok("late".to_string()),
        };
        assert!(!controller.apply_completion(stale));
        assert!(controller.log().is_loading());

        settle(&mut controller).await;
        assert_eq!(assistant_texts(&controller), vec!["reply"]);
        assert!(controller.pending_request().is_none());
    }

    #[tokio::test]
    async fn test_reply_text_is_neutralized() {
        let transport = MockTransport::new(|| Ok("\u{1b}[2Jgone".to_string()));
        let mut controller = controller(transport);
        controller.input_mut().set_value("hi");
        controller.send_message();

        settle(&mut controller).await;

        assert_eq!(assistant_texts(&controller), vec!["[2Jgone"]);
    }
}
