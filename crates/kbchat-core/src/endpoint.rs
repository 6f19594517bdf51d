use serde::{Deserialize, Serialize};

/// Server routes a message can be posted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    Search,
    KbAnswer,
    #[default]
    Answer,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Search => "search",
            Endpoint::KbAnswer => "kbanswer",
            Endpoint::Answer => "answer",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "search" => Some(Endpoint::Search),
            "kbanswer" => Some(Endpoint::KbAnswer),
            "answer" => Some(Endpoint::Answer),
            _ => None,
        }
    }

    /// Map a selector value to an endpoint. Anything unrecognized, including
    /// the empty string, falls back to `answer`.
    pub fn from_selection(value: &str) -> Self {
        Self::from_str(value).unwrap_or_default()
    }

    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Search => "/search",
            Endpoint::KbAnswer => "/kbanswer",
            Endpoint::Answer => "/answer",
        }
    }

    pub fn all() -> Vec<Endpoint> {
        vec![Endpoint::Search, Endpoint::KbAnswer, Endpoint::Answer]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Endpoint::Search => "Search",
            Endpoint::KbAnswer => "KB Answer",
            Endpoint::Answer => "Chatbot",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Endpoint::Search => "List the knowledge-base sources matching the question",
            Endpoint::KbAnswer => "Answer from the knowledge base",
            Endpoint::Answer => "Answer as a general-purpose chatbot",
        }
    }
}
