use connect_core::{MessageEvent, RedirectEvent, ServerEvent};

pub const TOPIC_MESSAGE: &str = "message";
pub const TOPIC_REDIRECT: &str = "redirect";
pub const TOPIC_SERVER: &str = "server";

/// Event pushed by the authority without a matching request
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Message(MessageEvent),
    Redirect(RedirectEvent),
    Server(ServerEvent),
}

impl Event {
    /// Dispatcher topic this event is published under
    pub fn topic(&self) -> &'static str {
        match self {
            Event::Message(_) => TOPIC_MESSAGE,
            Event::Redirect(_) => TOPIC_REDIRECT,
            Event::Server(_) => TOPIC_SERVER,
        }
    }
}
