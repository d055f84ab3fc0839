//! Event channel contract and handler dispatch.
//!
//! The push channel delivers four kinds of signal. Handlers are fixed at
//! channel open time; writing output is the only side effect that happens
//! outside the completion slot.

use async_trait::async_trait;
use tracing::{debug, error, warn};

use crate::agent::completion::CompletionSlot;
use crate::agent::types::{CompletionSignal, OutputEvent, Signal};
use crate::agent::AgentError;
use crate::output::OutputSink;

/// The typed handlers an event channel feeds.
#[derive(Clone)]
pub struct EventHandlers {
    sink: OutputSink,
    completion: CompletionSlot,
}

impl EventHandlers {
    pub fn new(sink: OutputSink, completion: CompletionSlot) -> Self {
        Self { sink, completion }
    }

    /// Route one signal to its handler.
    pub fn dispatch(&self, signal: Signal) {
        match signal {
            Signal::Error(message) => self.on_error(&message),
            Signal::Disconnection(error) => self.on_disconnection(error),
            Signal::Output(event) => self.on_output(&event),
            Signal::Exit { code, error } => self.on_exit(code, error),
        }
    }

    fn on_error(&self, message: &str) {
        error!("Event channel error: {}", message);
    }

    fn on_disconnection(&self, error: String) {
        debug!(%error, "Event channel disconnected");
        self.completion
            .complete(CompletionSignal::ChannelClosed { error });
    }

    fn on_output(&self, event: &OutputEvent) {
        if let Err(e) = self.sink.write_event(event) {
            warn!(error = %e, "Failed to write remote output");
        }
    }

    fn on_exit(&self, code: i32, error: Option<String>) {
        debug!(code, ?error, "Remote command exited");
        self.completion
            .complete(CompletionSignal::Exited { code, error });
    }

    /// Whether a terminal signal was already accepted.
    pub fn is_completed(&self) -> bool {
        self.completion.is_completed()
    }
}

/// Asynchronous push channel from the agent.
#[async_trait]
pub trait EventChannel: Send {
    /// Connect and start delivering signals to `handlers`.
    ///
    /// `session_id` is the identifier obtained by the control channel; it
    /// authenticates this connection as the same client.
    async fn open(
        &mut self,
        session_id: Option<&str>,
        handlers: EventHandlers,
    ) -> Result<(), AgentError>;

    /// Stop delivering signals and release the connection.
    async fn close(&mut self) {}
}
