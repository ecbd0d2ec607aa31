// Outbound event channel to the transport layer
//
// The transport collaborator implements `EventSink` and owns delivery to
// the remote listener; the acquisition core only guarantees per-session
// emission order. Emission is infallible from the session's point of view:
// a sink that cannot deliver drops the event on its own terms.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::types::SessionEvent;

/// Capability to deliver session events to a remote listener.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: SessionEvent);
}

/// Bounded channels make usable sinks out of the box, for transports that
/// bridge events onto their own delivery task and for tests.
#[async_trait]
impl EventSink for mpsc::Sender<SessionEvent> {
    async fn emit(&self, event: SessionEvent) {
        self.send(event).await.ok();
    }
}

#[async_trait]
impl EventSink for mpsc::UnboundedSender<SessionEvent> {
    async fn emit(&self, event: SessionEvent) {
        self.send(event).ok();
    }
}
