//! Forwards runtime events into the reconciler's bounded queue.

use futures_util::stream::StreamExt;
use log::{debug, error, info};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::runtime::ContainerRuntime;
use crate::types::RuntimeEvent;

pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

/// Subscribes to the runtime's events and starts forwarding them.
///
/// When the queue is full the event is dropped: a trigger is already
/// pending and the pass it starts will see the same runtime state.
/// The task ends with an error when the event stream fails or ends, which
/// also closes the queue.
pub fn spawn(
    runtime: &dyn ContainerRuntime,
    capacity: usize,
) -> (mpsc::Receiver<RuntimeEvent>, JoinHandle<Result<()>>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let mut stream = runtime.events();

    let handle = tokio::spawn(async move {
        info!("Listening for container events...");
        while let Some(msg) = stream.next().await {
            let event = match msg {
                Ok(event) => event,
                Err(e) => {
                    error!("Error in container event stream: {}", e);
                    return Err(e);
                }
            };
            debug!("Runtime event: {}", event);

            match tx.try_send(event) {
                Ok(()) => {}
                Err(TrySendError::Full(event)) => {
                    debug!("Trigger queue full, coalescing event: {}", event);
                }
                Err(TrySendError::Closed(_)) => {
                    info!("Trigger queue closed, stopping event watcher");
                    return Ok(());
                }
            }
        }
        error!("Container event stream ended");
        Err(Error::EventStreamEnded)
    });

    (rx, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Container;
    use async_trait::async_trait;
    use futures_util::stream::{self, BoxStream};
    use std::sync::Mutex;

    struct ScriptedRuntime {
        events: Mutex<Vec<Result<RuntimeEvent>>>,
    }

    impl ScriptedRuntime {
        fn new(events: Vec<Result<RuntimeEvent>>) -> Self {
            Self {
                events: Mutex::new(events),
            }
        }
    }

    #[async_trait]
    impl ContainerRuntime for ScriptedRuntime {
        async fn list_running(&self) -> Result<Vec<Container>> {
            Ok(Vec::new())
        }

        fn events(&self) -> BoxStream<'static, Result<RuntimeEvent>> {
            let events = std::mem::take(&mut *self.events.lock().unwrap());
            stream::iter(events).boxed()
        }
    }

    fn event(action: &str) -> Result<RuntimeEvent> {
        Ok(RuntimeEvent {
            kind: "container".into(),
            action: action.into(),
            actor: "web".into(),
        })
    }

    #[tokio::test]
    async fn test_forwards_events_then_reports_end() {
        let runtime = ScriptedRuntime::new(vec![event("start"), event("die")]);
        let (mut rx, handle) = spawn(&runtime, 10);

        assert_eq!(rx.recv().await.unwrap().action, "start");
        assert_eq!(rx.recv().await.unwrap().action, "die");
        assert!(rx.recv().await.is_none());
        assert!(matches!(
            handle.await.unwrap(),
            Err(Error::EventStreamEnded)
        ));
    }

    #[tokio::test]
    async fn test_coalesces_when_queue_full() {
        let runtime = ScriptedRuntime::new(vec![event("start"), event("stop"), event("die")]);
        let (mut rx, handle) = spawn(&runtime, 1);

        // The stream is drained before we read, so only the first event fits.
        assert!(handle.await.unwrap().is_err());
        assert_eq!(rx.recv().await.unwrap().action, "start");
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_stream_error_is_reported() {
        let runtime = ScriptedRuntime::new(vec![
            event("start"),
            Err(Error::EventStream("connection reset".into())),
            event("never delivered"),
        ]);
        let (mut rx, handle) = spawn(&runtime, 10);

        assert_eq!(rx.recv().await.unwrap().action, "start");
        assert!(rx.recv().await.is_none());
        assert!(matches!(handle.await.unwrap(), Err(Error::EventStream(_))));
    }

    #[tokio::test]
    async fn test_stops_when_receiver_dropped() {
        let runtime = ScriptedRuntime::new(vec![event("start"), event("stop")]);
        let (rx, handle) = spawn(&runtime, 10);
        drop(rx);

        assert!(handle.await.unwrap().is_ok());
    }
}
