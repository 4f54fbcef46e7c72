use crate::client::PurchasesClient;
use std::sync::Arc;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::debug;

/// Application lifecycle notifications relevant to purchases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppLifecycleEvent {
    WillEnterForeground,
    DidEnterBackground,
}

/// Run one receipt verification per foreground re-entry.
///
/// Only a weak reference to the client is kept: the task ends once the
/// client is dropped or every lifecycle sender is closed.
pub fn observe_foreground<C>(
    client: &Arc<C>,
    mut events: mpsc::UnboundedReceiver<AppLifecycleEvent>,
) -> JoinHandle<()>
where
    C: PurchasesClient + 'static,
{
    let client = Arc::downgrade(client);

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if event != AppLifecycleEvent::WillEnterForeground {
                continue;
            }

            let Some(client) = client.upgrade() else {
                debug!("Purchases client released, stopping foreground observer");
                break;
            };

            client.will_enter_foreground().await;
        }
    })
}
