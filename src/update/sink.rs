use tokio::sync::mpsc;
use tracing::debug;

use crate::{
    error::{VdaDidError, VdaDidResult},
    update::planner::DocumentUpdate,
};

/// Receiver of planned registry changes, typically whatever signs and submits
/// the registry transactions.
pub trait UpdateSink {
    fn submit(&self, update: DocumentUpdate) -> impl Future<Output = VdaDidResult<()>> + Send;
}

impl UpdateSink for mpsc::Sender<DocumentUpdate> {
    fn submit(&self, update: DocumentUpdate) -> impl Future<Output = VdaDidResult<()>> + Send {
        async move {
            debug!(
                "handing off {} additions and {} revocations",
                update.add.delegates.len() + update.add.attributes.len(),
                update.revoke.delegates.len() + update.revoke.attributes.len()
            );
            self.send(update)
                .await
                .map_err(|_| VdaDidError::HandoffClosed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::update::planner::{AttributeUpdate, UpdateList};

    fn update() -> DocumentUpdate {
        DocumentUpdate {
            add: UpdateList {
                delegates: vec![],
                attributes: vec![AttributeUpdate {
                    name: "did/svc/VeridaMessage".into(),
                    value: "https://x?context=abc&type=messaging".into(),
                    proof: None,
                }],
            },
            revoke: UpdateList::default(),
        }
    }

    #[tokio::test]
    async fn submit_hands_update_to_receiver() {
        let (tx, mut rx) = mpsc::channel::<DocumentUpdate>(1);
        tx.submit(update()).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), update());
    }

    #[tokio::test]
    async fn submit_to_closed_channel_fails() {
        let (tx, rx) = mpsc::channel::<DocumentUpdate>(1);
        drop(rx);
        let e = tx.submit(update()).await.unwrap_err();
        assert!(matches!(e, VdaDidError::HandoffClosed));
    }
}
