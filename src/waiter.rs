use std::{future::Future, sync::Arc};

use teloxide::types::{ChatId, MessageId};
use tokio::runtime::Handle;
use tracing::warn;

use crate::messenger::Messenger;

pub const PLACEHOLDER: &str = "Please wait...";

/// A sent placeholder. Dropping it without `remove` deletes it in the background.
struct Placeholder {
    messenger: Arc<dyn Messenger>,
    chat: ChatId,
    id: Option<MessageId>,
}

impl Placeholder {
    async fn remove(mut self) {
        if let Some(id) = self.id.take() {
            delete(self.messenger.as_ref(), self.chat, id).await;
        }
    }
}

impl Drop for Placeholder {
    fn drop(&mut self) {
        let Some(id) = self.id.take() else { return };
        let Ok(handle) = Handle::try_current() else {
            warn!("placeholder in {} left behind, no runtime", self.chat);
            return;
        };
        let messenger = Arc::clone(&self.messenger);
        let chat = self.chat;
        handle.spawn(async move { delete(messenger.as_ref(), chat, id).await });
    }
}

async fn delete(messenger: &dyn Messenger, chat: ChatId, id: MessageId) {
    if let Err(e) = messenger.delete_message(chat, id).await {
        warn!("could not remove placeholder in {chat}: {e}");
    }
}

/// Shows a "Please wait..." message in `chat` while `op` runs.
///
/// The placeholder is removed whether `op` succeeds, fails or is dropped
/// half way. If the placeholder itself cannot be sent, `op` still runs.
pub async fn with_placeholder<F, T>(messenger: Arc<dyn Messenger>, chat: ChatId, op: F) -> T
where
    F: Future<Output = T>,
{
    let id = match messenger.send_text(chat, PLACEHOLDER).await {
        Ok(id) => Some(id),
        Err(e) => {
            warn!("could not show placeholder in {chat}: {e}");
            None
        }
    };
    let placeholder = Placeholder { messenger, chat, id };

    let result = op.await;

    placeholder.remove().await;
    result
}
