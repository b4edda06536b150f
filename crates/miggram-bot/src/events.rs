use async_trait::async_trait;

use miggram_core::types::User;

use crate::decorate::{CallbackEvent, CheckoutEvent, CommandEvent, NormalizedEvent, UpdateEvent};

/// Subscriber for everything the runtime emits. Every hook defaults to a
/// no-op, so implementors only override what they handle.
///
/// Hooks run inline on the polling task; a slow hook delays the next fetch.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Fires once per [`Client`](crate::Client), when the identity probe first
    /// stores the bot's identity. Later runtimes on the same client skip it.
    async fn ready(&self, _me: &User) {}

    async fn update(&self, _event: UpdateEvent) {}

    async fn command(&self, _event: CommandEvent) {}

    async fn callback(&self, _event: CallbackEvent) {}

    async fn checkout(&self, _event: CheckoutEvent) {}
}

/// Route one event to its hook.
pub async fn dispatch(handler: &dyn EventHandler, event: NormalizedEvent) {
    match event {
        NormalizedEvent::Update(e) => handler.update(e).await,
        NormalizedEvent::Command(e) => handler.command(e).await,
        NormalizedEvent::Callback(e) => handler.callback(e).await,
        NormalizedEvent::Checkout(e) => handler.checkout(e).await,
    }
}
