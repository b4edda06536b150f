//! Bot-facing layer: the method surface over a [`Transport`], decorated event
//! values and the polling runtime.
//!
//! [`Transport`]: miggram_core::transport::Transport

pub mod client;
pub mod decorate;
pub mod events;
pub mod poller;

#[cfg(test)]
mod testing;

pub use client::{Client, Invoice, NewStickerSet};
pub use decorate::{
    CallbackEvent, CheckoutEvent, CommandEvent, DecoratedChat, DecoratedMessage, DecoratedUser,
    NormalizedEvent, UpdateEvent,
};
pub use events::EventHandler;
pub use poller::{BotHandle, PollSettings, Poller, Runtime, TickOutcome};
