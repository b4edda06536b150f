use std::sync::Arc;

use async_trait::async_trait;

use miggram_bot::{
    CallbackEvent, CheckoutEvent, Client, CommandEvent, EventHandler, PollSettings, Runtime,
    UpdateEvent,
};
use miggram_core::{
    config::Config,
    keyboard::InlineKeyboardBuilder,
    options::{MessageEffect, ParseMode, SendOptions},
    types::User,
};
use miggram_http::HttpTransport;

/// Small demo bot: echoes text, answers `/start` with a keyboard and
/// acknowledges button presses and checkouts.
struct EchoBot;

#[async_trait]
impl EventHandler for EchoBot {
    async fn ready(&self, me: &User) {
        tracing::info!(
            "miggram started: @{}",
            me.username.as_deref().unwrap_or(&me.first_name)
        );
    }

    async fn update(&self, event: UpdateEvent) {
        if event.edited {
            return;
        }
        let Some(text) = event.message.text() else {
            return;
        };
        if let Err(e) = event.message.reply(text, &SendOptions::new()).await {
            tracing::warn!(error = %e, "echo failed");
        }
    }

    async fn command(&self, event: CommandEvent) {
        let res = match event.verb.as_str() {
            "start" => {
                let keyboard = InlineKeyboardBuilder::new()
                    .button("👍", "vote_up")
                    .button("👎", "vote_down")
                    .new_row()
                    .url_button("Bot API", "https://core.telegram.org/bots/api")
                    .build();
                let opts = SendOptions::new()
                    .reply_markup(keyboard)
                    .effect(MessageEffect::Fire);
                event.message.write("How was it?", &opts).await.map(|_| ())
            }
            "args" => {
                let body = format!(
                    "<b>{}</b> argument(s): {}",
                    event.args.len(),
                    event.args.join(" ")
                );
                let opts = SendOptions::new().parse_mode(ParseMode::Html);
                event.message.reply(&body, &opts).await.map(|_| ())
            }
            other => {
                tracing::debug!(verb = other, "unhandled command");
                Ok(())
            }
        };
        if let Err(e) = res {
            tracing::warn!(verb = %event.verb, error = %e, "command reply failed");
        }
    }

    async fn callback(&self, event: CallbackEvent) {
        let toast = match event.args.first().map(String::as_str) {
            Some("up") => "Thanks!",
            Some("down") => "Noted.",
            _ => "?",
        };
        if let Err(e) = event.answer(Some(toast)).await {
            tracing::warn!(error = %e, "callback answer failed");
        }
    }

    async fn checkout(&self, event: CheckoutEvent) {
        if let Err(e) = event.accept().await {
            tracing::warn!(error = %e, "checkout answer failed");
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    miggram_core::logging::init("miggram")?;

    let cfg = Config::load()?;
    let settings = PollSettings::from(&cfg);
    let client = Client::new(Arc::new(HttpTransport::new(cfg)?));

    let handle = Runtime::start(client, Arc::new(EchoBot), settings);

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    handle.stop().await;
    Ok(())
}
