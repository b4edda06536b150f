//! Decorated records: raw platform values paired with the client they arrived
//! through, so handlers can answer in place.
//!
//! Decoration itself never touches the network. Each action reads the
//! addressing it needs (chat id, message id, query id) from the record it is
//! called on.

use miggram_core::{
    classify::{Classified, EventKind},
    domain::{ChatId, MessageRef, UserId},
    options::SendOptions,
    types::{CallbackQuery, Chat, Message, PreCheckoutQuery, User},
    Result,
};

use crate::client::Client;

#[derive(Clone, Debug)]
pub struct DecoratedUser {
    client: Client,
    pub user: User,
}

impl DecoratedUser {
    pub fn new(client: Client, user: User) -> Self {
        Self { client, user }
    }

    pub fn id(&self) -> UserId {
        self.user.id
    }

    /// Send to the user's private chat and decorate the sent message.
    pub async fn reply(&self, text: &str, opts: &SendOptions) -> Result<DecoratedMessage> {
        let sent = self.write(text, opts).await?;
        Ok(DecoratedMessage::new(self.client.clone(), sent))
    }

    pub async fn write(&self, text: &str, opts: &SendOptions) -> Result<Message> {
        self.client.send_message(self.user.id, text, opts).await
    }
}

#[derive(Clone, Debug)]
pub struct DecoratedChat {
    client: Client,
    pub chat: Chat,
}

impl DecoratedChat {
    pub fn new(client: Client, chat: Chat) -> Self {
        Self { client, chat }
    }

    pub fn id(&self) -> ChatId {
        self.chat.id
    }

    pub async fn reply(&self, text: &str, opts: &SendOptions) -> Result<DecoratedMessage> {
        let sent = self.write(text, opts).await?;
        Ok(DecoratedMessage::new(self.client.clone(), sent))
    }

    pub async fn write(&self, text: &str, opts: &SendOptions) -> Result<Message> {
        self.client.send_message(self.chat.id, text, opts).await
    }
}

#[derive(Clone, Debug)]
pub struct DecoratedMessage {
    client: Client,
    pub message: Message,
    pub from: Option<DecoratedUser>,
    pub chat: DecoratedChat,
}

impl DecoratedMessage {
    pub fn new(client: Client, message: Message) -> Self {
        let from = message
            .from
            .clone()
            .map(|u| DecoratedUser::new(client.clone(), u));
        let chat = DecoratedChat::new(client.clone(), message.chat.clone());
        Self {
            client,
            message,
            from,
            chat,
        }
    }

    pub fn message_ref(&self) -> MessageRef {
        self.message.message_ref()
    }

    pub fn text(&self) -> Option<&str> {
        self.message.text.as_deref()
    }

    /// Answer in the same chat, quoting this message unless `opts` already
    /// carries reply parameters. Returns the decorated reply.
    pub async fn reply(&self, text: &str, opts: &SendOptions) -> Result<DecoratedMessage> {
        let opts = if opts.reply_parameters.is_some() {
            opts.clone()
        } else {
            opts.clone().reply_to(self.message.message_id)
        };
        let sent = self.write(text, &opts).await?;
        Ok(DecoratedMessage::new(self.client.clone(), sent))
    }

    /// Send to the same chat without quoting; the raw result is returned.
    pub async fn write(&self, text: &str, opts: &SendOptions) -> Result<Message> {
        self.client
            .send_message(self.message.chat.id, text, opts)
            .await
    }

    /// Replace the text of this message.
    ///
    /// Fire-and-forget: a failed edit is logged at warn level and otherwise
    /// ignored. Use [`DecoratedMessage::try_edit`] to observe the outcome.
    pub async fn edit(&self, text: &str, opts: &SendOptions) {
        if let Err(e) = self.try_edit(text, opts).await {
            let r = self.message_ref();
            tracing::warn!(
                chat_id = r.chat_id.0,
                message_id = r.message_id.0,
                error = %e,
                "edit failed"
            );
        }
    }

    pub async fn try_edit(&self, text: &str, opts: &SendOptions) -> Result<Message> {
        let r = self.message_ref();
        self.client
            .edit_message_text(r.chat_id, r.message_id, text, opts)
            .await
    }

    /// `true` if the platform confirmed the deletion.
    pub async fn delete(&self) -> bool {
        let r = self.message_ref();
        match self.client.delete_message(r.chat_id, r.message_id).await {
            Ok(done) => done,
            Err(e) => {
                tracing::debug!(
                    chat_id = r.chat_id.0,
                    message_id = r.message_id.0,
                    error = %e,
                    "delete failed"
                );
                false
            }
        }
    }
}

/// A plain or edited message.
#[derive(Clone, Debug)]
pub struct UpdateEvent {
    pub message: DecoratedMessage,
    pub edited: bool,
}

#[derive(Clone, Debug)]
pub struct CommandEvent {
    pub message: DecoratedMessage,
    pub verb: String,
    pub args: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct CallbackEvent {
    client: Client,
    pub query: CallbackQuery,
    pub from: DecoratedUser,
    /// The message carrying the pressed button, when the platform sent it.
    pub message: Option<DecoratedMessage>,
    pub args: Vec<String>,
}

impl CallbackEvent {
    pub fn data(&self) -> Option<&str> {
        self.query.data.as_deref()
    }

    /// Acknowledge the button press, optionally with a toast.
    pub async fn answer(&self, text: Option<&str>) -> Result<bool> {
        self.client.answer_callback_query(&self.query.id, text).await
    }
}

#[derive(Clone, Debug)]
pub struct CheckoutEvent {
    client: Client,
    pub query: PreCheckoutQuery,
    pub from: DecoratedUser,
}

impl CheckoutEvent {
    pub async fn accept(&self) -> Result<bool> {
        self.client
            .answer_pre_checkout_query(&self.query.id, None)
            .await
    }

    pub async fn reject(&self, reason: &str) -> Result<bool> {
        self.client
            .answer_pre_checkout_query(&self.query.id, Some(reason))
            .await
    }
}

#[derive(Clone, Debug)]
pub enum NormalizedEvent {
    Update(UpdateEvent),
    Command(CommandEvent),
    Callback(CallbackEvent),
    Checkout(CheckoutEvent),
}

impl NormalizedEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            NormalizedEvent::Update(_) => EventKind::Update,
            NormalizedEvent::Command(_) => EventKind::Command,
            NormalizedEvent::Callback(_) => EventKind::Callback,
            NormalizedEvent::Checkout(_) => EventKind::Checkout,
        }
    }
}

pub fn decorate(client: &Client, classified: Classified) -> NormalizedEvent {
    match classified {
        Classified::Message { message, edited } => NormalizedEvent::Update(UpdateEvent {
            message: DecoratedMessage::new(client.clone(), message),
            edited,
        }),
        Classified::Command { message, command } => NormalizedEvent::Command(CommandEvent {
            message: DecoratedMessage::new(client.clone(), message),
            verb: command.verb,
            args: command.args,
        }),
        Classified::Callback { query, args } => {
            let from = DecoratedUser::new(client.clone(), query.from.clone());
            let message = query
                .message
                .clone()
                .map(|m| DecoratedMessage::new(client.clone(), m));
            NormalizedEvent::Callback(CallbackEvent {
                client: client.clone(),
                query,
                from,
                message,
                args,
            })
        }
        Classified::Checkout(query) => NormalizedEvent::Checkout(CheckoutEvent {
            client: client.clone(),
            from: DecoratedUser::new(client.clone(), query.from.clone()),
            query,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeTransport;
    use miggram_core::{
        classify::classify, cursor::RawUpdate, errors::Error, params::ParamValue,
    };
    use serde_json::{json, Value};

    fn group_message(message_id: i64, text: &str) -> Value {
        json!({
            "message_id": message_id,
            "from": { "id": 7, "first_name": "Ann" },
            "chat": { "id": -100, "type": "supergroup", "title": "Crew" },
            "date": 1_700_000_000,
            "text": text
        })
    }

    fn decorated(fake: &std::sync::Arc<FakeTransport>, body: Value) -> NormalizedEvent {
        let client = Client::new(fake.clone());
        let classified = classify(RawUpdate::from_value(body).unwrap())
            .unwrap()
            .unwrap();
        decorate(&client, classified)
    }

    fn update_event(event: NormalizedEvent) -> DecoratedMessage {
        match event {
            NormalizedEvent::Update(u) => u.message,
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn decoration_makes_no_calls() {
        let fake = FakeTransport::new();
        let event = decorated(&fake, json!({ "update_id": 1, "message": group_message(3, "hi") }));
        let msg = update_event(event);
        assert_eq!(msg.chat.id(), ChatId(-100));
        assert_eq!(msg.from.as_ref().map(DecoratedUser::id), Some(UserId(7)));
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn reply_quotes_and_decorates_the_sent_message() {
        let fake = FakeTransport::new();
        fake.respond("sendMessage", Ok(group_message(4, "pong")));
        let msg = update_event(decorated(
            &fake,
            json!({ "update_id": 1, "message": group_message(3, "ping") }),
        ));

        let reply = msg.reply("pong", &SendOptions::new()).await.unwrap();
        assert_eq!(reply.message.message_id.0, 4);
        assert_eq!(reply.text(), Some("pong"));

        let sent = fake.calls_to("sendMessage");
        assert_eq!(sent[0].get("chat_id"), Some(&ParamValue::Text("-100".into())));
        assert_eq!(
            sent[0]
                .get("reply_parameters")
                .and_then(ParamValue::as_field)
                .as_deref(),
            Some(r#"{"message_id":3}"#)
        );
    }

    #[tokio::test]
    async fn write_does_not_quote() {
        let fake = FakeTransport::new();
        fake.respond("sendMessage", Ok(group_message(5, "note")));
        let msg = update_event(decorated(
            &fake,
            json!({ "update_id": 1, "message": group_message(3, "ping") }),
        ));

        let raw = msg.chat.write("note", &SendOptions::new()).await.unwrap();
        assert_eq!(raw.message_id.0, 5);
        assert!(fake.calls_to("sendMessage")[0].get("reply_parameters").is_none());
    }

    #[tokio::test]
    async fn user_write_targets_the_user_id() {
        let fake = FakeTransport::new();
        fake.respond("sendMessage", Ok(group_message(6, "dm")));
        let msg = update_event(decorated(
            &fake,
            json!({ "update_id": 1, "message": group_message(3, "ping") }),
        ));

        msg.from.as_ref().unwrap().write("dm", &SendOptions::new()).await.unwrap();
        assert_eq!(
            fake.calls_to("sendMessage")[0].get("chat_id"),
            Some(&ParamValue::Text("7".into()))
        );
    }

    #[tokio::test]
    async fn failed_edit_is_swallowed_but_visible_through_try_edit() {
        let fake = FakeTransport::new();
        fake.respond(
            "editMessageText",
            Err(Error::remote(Some(400), "Bad Request: message is not modified")),
        );
        fake.respond(
            "editMessageText",
            Err(Error::remote(Some(400), "Bad Request: message is not modified")),
        );
        let msg = update_event(decorated(
            &fake,
            json!({ "update_id": 1, "message": group_message(3, "ping") }),
        ));

        msg.edit("ping", &SendOptions::new()).await;
        let err = msg.try_edit("ping", &SendOptions::new()).await.unwrap_err();
        assert_eq!(err.remote_code(), Some(400));

        let edits = fake.calls_to("editMessageText");
        assert_eq!(edits.len(), 2);
        assert_eq!(edits[0].get("message_id"), Some(&ParamValue::Text("3".into())));
    }

    #[tokio::test]
    async fn delete_reports_remote_outcome() {
        let fake = FakeTransport::new();
        fake.respond("deleteMessage", Ok(json!(true)));
        fake.respond(
            "deleteMessage",
            Err(Error::remote(Some(400), "Bad Request: message to delete not found")),
        );
        let msg = update_event(decorated(
            &fake,
            json!({ "update_id": 1, "message": group_message(3, "bye") }),
        ));

        assert!(msg.delete().await);
        assert!(!msg.delete().await);
    }

    #[tokio::test]
    async fn callback_answer_uses_query_id() {
        let fake = FakeTransport::new();
        fake.respond("answerCallbackQuery", Ok(json!(true)));
        let event = decorated(
            &fake,
            json!({
                "update_id": 9,
                "callback_query": {
                    "id": "cb-9",
                    "from": { "id": 7, "first_name": "Ann" },
                    "message": group_message(3, "pick one"),
                    "data": "vote_yes"
                }
            }),
        );
        let NormalizedEvent::Callback(cb) = event else {
            panic!("expected a callback");
        };
        assert_eq!(cb.args, vec!["yes"]);
        assert_eq!(cb.data(), Some("vote_yes"));
        assert_eq!(cb.message.as_ref().map(|m| m.message_ref().message_id.0), Some(3));

        assert!(cb.answer(Some("counted")).await.unwrap());
        let answers = fake.calls_to("answerCallbackQuery");
        assert_eq!(
            answers[0].get("callback_query_id"),
            Some(&ParamValue::Text("cb-9".into()))
        );
    }

    #[tokio::test]
    async fn checkout_reject_carries_reason() {
        let fake = FakeTransport::new();
        fake.respond("answerPreCheckoutQuery", Ok(json!(true)));
        let event = decorated(
            &fake,
            json!({
                "update_id": 10,
                "pre_checkout_query": {
                    "id": "pc-1",
                    "from": { "id": 7, "first_name": "Ann" },
                    "currency": "XTR",
                    "total_amount": 50,
                    "invoice_payload": "sku-1"
                }
            }),
        );
        let NormalizedEvent::Checkout(co) = event else {
            panic!("expected a checkout");
        };
        assert_eq!(co.from.id(), UserId(7));
        co.reject("sold out").await.unwrap();

        let p = &fake.calls_to("answerPreCheckoutQuery")[0];
        assert_eq!(p.get("ok"), Some(&ParamValue::Text("false".into())));
        assert_eq!(p.get("error_message"), Some(&ParamValue::Text("sold out".into())));
    }
}
