//! Turns an admitted update into one of the known event shapes.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    cursor::RawUpdate,
    errors::Error,
    types::{CallbackQuery, Message, PreCheckoutQuery},
    Result,
};

/// Separator between the verb and the arguments of a callback payload.
pub const CALLBACK_ARG_SEPARATOR: char = '_';

/// A command line split into verb and arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandLine {
    pub verb: String,
    pub args: Vec<String>,
}

/// Split command text on whitespace; the first token minus its leading marker
/// character is the verb.
pub fn parse_command(text: &str) -> Option<CommandLine> {
    let mut tokens = text.split_whitespace();
    let first = tokens.next()?;
    let mut chars = first.chars();
    chars.next();
    Some(CommandLine {
        verb: chars.as_str().to_string(),
        args: tokens.map(str::to_string).collect(),
    })
}

/// `"a_b_c"` → `["b", "c"]`; a payload with no separator has no arguments.
pub fn callback_args(data: &str) -> Vec<String> {
    if !data.contains(CALLBACK_ARG_SEPARATOR) {
        return Vec::new();
    }
    data.split(CALLBACK_ARG_SEPARATOR)
        .skip(1)
        .map(str::to_string)
        .collect()
}

#[derive(Clone, Debug, PartialEq)]
pub enum Classified {
    Message { message: Message, edited: bool },
    Command { message: Message, command: CommandLine },
    Callback { query: CallbackQuery, args: Vec<String> },
    Checkout(PreCheckoutQuery),
}

impl Classified {
    pub fn kind(&self) -> EventKind {
        match self {
            Classified::Message { .. } => EventKind::Update,
            Classified::Command { .. } => EventKind::Command,
            Classified::Callback { .. } => EventKind::Callback,
            Classified::Checkout(_) => EventKind::Checkout,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Update,
    Command,
    Callback,
    Checkout,
}

/// Classify in fixed order: callback, pre-checkout, message, edited message.
///
/// `Ok(None)` means the update has none of the known shapes and should be
/// skipped. A known shape whose payload lacks required fields is an
/// [`Error::Decoration`].
pub fn classify(update: RawUpdate) -> Result<Option<Classified>> {
    let RawUpdate { update_id, body } = update;
    let Value::Object(mut fields) = body else {
        return Ok(None);
    };

    if let Some(raw) = fields.remove("callback_query") {
        let query: CallbackQuery = payload(update_id, "callback_query", raw)?;
        let args = query.data.as_deref().map(callback_args).unwrap_or_default();
        return Ok(Some(Classified::Callback { query, args }));
    }

    if let Some(raw) = fields.remove("pre_checkout_query") {
        let query = payload(update_id, "pre_checkout_query", raw)?;
        return Ok(Some(Classified::Checkout(query)));
    }

    if let Some(raw) = fields.remove("message") {
        let message: Message = payload(update_id, "message", raw)?;
        if message.has_command_entity() {
            if let Some(command) = message.text.as_deref().and_then(parse_command) {
                return Ok(Some(Classified::Command { message, command }));
            }
        }
        return Ok(Some(Classified::Message {
            message,
            edited: false,
        }));
    }

    if let Some(raw) = fields.remove("edited_message") {
        let message = payload(update_id, "edited_message", raw)?;
        return Ok(Some(Classified::Message {
            message,
            edited: true,
        }));
    }

    Ok(None)
}

fn payload<T: DeserializeOwned>(update_id: i64, field: &str, raw: Value) -> Result<T> {
    serde_json::from_value(raw)
        .map_err(|e| Error::Decoration(format!("update {update_id}: {field}: {e}")))
}
