//! Optional parameters shared by the send/edit family of methods.

use serde::{Deserialize, Serialize};

use crate::{
    domain::{ChatTarget, MessageId},
    keyboard::InlineKeyboardMarkup,
    params::Params,
    Result,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseMode {
    MarkdownV2,
    Html,
    Markdown,
}

impl ParseMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ParseMode::MarkdownV2 => "MarkdownV2",
            ParseMode::Html => "HTML",
            ParseMode::Markdown => "Markdown",
        }
    }
}

/// Named message effects and the platform ids they map to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageEffect {
    Fire,
    Like,
    Dislike,
    Heart,
    Surprise,
    Poop,
}

impl MessageEffect {
    pub fn id(self) -> &'static str {
        match self {
            MessageEffect::Fire => "5104841245755180586",
            MessageEffect::Like => "5107584321108051014",
            MessageEffect::Dislike => "5104858069142078462",
            MessageEffect::Heart => "5044134455711629726",
            MessageEffect::Surprise => "5046509860389126442",
            MessageEffect::Poop => "5046589136895476101",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyParameters {
    pub message_id: MessageId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<ChatTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
}

impl ReplyParameters {
    pub fn to(message_id: MessageId) -> Self {
        Self {
            message_id,
            chat_id: None,
            quote: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SendOptions {
    pub parse_mode: Option<ParseMode>,
    pub reply_markup: Option<InlineKeyboardMarkup>,
    pub reply_parameters: Option<ReplyParameters>,
    pub message_effect: Option<MessageEffect>,
    pub disable_notification: Option<bool>,
}

impl SendOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse_mode(mut self, mode: ParseMode) -> Self {
        self.parse_mode = Some(mode);
        self
    }

    pub fn reply_markup(mut self, markup: InlineKeyboardMarkup) -> Self {
        self.reply_markup = Some(markup);
        self
    }

    pub fn reply_to(mut self, message_id: MessageId) -> Self {
        self.reply_parameters = Some(ReplyParameters::to(message_id));
        self
    }

    pub fn effect(mut self, effect: MessageEffect) -> Self {
        self.message_effect = Some(effect);
        self
    }

    pub fn silent(mut self) -> Self {
        self.disable_notification = Some(true);
        self
    }

    /// Append the set options to `params`.
    pub fn apply(&self, params: Params) -> Result<Params> {
        let params = params
            .opt_text("parse_mode", self.parse_mode.map(ParseMode::as_str))
            .opt_json("reply_markup", self.reply_markup.as_ref())?
            .opt_json("reply_parameters", self.reply_parameters.as_ref())?
            .opt_text("message_effect_id", self.message_effect.map(MessageEffect::id))
            .opt_text("disable_notification", self.disable_notification);
        Ok(params)
    }
}
