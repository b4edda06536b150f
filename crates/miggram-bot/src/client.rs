use std::{
    fmt,
    sync::{Arc, OnceLock},
};

use serde::de::DeserializeOwned;
use tokio::io::AsyncWrite;

use miggram_core::{
    domain::{ChatId, ChatTarget, MessageId, UserId},
    keyboard::InlineKeyboardMarkup,
    options::SendOptions,
    params::{InputFile, Params},
    transport::{decode, Transport},
    types::{
        ChatFullInfo, File, InputSticker, LabeledPrice, Message, StickerFormat, StickerSet,
        StickerType, User,
    },
    Result,
};

/// Name of the multipart part that carries an uploaded sticker in
/// `createNewStickerSet`; reference it as `attach://sticker0`.
pub const NEW_SET_STICKER_PART: &str = "sticker0";

/// Handle to the remote bot API.
///
/// Cheap to clone; every clone shares the transport and the resolved bot
/// identity.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    transport: Arc<dyn Transport>,
    identity: OnceLock<User>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("identity", &self.identity())
            .finish_non_exhaustive()
    }
}

/// Arguments of `createNewStickerSet`.
#[derive(Clone, Debug)]
pub struct NewStickerSet {
    pub user_id: UserId,
    pub name: String,
    pub title: String,
    pub stickers: Vec<InputSticker>,
    pub sticker_type: StickerType,
    /// Optional raw sticker upload, sent as the `sticker0` part.
    pub upload: Option<InputFile>,
}

/// Arguments of `sendInvoice`.
#[derive(Clone, Debug)]
pub struct Invoice {
    pub title: String,
    pub description: String,
    pub payload: String,
    pub currency: String,
    pub prices: Vec<LabeledPrice>,
    /// Empty for payments in platform stars.
    pub provider_token: Option<String>,
}

impl Client {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                transport,
                identity: OnceLock::new(),
            }),
        }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.inner.transport
    }

    /// The bot's own user record, once the identity probe has resolved it.
    pub fn identity(&self) -> Option<&User> {
        self.inner.identity.get()
    }

    /// Store the identity. Returns `false` if one was already stored.
    pub(crate) fn set_identity(&self, me: User) -> bool {
        self.inner.identity.set(me).is_ok()
    }

    pub async fn call_raw(&self, method: &str, params: Params) -> Result<serde_json::Value> {
        self.inner.transport.call(method, params).await
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Params) -> Result<T> {
        let value = self.call_raw(method, params).await?;
        decode(method, value)
    }

    pub async fn get_me(&self) -> Result<User> {
        self.call("getMe", Params::new()).await
    }

    /// Raw `getUpdates` result. With `offset`, the server forgets every update
    /// below it.
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<serde_json::Value> {
        self.call_raw("getUpdates", Params::new().opt_text("offset", offset))
            .await
    }

    pub async fn send_message(
        &self,
        chat: impl Into<ChatTarget>,
        text: &str,
        opts: &SendOptions,
    ) -> Result<Message> {
        let params = opts.apply(
            Params::new()
                .text("chat_id", chat.into())
                .text("text", text),
        )?;
        self.call("sendMessage", params).await
    }

    /// Photo by file id / URL (GET) or raw bytes (multipart).
    pub async fn send_photo(
        &self,
        chat: impl Into<ChatTarget>,
        photo: InputFile,
        caption: Option<&str>,
        opts: &SendOptions,
    ) -> Result<Message> {
        let params = opts.apply(
            Params::new()
                .text("chat_id", chat.into())
                .input_file("photo", photo)
                .opt_text("caption", caption),
        )?;
        self.call("sendPhoto", params).await
    }

    pub async fn send_document(
        &self,
        chat: impl Into<ChatTarget>,
        document: InputFile,
        caption: Option<&str>,
        opts: &SendOptions,
    ) -> Result<Message> {
        let params = opts.apply(
            Params::new()
                .text("chat_id", chat.into())
                .input_file("document", document)
                .opt_text("caption", caption),
        )?;
        self.call("sendDocument", params).await
    }

    pub async fn send_sticker(
        &self,
        chat: impl Into<ChatTarget>,
        sticker: &str,
    ) -> Result<Message> {
        let params = Params::new()
            .text("chat_id", chat.into())
            .text("sticker", sticker);
        self.call("sendSticker", params).await
    }

    pub async fn get_file(&self, file_id: &str) -> Result<File> {
        self.call("getFile", Params::new().text("file_id", file_id))
            .await
    }

    /// Stream a file (by its `getFile` path) into `out`.
    pub async fn download_file(
        &self,
        file_path: &str,
        out: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64> {
        self.inner.transport.download(file_path, out).await
    }

    pub async fn edit_message_text(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        opts: &SendOptions,
    ) -> Result<Message> {
        let params = opts.apply(
            Params::new()
                .text("chat_id", chat_id.0)
                .text("message_id", message_id.0)
                .text("text", text),
        )?;
        self.call("editMessageText", params).await
    }

    pub async fn edit_message_caption(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        caption: &str,
    ) -> Result<Message> {
        let params = Params::new()
            .text("chat_id", chat_id.0)
            .text("message_id", message_id.0)
            .text("caption", caption);
        self.call("editMessageCaption", params).await
    }

    pub async fn edit_message_reply_markup(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        markup: Option<&InlineKeyboardMarkup>,
    ) -> Result<Message> {
        let params = Params::new()
            .text("chat_id", chat_id.0)
            .text("message_id", message_id.0)
            .opt_json("reply_markup", markup)?;
        self.call("editMessageReplyMarkup", params).await
    }

    pub async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> Result<bool> {
        let params = Params::new()
            .text("chat_id", chat_id.0)
            .text("message_id", message_id.0);
        self.call("deleteMessage", params).await
    }

    pub async fn answer_callback_query(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<bool> {
        let params = Params::new()
            .text("callback_query_id", callback_id)
            .opt_text("text", text);
        self.call("answerCallbackQuery", params).await
    }

    pub async fn get_sticker_set(&self, name: &str) -> Result<StickerSet> {
        self.call("getStickerSet", Params::new().text("name", name))
            .await
    }

    pub async fn upload_sticker_file(
        &self,
        user_id: UserId,
        sticker: Vec<u8>,
        file_name: Option<String>,
        format: StickerFormat,
    ) -> Result<File> {
        let params = Params::new()
            .text("user_id", user_id.0)
            .file("sticker", sticker, file_name)
            .text("sticker_format", format.as_str());
        self.call("uploadStickerFile", params).await
    }

    pub async fn create_new_sticker_set(&self, set: NewStickerSet) -> Result<bool> {
        let mut params = Params::new()
            .multipart()
            .text("user_id", set.user_id.0)
            .text("name", &set.name)
            .text("title", &set.title)
            .json("stickers", &set.stickers)?
            .text("sticker_type", set.sticker_type.as_str());
        if let Some(upload) = set.upload {
            params = params.input_file(NEW_SET_STICKER_PART, upload);
        }
        self.call("createNewStickerSet", params).await
    }

    pub async fn add_sticker_to_set(
        &self,
        user_id: UserId,
        name: &str,
        sticker: &InputSticker,
    ) -> Result<bool> {
        let params = Params::new()
            .text("user_id", user_id.0)
            .text("name", name)
            .json("sticker", sticker)?;
        self.call("addStickerToSet", params).await
    }

    pub async fn replace_sticker_in_set(
        &self,
        user_id: UserId,
        name: &str,
        old_sticker: &str,
        sticker: &InputSticker,
    ) -> Result<bool> {
        let params = Params::new()
            .text("user_id", user_id.0)
            .text("name", name)
            .text("old_sticker", old_sticker)
            .json("sticker", sticker)?;
        self.call("replaceStickerInSet", params).await
    }

    pub async fn delete_sticker_from_set(&self, sticker_file_id: &str) -> Result<bool> {
        self.call(
            "deleteStickerFromSet",
            Params::new().text("sticker", sticker_file_id),
        )
        .await
    }

    pub async fn delete_sticker_set(&self, name: &str) -> Result<bool> {
        self.call("deleteStickerSet", Params::new().text("name", name))
            .await
    }

    pub async fn set_sticker_set_title(&self, name: &str, title: &str) -> Result<bool> {
        let params = Params::new().text("name", name).text("title", title);
        self.call("setStickerSetTitle", params).await
    }

    pub async fn get_chat(&self, chat: impl Into<ChatTarget>) -> Result<ChatFullInfo> {
        self.call("getChat", Params::new().text("chat_id", chat.into()))
            .await
    }

    pub async fn send_invoice(
        &self,
        chat: impl Into<ChatTarget>,
        invoice: &Invoice,
        opts: &SendOptions,
    ) -> Result<Message> {
        let params = Params::new()
            .text("chat_id", chat.into())
            .text("title", &invoice.title)
            .text("description", &invoice.description)
            .text("payload", &invoice.payload)
            .text("currency", &invoice.currency)
            .json("prices", &invoice.prices)?
            .opt_text("provider_token", invoice.provider_token.as_deref());
        self.call("sendInvoice", opts.apply(params)?).await
    }

    /// Accept (`error_message = None`) or reject a pre-checkout query.
    pub async fn answer_pre_checkout_query(
        &self,
        query_id: &str,
        error_message: Option<&str>,
    ) -> Result<bool> {
        let params = Params::new()
            .text("pre_checkout_query_id", query_id)
            .text("ok", error_message.is_none())
            .opt_text("error_message", error_message);
        self.call("answerPreCheckoutQuery", params).await
    }
}
