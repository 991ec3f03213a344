//! Telegram IM: all teloxide usage is confined here. Exposes the attachment source
//! and reply sink the pipeline consumes, the `/start` and `/help` commands, and the
//! long-polling dispatcher that routes photos and image documents into the relay.

use std::sync::Arc;

use async_trait::async_trait;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, FileMeta, ParseMode};
use teloxide::utils::command::BotCommands;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::im::transport::{AttachmentSource, FetchError, ReplySink, SendError};
use crate::pipeline::UploadPipeline;

/// Telegram reference to one downloadable image (a photo or an image-typed
/// document). `fetch` resolves the file through getFile and downloads its bytes;
/// the suggested name is the last segment of the remote file path.
pub struct TelegramAttachment {
    bot: Bot,
    file: FileMeta,
}

impl TelegramAttachment {
    pub fn new(bot: Bot, file: FileMeta) -> Self {
        Self { bot, file }
    }
}

#[async_trait]
impl AttachmentSource for TelegramAttachment {
    async fn fetch(&self) -> Result<(String, Vec<u8>), FetchError> {
        let file = self
            .bot
            .get_file(self.file.id.clone())
            .await
            .map_err(|e| FetchError::Remote(e.to_string()))?;

        let mut bytes = Vec::new();
        self.bot
            .download_file(&file.path, &mut bytes)
            .await
            .map_err(|e| FetchError::Remote(e.to_string()))?;

        Ok((suggested_name(&file.path), bytes))
    }
}

/// File name suggested by the Telegram file path (e.g. "photos/file_0.jpg").
fn suggested_name(remote_path: &str) -> String {
    remote_path
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("attachment.bin")
        .to_string()
}

/// Reply sink bound to one chat: HTML for success messages, plain text otherwise.
pub struct TelegramReplySink {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramReplySink {
    pub fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self { bot, chat_id }
    }
}

#[async_trait]
impl ReplySink for TelegramReplySink {
    async fn reply_html(&self, html: &str) -> Result<(), SendError> {
        self.bot
            .send_message(self.chat_id, html)
            .parse_mode(ParseMode::Html)
            .await
            .map_err(|e| SendError::Other(e.to_string()))?;
        Ok(())
    }

    async fn reply_text(&self, text: &str) -> Result<(), SendError> {
        self.bot
            .send_message(self.chat_id, text)
            .await
            .map_err(|e| SendError::Other(e.to_string()))?;
        Ok(())
    }
}

/// Commands surfaced to end users.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    #[command(description = "start using the bot")]
    Start,
    #[command(description = "show this help message")]
    Help,
}

const WELCOME: &str =
    "Welcome! Send me an image and I will reply with hosted links. Use /help to see all commands.";

async fn handle_command(bot: Bot, msg: Message, cmd: Command) -> ResponseResult<()> {
    match cmd {
        Command::Start => {
            bot.send_message(msg.chat.id, WELCOME).await?;
        }
        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string()).await?;
        }
    }
    Ok(())
}

async fn handle_photo(bot: Bot, msg: Message, pipeline: Arc<UploadPipeline>) -> ResponseResult<()> {
    // Telegram sends one entry per size; the last one is the largest.
    let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) else {
        return Ok(());
    };
    relay(bot, &msg, pipeline, photo.file.clone()).await;
    Ok(())
}

async fn handle_image_document(
    bot: Bot,
    msg: Message,
    pipeline: Arc<UploadPipeline>,
) -> ResponseResult<()> {
    let Some(doc) = msg.document() else {
        return Ok(());
    };
    relay(bot, &msg, pipeline, doc.file.clone()).await;
    Ok(())
}

/// Documents that are not images are removed from the chat instead of processed.
async fn handle_other_document(bot: Bot, msg: Message) -> ResponseResult<()> {
    if let Err(e) = bot.delete_message(msg.chat.id, msg.id).await {
        warn!(chat_id = msg.chat.id.0, error = %e, "could not delete non-image document");
    }
    Ok(())
}

/// Run one pipeline invocation for the given file reference.
async fn relay(bot: Bot, msg: &Message, pipeline: Arc<UploadPipeline>, file: FileMeta) {
    let chat_id = msg.chat.id;
    info!(chat_id = chat_id.0, from = %format_user(msg), "inbound image");

    let _ = bot.send_chat_action(chat_id, ChatAction::UploadPhoto).await;

    let source = TelegramAttachment::new(bot.clone(), file);
    let sink = TelegramReplySink::new(bot, chat_id);
    pipeline.handle_attachment(&source, &sink).await;
}

fn is_image_document(msg: &Message) -> bool {
    msg.document()
        .and_then(|d| d.mime_type.as_ref())
        .map(|m| m.type_() == "image")
        .unwrap_or(false)
}

fn format_user(msg: &Message) -> String {
    msg.from
        .as_ref()
        .map(|u| {
            u.username
                .as_ref()
                .map(|s| format!("@{}", s))
                .unwrap_or_else(|| u.first_name.clone())
        })
        .unwrap_or_else(|| "?".to_string())
}

/// Run the Telegram bot (long polling): verify the token with getMe, build the
/// pipeline, then dispatch commands, photos and image documents until the
/// dispatcher stops (e.g. Ctrl+C).
pub async fn run_telegram_bot(config: Config) -> anyhow::Result<()> {
    let bot = Bot::new(&config.bot_token);

    match bot.get_me().await {
        Ok(me) => {
            let name = me.user.username.as_deref().unwrap_or("(no username)");
            info!(bot = name, "bot started");
        }
        Err(e) => {
            error!(error = %e, "getMe failed");
            anyhow::bail!("getMe failed (check TELEGRAM_BOT_TOKEN): {e}");
        }
    }

    let pipeline = Arc::new(UploadPipeline::new(&config)?);

    let handler = Update::filter_message()
        .branch(dptree::entry().filter_command::<Command>().endpoint(handle_command))
        .branch(dptree::filter(|msg: Message| msg.photo().is_some()).endpoint(handle_photo))
        .branch(dptree::filter(|msg: Message| is_image_document(&msg)).endpoint(handle_image_document))
        .branch(dptree::filter(|msg: Message| msg.document().is_some()).endpoint(handle_other_document));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![pipeline])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggested_name_takes_last_segment() {
        assert_eq!(suggested_name("photos/file_42.jpg"), "file_42.jpg");
        assert_eq!(suggested_name("file_1.png"), "file_1.png");
    }

    #[test]
    fn suggested_name_falls_back_on_trailing_slash() {
        assert_eq!(suggested_name("photos/"), "attachment.bin");
        assert_eq!(suggested_name(""), "attachment.bin");
    }
}
