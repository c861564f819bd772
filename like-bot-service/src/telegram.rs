// Copyright (C) 2026 StarHuntingGames
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use anyhow::Context;
use async_trait::async_trait;
use like_common::{ChatId, MessageId};
use reqwest::Url;
use teloxide::{
    Bot,
    payloads::{
        EditMessageTextSetters, GetUserProfilePhotosSetters, SendMessageSetters,
        SendPhotoSetters,
    },
    requests::Requester,
    types::{self as tg, InputFile, Message, ParseMode, PhotoSize, ReplyParameters},
};

/// A message that already exists in some chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

impl MessageRef {
    pub fn of(message: &Message) -> Self {
        Self {
            chat_id: message.chat.id.0,
            message_id: message.id.0,
        }
    }
}

/// Chat primitives consumed by the command handlers.
///
/// Text is always sent as HTML. `photo` arguments are a file id or an
/// HTTP(S) URL.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_message(&self, chat_id: ChatId, text: &str) -> anyhow::Result<MessageRef>;
    async fn reply(&self, to: MessageRef, text: &str) -> anyhow::Result<MessageRef>;
    async fn edit_message(&self, target: MessageRef, text: &str) -> anyhow::Result<()>;
    async fn delete_message(&self, target: MessageRef) -> anyhow::Result<()>;
    async fn send_photo(
        &self,
        chat_id: ChatId,
        photo: &str,
        caption: &str,
    ) -> anyhow::Result<MessageRef>;
    async fn leave_chat(&self, chat_id: ChatId) -> anyhow::Result<()>;
    async fn latest_profile_photo(&self, user_id: u64) -> anyhow::Result<Option<String>>;
}

/// File id of the biggest rendition in a photo size list.
pub fn largest_photo(sizes: &[PhotoSize]) -> Option<String> {
    sizes
        .iter()
        .max_by_key(|size| u64::from(size.width) * u64::from(size.height))
        .map(|size| size.file.id.to_string())
}

/// The command text of a message: its text, or the caption of a photo.
pub fn command_text(message: &Message) -> Option<&str> {
    message.text().or_else(|| message.caption())
}

fn input_file(photo: &str) -> InputFile {
    match Url::parse(photo) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => InputFile::url(url),
        _ => InputFile::file_id(photo.to_string()),
    }
}

/// [`ChatTransport`] over a teloxide [`Bot`].
#[derive(Clone)]
pub struct TelegramClient {
    bot: Bot,
}

impl TelegramClient {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    pub fn bot(&self) -> &Bot {
        &self.bot
    }
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn send_message(&self, chat_id: ChatId, text: &str) -> anyhow::Result<MessageRef> {
        let sent = self
            .bot
            .send_message(tg::ChatId(chat_id), text)
            .parse_mode(ParseMode::Html)
            .await
            .context("sendMessage failed")?;
        Ok(MessageRef::of(&sent))
    }

    async fn reply(&self, to: MessageRef, text: &str) -> anyhow::Result<MessageRef> {
        let sent = self
            .bot
            .send_message(tg::ChatId(to.chat_id), text)
            .parse_mode(ParseMode::Html)
            .reply_parameters(ReplyParameters::new(tg::MessageId(to.message_id)))
            .await
            .context("sendMessage (reply) failed")?;
        Ok(MessageRef::of(&sent))
    }

    async fn edit_message(&self, target: MessageRef, text: &str) -> anyhow::Result<()> {
        self.bot
            .edit_message_text(
                tg::ChatId(target.chat_id),
                tg::MessageId(target.message_id),
                text,
            )
            .parse_mode(ParseMode::Html)
            .await
            .context("editMessageText failed")?;
        Ok(())
    }

    async fn delete_message(&self, target: MessageRef) -> anyhow::Result<()> {
        self.bot
            .delete_message(tg::ChatId(target.chat_id), tg::MessageId(target.message_id))
            .await
            .context("deleteMessage failed")?;
        Ok(())
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        photo: &str,
        caption: &str,
    ) -> anyhow::Result<MessageRef> {
        let sent = self
            .bot
            .send_photo(tg::ChatId(chat_id), input_file(photo))
            .caption(caption)
            .parse_mode(ParseMode::Html)
            .await
            .context("sendPhoto failed")?;
        Ok(MessageRef::of(&sent))
    }

    async fn leave_chat(&self, chat_id: ChatId) -> anyhow::Result<()> {
        self.bot
            .leave_chat(tg::ChatId(chat_id))
            .await
            .context("leaveChat failed")?;
        Ok(())
    }

    async fn latest_profile_photo(&self, user_id: u64) -> anyhow::Result<Option<String>> {
        let photos = self
            .bot
            .get_user_profile_photos(tg::UserId(user_id))
            .limit(1)
            .await
            .context("getUserProfilePhotos failed")?;
        Ok(photos
            .photos
            .first()
            .and_then(|sizes| largest_photo(sizes)))
    }
}
