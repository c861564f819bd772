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

//! Recording fakes shared by the unit tests.

use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use like_common::{ChatId, LikeRequest, LikeResponseBody, LikeResult, MessageId};
use serde_json::json;
use teloxide::types::Message;

use crate::{
    like_api::{LikeApi, LikeApiError},
    telegram::{ChatTransport, MessageRef},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    Sent { message_id: MessageId, text: String },
    Replied { to: MessageId, text: String },
    Edited { message_id: MessageId, text: String },
    Deleted { message_id: MessageId },
    Photo { photo: String, caption: String },
    Left { chat_id: ChatId },
}

/// Records every successful call. Sends fail while `send_failures` is
/// non-zero; the other primitives fail when their flag is set.
#[derive(Default)]
pub struct RecordingChat {
    pub events: Mutex<Vec<ChatEvent>>,
    pub send_failures: AtomicUsize,
    pub fail_edits: bool,
    pub fail_deletes: bool,
    pub fail_photos: bool,
    pub profile_photo: Option<String>,
    pub next_id: AtomicUsize,
}

impl RecordingChat {
    pub fn events(&self) -> Vec<ChatEvent> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: ChatEvent) {
        self.events.lock().unwrap().push(event);
    }

    fn allocate(&self, chat_id: ChatId) -> MessageRef {
        let next = self.next_id.fetch_add(1, Ordering::SeqCst) as MessageId;
        MessageRef {
            chat_id,
            message_id: 100 + next,
        }
    }
}

#[async_trait]
impl ChatTransport for RecordingChat {
    async fn send_message(&self, chat_id: ChatId, text: &str) -> anyhow::Result<MessageRef> {
        let refused = self
            .send_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if refused {
            anyhow::bail!("bot was blocked by the user");
        }
        let sent = self.allocate(chat_id);
        self.push(ChatEvent::Sent {
            message_id: sent.message_id,
            text: text.to_string(),
        });
        Ok(sent)
    }

    async fn reply(&self, to: MessageRef, text: &str) -> anyhow::Result<MessageRef> {
        let sent = self.allocate(to.chat_id);
        self.push(ChatEvent::Replied {
            to: to.message_id,
            text: text.to_string(),
        });
        Ok(sent)
    }

    async fn edit_message(&self, target: MessageRef, text: &str) -> anyhow::Result<()> {
        if self.fail_edits {
            anyhow::bail!("message is not modified");
        }
        self.push(ChatEvent::Edited {
            message_id: target.message_id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn delete_message(&self, target: MessageRef) -> anyhow::Result<()> {
        // Recorded even when it fails so tests can count attempts.
        self.push(ChatEvent::Deleted {
            message_id: target.message_id,
        });
        if self.fail_deletes {
            anyhow::bail!("message to delete not found");
        }
        Ok(())
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        photo: &str,
        caption: &str,
    ) -> anyhow::Result<MessageRef> {
        if self.fail_photos {
            anyhow::bail!("wrong file identifier");
        }
        self.push(ChatEvent::Photo {
            photo: photo.to_string(),
            caption: caption.to_string(),
        });
        Ok(self.allocate(chat_id))
    }

    async fn leave_chat(&self, chat_id: ChatId) -> anyhow::Result<()> {
        self.push(ChatEvent::Left { chat_id });
        Ok(())
    }

    async fn latest_profile_photo(&self, _user_id: u64) -> anyhow::Result<Option<String>> {
        Ok(self.profile_photo.clone())
    }
}

#[derive(Debug, Clone)]
pub enum FakeReply {
    Body(&'static str),
    Unavailable(u16),
    Transport(&'static str),
}

pub struct FakeLikeApi {
    pub reply: FakeReply,
    pub calls: AtomicUsize,
}

impl FakeLikeApi {
    pub fn new(reply: FakeReply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LikeApi for FakeLikeApi {
    async fn send_likes(&self, request: &LikeRequest) -> Result<LikeResult, LikeApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            FakeReply::Body(body) => Ok(serde_json::from_str::<LikeResponseBody>(body)
                .unwrap()
                .into_result(request)),
            FakeReply::Unavailable(status) => Err(LikeApiError::Unavailable { status: *status }),
            FakeReply::Transport(detail) => Err(LikeApiError::Transport(detail.to_string())),
        }
    }
}

/// Decodes a Bot API message object.
pub fn incoming(value: serde_json::Value) -> Message {
    serde_json::from_value(value).unwrap()
}

/// A text message with id 5 from user 77 in a chat of the given `kind`.
pub fn text_message(chat_id: ChatId, kind: &str, text: &str) -> Message {
    let chat = if kind == "private" {
        json!({ "id": chat_id, "type": "private", "first_name": "Ace" })
    } else {
        json!({ "id": chat_id, "type": kind, "title": "Likes" })
    };
    incoming(json!({
        "message_id": 5,
        "date": 1767225600,
        "chat": chat,
        "from": { "id": 77, "is_bot": false, "first_name": "Ace", "username": "ace" },
        "text": text,
    }))
}
