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

use std::sync::Arc;

use chrono::{DateTime, Utc};
use like_common::{ChatId, help_text, welcome_text};
use teloxide::{
    types::Message,
    utils::command::{BotCommands, ParseError},
};
use tracing::{debug, info, warn};

use crate::{
    orchestrator::{LikeOrchestrator, LikeReport},
    photo_store::PhotoStore,
    telegram::{ChatTransport, MessageRef, command_text, largest_photo},
    ui::{UiFailure, UiOperation, best_effort},
};

const NO_PHOTO_TEXT: &str = "🖼 No photo available. Reply to a photo with <code>/setdefaultphoto</code>.";
const SET_PHOTO_USAGE: &str = "⚠️ Reply to a photo (or send one) with <code>/setdefaultphoto</code>.";
const PHOTO_UPDATED_TEXT: &str = "✅ Default photo updated.";

#[derive(BotCommands, Debug, Clone, PartialEq, Eq)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    #[command(description = "welcome and usage")]
    Start,
    #[command(description = "list commands")]
    Help,
    #[command(description = "bot status")]
    Status,
    #[command(description = "send likes: /like <region> <uid>", parse_with = split_args)]
    Like(Vec<String>),
    #[command(description = "show your profile photo")]
    Photo,
    #[command(description = "reply to a photo to make it the default", parse_with = split_args)]
    SetDefaultPhoto(Vec<String>),
}

/// Keeps every whitespace-separated argument so arity is checked by the handler.
fn split_args(input: String) -> Result<(Vec<String>,), ParseError> {
    Ok((input.split_whitespace().map(str::to_string).collect(),))
}

/// Everything a single update handler needs. Cheap to clone per task.
#[derive(Clone)]
pub struct BotContext {
    pub chat: Arc<dyn ChatTransport>,
    pub photos: Arc<dyn PhotoStore>,
    pub orchestrator: Arc<LikeOrchestrator>,
    pub allowed_chat_id: ChatId,
    pub bot_username: Option<String>,
    pub started_at: DateTime<Utc>,
    pub max_retries: u32,
}

/// How an incoming message was handled.
#[derive(Debug)]
pub enum Dispatch {
    LeftChat,
    Ignored,
    Replied,
    Like(LikeReport),
}

pub async fn handle_message(ctx: &BotContext, message: &Message) -> Dispatch {
    let mut failures = Vec::new();
    let chat_id = message.chat.id.0;

    if (message.chat.is_group() || message.chat.is_supergroup()) && chat_id != ctx.allowed_chat_id {
        warn!(chat_id, "message from unlisted group; leaving chat");
        best_effort(
            UiOperation::LeaveChat,
            ctx.chat.leave_chat(chat_id).await,
            &mut failures,
        );
        return Dispatch::LeftChat;
    }

    let Some(text) = command_text(message) else {
        return Dispatch::Ignored;
    };
    let command = match Command::parse(text, ctx.bot_username.as_deref().unwrap_or_default()) {
        Ok(command) => command,
        Err(error) => {
            debug!(chat_id, %error, "not a command for this bot");
            return Dispatch::Ignored;
        }
    };
    info!(chat_id, ?command, "command received");

    let origin = MessageRef::of(message);
    match command {
        Command::Start => reply(ctx, origin, welcome_text(), &mut failures).await,
        Command::Help => reply(ctx, origin, help_text(), &mut failures).await,
        Command::Status => {
            let text = render_status(ctx, Utc::now());
            reply(ctx, origin, &text, &mut failures).await
        }
        Command::Like(args) => {
            let args = args.iter().map(String::as_str).collect::<Vec<_>>();
            Dispatch::Like(ctx.orchestrator.handle_like_command(origin, &args).await)
        }
        Command::Photo => send_profile_photo(ctx, message, &mut failures).await,
        Command::SetDefaultPhoto(args) => {
            set_default_photo(ctx, message, &args, &mut failures).await
        }
    }
}

async fn reply(
    ctx: &BotContext,
    origin: MessageRef,
    text: &str,
    failures: &mut Vec<UiFailure>,
) -> Dispatch {
    best_effort(UiOperation::Reply, ctx.chat.reply(origin, text).await, failures);
    Dispatch::Replied
}

pub fn render_status(ctx: &BotContext, now: DateTime<Utc>) -> String {
    let uptime = (now - ctx.started_at).num_seconds().max(0);
    let settings = ctx.orchestrator.settings();
    format!(
        "⚙️ <b>Bot is running</b>\n\
         🕒 Up since: {}\n\
         ⏱ Uptime: {}h {}m {}s\n\
         🔁 Retries: {}\n\
         🎞 Animation: {}",
        ctx.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
        uptime / 3600,
        (uptime % 3600) / 60,
        uptime % 60,
        ctx.max_retries,
        settings.animation_mode.as_str(),
    )
}

async fn send_profile_photo(
    ctx: &BotContext,
    message: &Message,
    failures: &mut Vec<UiFailure>,
) -> Dispatch {
    let profile = match &message.from {
        Some(user) => match ctx.chat.latest_profile_photo(user.id.0).await {
            Ok(photo) => photo,
            Err(error) => {
                warn!(user_id = user.id.0, error = %format!("{:#}", error), "profile photo lookup failed");
                None
            }
        },
        None => None,
    };

    let (photo, caption) = match profile {
        Some(photo) => (photo, "🖼 Your profile photo"),
        None => match ctx.photos.default_photo().await {
            Some(photo) => (photo, "🖼 Default photo"),
            None => {
                return reply(ctx, MessageRef::of(message), NO_PHOTO_TEXT, failures).await;
            }
        },
    };
    best_effort(
        UiOperation::SendPhoto,
        ctx.chat.send_photo(message.chat.id.0, &photo, caption).await,
        failures,
    );
    Dispatch::Replied
}

async fn set_default_photo(
    ctx: &BotContext,
    message: &Message,
    args: &[String],
    failures: &mut Vec<UiFailure>,
) -> Dispatch {
    let origin = MessageRef::of(message);
    let photo = message
        .photo()
        .and_then(largest_photo)
        .or_else(|| {
            message
                .reply_to_message()
                .and_then(Message::photo)
                .and_then(largest_photo)
        })
        .or_else(|| args.first().cloned());

    let Some(photo) = photo else {
        return reply(ctx, origin, SET_PHOTO_USAGE, failures).await;
    };
    ctx.photos.set_default_photo(photo).await;
    info!(chat_id = origin.chat_id, "default photo updated");
    reply(ctx, origin, PHOTO_UPDATED_TEXT, failures).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use chrono::TimeZone;
    use serde_json::json;

    use crate::{
        orchestrator::{LikeFlowSettings, RequestState},
        photo_store::InMemoryPhotoStore,
        test_support::{ChatEvent, FakeLikeApi, FakeReply, RecordingChat, incoming, text_message},
    };

    const ALLOWED: ChatId = -1000;

    fn context(chat: RecordingChat) -> (BotContext, Arc<RecordingChat>, Arc<FakeLikeApi>) {
        let chat = Arc::new(chat);
        let api = Arc::new(FakeLikeApi::new(FakeReply::Body(r#"{"status":1}"#)));
        let photos: Arc<dyn PhotoStore> = Arc::new(InMemoryPhotoStore::default());
        let orchestrator = Arc::new(LikeOrchestrator::new(
            chat.clone(),
            api.clone(),
            photos.clone(),
            LikeFlowSettings {
                stage_delay: Duration::ZERO,
                success_preview: None,
                ..LikeFlowSettings::default()
            },
        ));
        let ctx = BotContext {
            chat: chat.clone(),
            photos,
            orchestrator,
            allowed_chat_id: ALLOWED,
            bot_username: Some("RsLikeBot".to_string()),
            started_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            max_retries: 3,
        };
        (ctx, chat, api)
    }

    #[tokio::test]
    async fn unlisted_group_is_left_without_processing() {
        let (ctx, chat, api) = context(RecordingChat::default());
        let dispatch = handle_message(&ctx, &text_message(-555, "supergroup", "/like bd 1")).await;

        assert!(matches!(dispatch, Dispatch::LeftChat));
        assert_eq!(chat.events(), vec![ChatEvent::Left { chat_id: -555 }]);
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn allowed_group_and_private_chats_are_served() {
        for (chat_id, kind) in [(ALLOWED, "supergroup"), (31, "private")] {
            let (ctx, _chat, api) = context(RecordingChat::default());
            let dispatch = handle_message(&ctx, &text_message(chat_id, kind, "/like BD 123")).await;
            match dispatch {
                Dispatch::Like(report) => assert_eq!(report.state, RequestState::Succeeded),
                other => panic!("unexpected dispatch {other:?}"),
            }
            assert_eq!(api.calls(), 1);
        }
    }

    #[tokio::test]
    async fn like_without_enough_arguments_never_calls_service() {
        let (ctx, chat, api) = context(RecordingChat::default());
        let dispatch = handle_message(&ctx, &text_message(31, "private", "/like bd")).await;

        match dispatch {
            Dispatch::Like(report) => assert_eq!(report.state, RequestState::Rejected),
            other => panic!("unexpected dispatch {other:?}"),
        }
        assert_eq!(api.calls(), 0);
        assert!(matches!(&chat.events()[..], [ChatEvent::Replied { text, .. }] if text.contains("Wrong usage")));
    }

    #[tokio::test]
    async fn commands_for_other_bots_and_plain_text_are_ignored() {
        let (ctx, chat, _api) = context(RecordingChat::default());
        assert!(matches!(
            handle_message(&ctx, &text_message(31, "private", "/start@OtherBot")).await,
            Dispatch::Ignored
        ));
        assert!(matches!(
            handle_message(&ctx, &text_message(31, "private", "hello there")).await,
            Dispatch::Ignored
        ));
        assert!(matches!(
            handle_message(&ctx, &text_message(31, "private", "/unknown")).await,
            Dispatch::Ignored
        ));
        assert!(chat.events().is_empty());
    }

    #[tokio::test]
    async fn start_and_help_reply_to_the_command() {
        let (ctx, chat, _api) = context(RecordingChat::default());
        handle_message(&ctx, &text_message(31, "private", "/start@RsLikeBot")).await;
        handle_message(&ctx, &text_message(31, "private", "/help")).await;

        let events = chat.events();
        assert!(matches!(&events[0], ChatEvent::Replied { to: 5, text } if text.contains("Welcome")));
        assert!(matches!(&events[1], ChatEvent::Replied { to: 5, text } if text.contains("/status")));
    }

    #[test]
    fn status_reports_uptime_and_settings() {
        let (ctx, _chat, _api) = context(RecordingChat::default());
        let now = ctx.started_at + chrono::Duration::seconds(3 * 3600 + 2 * 60 + 5);
        let text = render_status(&ctx, now);
        assert!(text.contains("Bot is running"));
        assert!(text.contains("Up since: 2026-01-01 00:00:00 UTC"));
        assert!(text.contains("Uptime: 3h 2m 5s"));
        assert!(text.contains("Retries: 3"));
        assert!(text.contains("Animation: sequential"));
    }

    #[tokio::test]
    async fn set_default_photo_uses_replied_photo() {
        let (ctx, chat, _api) = context(RecordingChat::default());
        let message = incoming(json!({
            "message_id": 8,
            "date": 1767225600,
            "chat": { "id": 31, "type": "private", "first_name": "Ace" },
            "text": "/setdefaultphoto",
            "reply_to_message": {
                "message_id": 7,
                "date": 1767225500,
                "chat": { "id": 31, "type": "private", "first_name": "Ace" },
                "photo": [
                    { "file_id": "thumb", "file_unique_id": "t", "file_size": 1, "width": 90, "height": 90 },
                    { "file_id": "full", "file_unique_id": "f", "file_size": 9, "width": 1280, "height": 720 },
                ],
            },
        }));

        handle_message(&ctx, &message).await;
        assert_eq!(ctx.photos.default_photo().await.as_deref(), Some("full"));
        assert!(matches!(&chat.events()[..], [ChatEvent::Replied { text, .. }] if text == PHOTO_UPDATED_TEXT));
    }

    #[tokio::test]
    async fn set_default_photo_without_photo_replies_usage() {
        let (ctx, chat, _api) = context(RecordingChat::default());
        handle_message(&ctx, &text_message(31, "private", "/setdefaultphoto")).await;
        assert_eq!(ctx.photos.default_photo().await, None);
        assert!(matches!(&chat.events()[..], [ChatEvent::Replied { text, .. }] if text == SET_PHOTO_USAGE));
    }

    #[tokio::test]
    async fn photo_prefers_profile_then_default() {
        let (ctx, chat, _api) = context(RecordingChat {
            profile_photo: Some("profile".to_string()),
            ..RecordingChat::default()
        });
        handle_message(&ctx, &text_message(31, "private", "/photo")).await;
        assert!(matches!(&chat.events()[..], [ChatEvent::Photo { photo, .. }] if photo == "profile"));

        let (ctx, chat, _api) = context(RecordingChat::default());
        handle_message(&ctx, &text_message(31, "private", "/photo")).await;
        assert!(matches!(&chat.events()[..], [ChatEvent::Replied { text, .. }] if text == NO_PHOTO_TEXT));

        ctx.photos.set_default_photo("fallback".to_string()).await;
        handle_message(&ctx, &text_message(31, "private", "/photo")).await;
        assert!(matches!(chat.events().last(), Some(ChatEvent::Photo { photo, .. }) if photo == "fallback"));
    }

    #[test]
    fn command_arguments_are_kept_for_arity_checks() {
        assert_eq!(
            Command::parse("/like bd 123 extra", "RsLikeBot").unwrap(),
            Command::Like(vec!["bd".to_string(), "123".to_string(), "extra".to_string()])
        );
        assert_eq!(
            Command::parse("/like@RsLikeBot", "RsLikeBot").unwrap(),
            Command::Like(Vec::new())
        );
        assert_eq!(
            Command::parse("/setdefaultphoto", "RsLikeBot").unwrap(),
            Command::SetDefaultPhoto(Vec::new())
        );
        assert!(Command::parse("/like@OtherBot bd 1", "RsLikeBot").is_err());
    }
}
