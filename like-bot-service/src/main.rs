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

mod animator;
mod commands;
mod config;
mod like_api;
mod orchestrator;
mod photo_store;
mod telegram;
#[cfg(test)]
mod test_support;
mod ui;

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use anyhow::Context;
use axum::{Router, routing::get};
use chrono::Utc;
use teloxide::{
    Bot, RequestError,
    dispatching::{Dispatcher, UpdateFilterExt},
    dptree,
    error_handlers::{ErrorHandler, LoggingErrorHandler},
    requests::{Requester, ResponseResult},
    types::{Message, Update},
    update_listeners::Polling,
};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::{
    commands::{BotContext, handle_message},
    config::Settings,
    like_api::LikeApiClient,
    orchestrator::LikeOrchestrator,
    photo_store::InMemoryPhotoStore,
    telegram::TelegramClient,
};

const LIVENESS_BODY: &str = "RS Like Bot (Alive!)";
const POLL_TIMEOUT_SECS: u64 = 60;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "like_bot_service=debug,tower_http=info".to_string()),
        )
        .init();

    let settings = Settings::from_env().context("failed to load like-bot-service settings")?;
    let client = reqwest::Client::builder()
        .build()
        .context("failed to build http client")?;

    let telegram = TelegramClient::new(
        Bot::new(&settings.bot_token).set_api_url(settings.telegram_api_base.clone()),
    );
    let photos = Arc::new(InMemoryPhotoStore::new(settings.default_photo.clone()));
    let like_api = Arc::new(LikeApiClient::new(
        client,
        settings.like_api_url.clone(),
        settings.api_key.clone(),
        settings.request_timeout,
        settings.retry.clone(),
    ));
    let chat = Arc::new(telegram.clone());
    let orchestrator = Arc::new(LikeOrchestrator::new(
        chat.clone(),
        like_api,
        photos.clone(),
        settings.flow.clone(),
    ));
    let ctx = BotContext {
        chat,
        photos,
        orchestrator,
        allowed_chat_id: settings.allowed_chat_id,
        bot_username: None,
        started_at: Utc::now(),
        max_retries: settings.retry.max_retries,
    };

    info!(
        allowed_chat_id = settings.allowed_chat_id,
        animation_mode = settings.flow.animation_mode.as_str(),
        max_retries = settings.retry.max_retries,
        "like-bot-service configured"
    );

    let listener = tokio::net::TcpListener::bind(settings.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind_addr))?;
    info!(bind_addr = %settings.bind_addr, "liveness endpoint listening");
    let server = tokio::spawn(async move { axum::serve(listener, build_router()).await });
    let poller = tokio::spawn(run_polling(
        telegram.bot().clone(),
        ctx,
        settings.poll_restart_delay,
    ));

    tokio::select! {
        result = server => {
            result.context("liveness server task panicked")??;
            anyhow::bail!("liveness server stopped");
        }
        result = poller => {
            result.context("polling task panicked")?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown requested");
        }
    }
    Ok(())
}

fn build_router() -> Router {
    Router::new()
        .route("/", get(liveness))
        .layer(TraceLayer::new_for_http())
}

async fn liveness() -> &'static str {
    LIVENESS_BODY
}

/// Logs a failed long-poll and holds the listener back for `delay`
/// before it polls again.
struct PollingBackoff {
    delay: Duration,
}

impl ErrorHandler<RequestError> for PollingBackoff {
    fn handle_error(
        self: Arc<Self>,
        error: RequestError,
    ) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin(async move {
            warn!(%error, delay_secs = self.delay.as_secs(), "polling failed; restarting");
            tokio::time::sleep(self.delay).await;
        })
    }
}

/// Supervises the long-poll dispatcher. Failures are logged and retried
/// after `restart_delay`; the process itself never exits here.
async fn run_polling(bot: Bot, mut ctx: BotContext, restart_delay: Duration) {
    loop {
        if ctx.bot_username.is_none() {
            match bot.get_me().await {
                Ok(me) => {
                    info!(username = me.username(), "connected to telegram");
                    ctx.bot_username = Some(me.username().to_string());
                }
                Err(error) => {
                    warn!(%error, "getMe failed; retrying");
                    tokio::time::sleep(restart_delay).await;
                    continue;
                }
            }
        }

        let listener = Polling::builder(bot.clone())
            .timeout(Duration::from_secs(POLL_TIMEOUT_SECS))
            .build();
        Dispatcher::builder(bot.clone(), Update::filter_message().endpoint(on_message))
            .dependencies(dptree::deps![ctx.clone()])
            // One task per update, no per-chat ordering.
            .distribution_function(|_| None::<std::convert::Infallible>)
            .default_handler(|update| async move {
                debug!(update_id = ?update.id, "skipping non-message update");
            })
            .error_handler(LoggingErrorHandler::with_custom_text("message handler failed"))
            .build()
            .dispatch_with_listener(
                listener,
                Arc::new(PollingBackoff {
                    delay: restart_delay,
                }),
            )
            .await;

        warn!("dispatcher stopped; restarting");
        tokio::time::sleep(restart_delay).await;
    }
}

async fn on_message(message: Message, ctx: BotContext) -> ResponseResult<()> {
    let dispatch = handle_message(&ctx, &message).await;
    debug!(?dispatch, "update handled");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::ChatId;

    use crate::{
        orchestrator::LikeFlowSettings,
        test_support::{ChatEvent, FakeLikeApi, FakeReply, RecordingChat, text_message},
    };

    async fn spawn_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn liveness_endpoint_answers_with_fixed_body() {
        let base = spawn_stub(build_router()).await;

        let response = reqwest::get(format!("{base}/")).await.unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(response.text().await.unwrap(), LIVENESS_BODY);
    }

    #[tokio::test(start_paused = true)]
    async fn polling_errors_wait_out_the_restart_delay() {
        let backoff = Arc::new(PollingBackoff {
            delay: Duration::from_secs(5),
        });
        let started = tokio::time::Instant::now();

        backoff
            .handle_error(RequestError::MigrateToChatId(ChatId(-1)))
            .await;

        assert!(started.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test]
    async fn message_endpoint_dispatches_to_command_handlers() {
        let chat = Arc::new(RecordingChat::default());
        let photos = Arc::new(InMemoryPhotoStore::default());
        let ctx = BotContext {
            chat: chat.clone(),
            photos: photos.clone(),
            orchestrator: Arc::new(LikeOrchestrator::new(
                chat.clone(),
                Arc::new(FakeLikeApi::new(FakeReply::Unavailable(503))),
                photos,
                LikeFlowSettings::default(),
            )),
            allowed_chat_id: -1,
            bot_username: Some("RsLikeBot".to_string()),
            started_at: Utc::now(),
            max_retries: 3,
        };

        on_message(text_message(31, "private", "/start"), ctx)
            .await
            .unwrap();

        assert!(matches!(
            &chat.events()[..],
            [ChatEvent::Replied { to: 5, .. }]
        ));
    }
}
