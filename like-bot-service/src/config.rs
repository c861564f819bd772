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

use std::{net::SocketAddr, time::Duration};

use anyhow::Context;
use like_common::ChatId;
use reqwest::Url;

use crate::{
    like_api::RetryPolicy,
    orchestrator::{AnimationMode, LikeFlowSettings},
};

const DEFAULT_ALLOWED_GROUP: ChatId = -1002892874648;

#[derive(Clone)]
pub struct Settings {
    pub bot_token: String,
    pub like_api_url: Url,
    pub api_key: String,
    pub allowed_chat_id: ChatId,
    pub bind_addr: SocketAddr,
    pub telegram_api_base: Url,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    pub flow: LikeFlowSettings,
    pub poll_restart_delay: Duration,
    pub default_photo: Option<String>,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads settings through `lookup`, which returns the raw value of a variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |name: &str| normalize_optional_string(lookup(name));
        let required = |name: &str| var(name).with_context(|| format!("{name} must be set"));
        let number = |name: &str, default: u64| {
            var(name)
                .and_then(|value| value.parse::<u64>().ok())
                .unwrap_or(default)
        };

        let like_api_url = required("LIKE_API_URL")?;
        let like_api_url =
            Url::parse(&like_api_url).with_context(|| format!("invalid LIKE_API_URL '{like_api_url}'"))?;

        let telegram_api_base = var("TELEGRAM_API_BASE")
            .unwrap_or_else(|| "https://api.telegram.org".to_string());
        let telegram_api_base = Url::parse(&telegram_api_base)
            .with_context(|| format!("invalid TELEGRAM_API_BASE '{telegram_api_base}'"))?;

        let allowed_chat_id = match var("ALLOWED_GROUP") {
            Some(value) => value
                .parse::<ChatId>()
                .with_context(|| format!("invalid ALLOWED_GROUP '{value}'"))?,
            None => DEFAULT_ALLOWED_GROUP,
        };
        let port = match var("PORT") {
            Some(value) => value
                .parse::<u16>()
                .with_context(|| format!("invalid PORT '{value}'"))?,
            None => 8080,
        };

        let backoff_factor = var("LIKE_RETRY_BACKOFF_FACTOR")
            .and_then(|value| value.parse::<f64>().ok())
            .filter(|value| value.is_finite())
            .unwrap_or(1.0)
            .max(0.0);
        let retry = RetryPolicy {
            max_retries: u32::try_from(number("LIKE_RETRY_MAX_RETRIES", 3)).unwrap_or(u32::MAX),
            backoff_factor,
            max_backoff: Duration::from_secs(number("LIKE_RETRY_MAX_BACKOFF_SECS", 30)),
            total_budget: Duration::from_secs(number("LIKE_RETRY_TOTAL_BUDGET_SECS", 60)),
            jitter: Duration::from_millis(number("LIKE_RETRY_JITTER_MS", 0)),
        };

        let animation_mode = match var("LIKE_ANIMATION_MODE")
            .map(|value| value.to_ascii_lowercase())
            .as_deref()
        {
            None | Some("sequential") => AnimationMode::Sequential,
            Some("concurrent") => AnimationMode::Concurrent,
            Some(other) => anyhow::bail!("invalid LIKE_ANIMATION_MODE '{other}'"),
        };
        let preview_ms = number("LIKE_SUCCESS_PREVIEW_MS", 2000);
        let flow = LikeFlowSettings {
            stage_delay: Duration::from_millis(number("LIKE_STAGE_DELAY_MS", 500)),
            success_preview: (preview_ms > 0).then(|| Duration::from_millis(preview_ms)),
            animation_mode,
        };

        Ok(Self {
            bot_token: required("BOT_TOKEN")?,
            like_api_url,
            api_key: required("API_KEY")?,
            allowed_chat_id,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], port)),
            telegram_api_base,
            request_timeout: Duration::from_secs(number("LIKE_REQUEST_TIMEOUT_SECS", 25).max(1)),
            retry,
            flow,
            poll_restart_delay: Duration::from_secs(number("POLL_RESTART_DELAY_SECS", 5)),
            default_photo: var("DEFAULT_PHOTO"),
        })
    }
}

fn normalize_optional_string(value: Option<String>) -> Option<String> {
    value
        .map(|entry| entry.trim().to_string())
        .filter(|entry| !entry.is_empty())
}
