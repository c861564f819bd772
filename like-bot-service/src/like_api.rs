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

use std::time::Duration;

use async_trait::async_trait;
use like_common::{LikeRequest, LikeResponseBody, LikeResult};
use rand::Rng;
use reqwest::{StatusCode, Url};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, warn};

/// HTTP statuses that are retried before giving up.
pub const RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

#[derive(Debug, Error)]
pub enum LikeApiError {
    /// The service answered, but not with 200 (after retries).
    #[error("like service returned HTTP {status}")]
    Unavailable { status: u16 },

    /// Sending, timing out, or decoding the body failed.
    #[error("{0}")]
    Transport(String),
}

#[async_trait]
pub trait LikeApi: Send + Sync {
    async fn send_likes(&self, request: &LikeRequest) -> Result<LikeResult, LikeApiError>;
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_factor: f64,
    pub max_backoff: Duration,
    pub total_budget: Duration,
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_factor: 1.0,
            max_backoff: Duration::from_secs(30),
            total_budget: Duration::from_secs(60),
            jitter: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    pub fn is_retryable_status(status: StatusCode) -> bool {
        RETRY_STATUSES.contains(&status.as_u16())
    }

    /// Delay before retry number `retry` (1-based): `factor * 2^(retry - 1)`
    /// seconds, capped at `max_backoff`.
    pub fn base_backoff(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(retry - 1).unwrap_or(i32::MAX);
        let seconds = (self.backoff_factor * 2f64.powi(exponent)).min(self.max_backoff.as_secs_f64());
        if !seconds.is_finite() || seconds <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(seconds).unwrap_or(self.max_backoff)
    }

    fn backoff(&self, retry: u32) -> Duration {
        let base = self.base_backoff(retry);
        let jitter_ms = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        if jitter_ms == 0 {
            return base;
        }
        base.saturating_add(Duration::from_millis(rand::rng().random_range(0..=jitter_ms)))
    }

    /// Whether sleeping `delay` after `elapsed` still ends inside the budget.
    pub fn within_budget(&self, elapsed: Duration, delay: Duration) -> bool {
        elapsed
            .checked_add(delay)
            .is_some_and(|deadline| deadline <= self.total_budget)
    }
}

/// Client for the external like service.
#[derive(Clone)]
pub struct LikeApiClient {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
    timeout: Duration,
    retry: RetryPolicy,
}

impl LikeApiClient {
    pub fn new(
        client: reqwest::Client,
        base_url: Url,
        api_key: String,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client,
            base_url,
            api_key,
            timeout,
            retry,
        }
    }

    pub fn request_url(&self, request: &LikeRequest) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("server_name", &request.region)
            .append_pair("uid", &request.player_id)
            .append_pair("key", &self.api_key);
        url
    }

    /// Issues the GET, retrying retryable statuses and connect/timeout
    /// errors until the retry ceiling or the total budget is reached. The
    /// last response or error is returned as-is.
    async fn get_with_retry(&self, url: Url) -> Result<reqwest::Response, reqwest::Error> {
        let started = Instant::now();
        let mut retry: u32 = 0;
        loop {
            let attempt = self
                .client
                .get(url.clone())
                .timeout(self.timeout)
                .send()
                .await;

            let retryable = match &attempt {
                Ok(response) => RetryPolicy::is_retryable_status(response.status()),
                Err(error) => error.is_connect() || error.is_timeout(),
            };
            if !retryable || retry >= self.retry.max_retries {
                return attempt;
            }

            retry += 1;
            let delay = self.retry.backoff(retry);
            if !self.retry.within_budget(started.elapsed(), delay) {
                warn!(
                    retry,
                    delay_ms = delay.as_millis() as u64,
                    budget_ms = self.retry.total_budget.as_millis() as u64,
                    "like service retry budget exhausted"
                );
                return attempt;
            }

            match &attempt {
                Ok(response) => warn!(
                    retry,
                    status = response.status().as_u16(),
                    delay_ms = delay.as_millis() as u64,
                    "like service returned retryable status; backing off"
                ),
                Err(error) => warn!(
                    retry,
                    timeout = error.is_timeout(),
                    connect = error.is_connect(),
                    delay_ms = delay.as_millis() as u64,
                    "like service call failed; backing off"
                ),
            }
            drop(attempt);
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl LikeApi for LikeApiClient {
    async fn send_likes(&self, request: &LikeRequest) -> Result<LikeResult, LikeApiError> {
        let response = self
            .get_with_retry(self.request_url(request))
            .await
            .map_err(|error| LikeApiError::Transport(error.without_url().to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(LikeApiError::Unavailable {
                status: status.as_u16(),
            });
        }

        let body = response
            .json::<LikeResponseBody>()
            .await
            .map_err(|error| {
                LikeApiError::Transport(format!(
                    "invalid like service payload: {}",
                    error.without_url()
                ))
            })?;
        let result = body.into_result(request);
        debug!(
            region = %request.region,
            uid = %request.player_id,
            status_code = result.status_code,
            likes_given = result.likes_given,
            "like service responded"
        );
        Ok(result)
    }
}
