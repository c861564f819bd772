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

use std::{sync::Arc, time::Duration};

use like_common::{
    INITIALIZING_TEXT, LikeRequest, LikeResult, Outcome, PROGRESS_CAPTION, PROGRESS_STAGES,
    render_outcome, render_success_preview, usage_text,
};
use tracing::{Instrument, debug, error, info, info_span};
use uuid::Uuid;

use crate::{
    animator::animate,
    like_api::{LikeApi, LikeApiError},
    photo_store::PhotoStore,
    telegram::{ChatTransport, MessageRef},
    ui::{UiFailure, UiOperation, best_effort},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationMode {
    /// Animation finishes before the like service is called.
    Sequential,
    /// Animation runs while the call is in flight and stops when it resolves.
    Concurrent,
}

impl AnimationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Concurrent => "concurrent",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LikeFlowSettings {
    pub stage_delay: Duration,
    pub success_preview: Option<Duration>,
    pub animation_mode: AnimationMode,
}

impl Default for LikeFlowSettings {
    fn default() -> Self {
        Self {
            stage_delay: Duration::from_millis(500),
            success_preview: Some(Duration::from_secs(2)),
            animation_mode: AnimationMode::Sequential,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Validating,
    Announcing,
    Animating,
    Calling,
    Rejected,
    Aborted,
    Succeeded,
    AlreadyLiked,
    Failed,
    Unavailable,
    TransportFailed,
}

impl RequestState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::Announcing => "announcing",
            Self::Animating => "animating",
            Self::Calling => "calling",
            Self::Rejected => "rejected",
            Self::Aborted => "aborted",
            Self::Succeeded => "succeeded",
            Self::AlreadyLiked => "already_liked",
            Self::Failed => "failed",
            Self::Unavailable => "unavailable",
            Self::TransportFailed => "transport_failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(
            self,
            Self::Validating | Self::Announcing | Self::Animating | Self::Calling
        )
    }

    fn for_outcome(outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Success(_) => Self::Succeeded,
            Outcome::AlreadyLiked(_) => Self::AlreadyLiked,
            Outcome::Failed(_) => Self::Failed,
            Outcome::ServiceUnavailable { .. } => Self::Unavailable,
            Outcome::TransportError { .. } => Self::TransportFailed,
        }
    }
}

/// What happened to one `/like` command.
#[derive(Debug, Clone)]
pub struct LikeReport {
    pub state: RequestState,
    /// Every state the request entered, starting with `Validating`.
    pub path: Vec<RequestState>,
    pub outcome: Option<Outcome>,
    pub ui_failures: Vec<UiFailure>,
}

struct LikeFlow {
    state: RequestState,
    path: Vec<RequestState>,
    ui_failures: Vec<UiFailure>,
}

impl LikeFlow {
    fn new() -> Self {
        Self {
            state: RequestState::Validating,
            path: vec![RequestState::Validating],
            ui_failures: Vec::new(),
        }
    }

    fn advance(&mut self, next: RequestState) {
        debug_assert!(!self.state.is_terminal(), "terminal states are absorbing");
        debug!(from = self.state.as_str(), to = next.as_str(), "like request state");
        self.state = next;
        self.path.push(next);
    }

    fn finish(self, outcome: Option<Outcome>) -> LikeReport {
        LikeReport {
            state: self.state,
            path: self.path,
            outcome,
            ui_failures: self.ui_failures,
        }
    }
}

pub struct LikeOrchestrator {
    chat: Arc<dyn ChatTransport>,
    like_api: Arc<dyn LikeApi>,
    photos: Arc<dyn PhotoStore>,
    settings: LikeFlowSettings,
}

impl LikeOrchestrator {
    pub fn new(
        chat: Arc<dyn ChatTransport>,
        like_api: Arc<dyn LikeApi>,
        photos: Arc<dyn PhotoStore>,
        settings: LikeFlowSettings,
    ) -> Self {
        Self {
            chat,
            like_api,
            photos,
            settings,
        }
    }

    pub fn settings(&self) -> &LikeFlowSettings {
        &self.settings
    }

    /// Runs `/like <region> <uid>` sent as `command` with positional `args`.
    pub async fn handle_like_command(&self, command: MessageRef, args: &[&str]) -> LikeReport {
        let span = info_span!(
            "like_request",
            request_id = %Uuid::new_v4(),
            chat_id = command.chat_id,
        );
        self.run(command, args).instrument(span).await
    }

    async fn run(&self, command: MessageRef, args: &[&str]) -> LikeReport {
        let mut flow = LikeFlow::new();

        let Some(request) = LikeRequest::from_args(args) else {
            info!(arg_count = args.len(), "like command rejected: wrong usage");
            best_effort(
                UiOperation::Reply,
                self.chat.reply(command, usage_text()).await,
                &mut flow.ui_failures,
            );
            flow.advance(RequestState::Rejected);
            return flow.finish(None);
        };
        info!(region = %request.region, uid = %request.player_id, "like command accepted");

        flow.advance(RequestState::Announcing);
        let progress = match self
            .chat
            .send_message(command.chat_id, INITIALIZING_TEXT)
            .await
        {
            Ok(progress) => progress,
            Err(err) => {
                let detail = format!("{err:#}");
                error!(error = %detail, "could not announce like request; aborting");
                flow.ui_failures.push(UiFailure {
                    operation: UiOperation::Announce,
                    detail,
                });
                flow.advance(RequestState::Aborted);
                return flow.finish(None);
            }
        };

        let call_result = self.animate_and_call(&mut flow, progress, &request).await;

        best_effort(
            UiOperation::DeleteProgress,
            self.chat.delete_message(progress).await,
            &mut flow.ui_failures,
        );

        let outcome = match call_result {
            Ok(result) => Outcome::from_result(result),
            Err(LikeApiError::Unavailable { status }) => Outcome::ServiceUnavailable { status },
            Err(LikeApiError::Transport(detail)) => Outcome::TransportError { detail },
        };

        if let Outcome::Success(result) = &outcome {
            self.show_success_preview(command.chat_id, result, &mut flow.ui_failures)
                .await;
        }
        self.render(command.chat_id, &request, &outcome, &mut flow.ui_failures)
            .await;

        flow.advance(RequestState::for_outcome(&outcome));
        info!(
            outcome = outcome.as_str(),
            ui_failures = flow.ui_failures.len(),
            "like request finished"
        );
        flow.finish(Some(outcome))
    }

    async fn animate_and_call(
        &self,
        flow: &mut LikeFlow,
        target: MessageRef,
        request: &LikeRequest,
    ) -> Result<LikeResult, LikeApiError> {
        flow.advance(RequestState::Animating);
        match self.settings.animation_mode {
            AnimationMode::Sequential => {
                animate(
                    self.chat.as_ref(),
                    target,
                    PROGRESS_CAPTION,
                    &PROGRESS_STAGES,
                    self.settings.stage_delay,
                    &mut flow.ui_failures,
                )
                .await;
                flow.advance(RequestState::Calling);
                self.like_api.send_likes(request).await
            }
            AnimationMode::Concurrent => {
                // The call is in flight from here on; animation only decorates it.
                flow.advance(RequestState::Calling);
                let mut animation_failures = Vec::new();
                let result = {
                    let call = self.like_api.send_likes(request);
                    tokio::pin!(call);
                    let animation = animate(
                        self.chat.as_ref(),
                        target,
                        PROGRESS_CAPTION,
                        &PROGRESS_STAGES,
                        self.settings.stage_delay,
                        &mut animation_failures,
                    );
                    tokio::pin!(animation);
                    let early = tokio::select! {
                        result = &mut call => Some(result),
                        _ = &mut animation => None,
                    };
                    match early {
                        Some(result) => result,
                        None => call.await,
                    }
                };
                flow.ui_failures.extend(animation_failures);
                result
            }
        }
    }

    async fn show_success_preview(
        &self,
        chat_id: i64,
        result: &LikeResult,
        failures: &mut Vec<UiFailure>,
    ) {
        let Some(duration) = self.settings.success_preview else {
            return;
        };
        let preview = best_effort(
            UiOperation::Preview,
            self.chat
                .send_message(chat_id, &render_success_preview(result))
                .await,
            failures,
        );
        if let Some(preview) = preview {
            tokio::time::sleep(duration).await;
            best_effort(
                UiOperation::DeletePreview,
                self.chat.delete_message(preview).await,
                failures,
            );
        }
    }

    async fn render(
        &self,
        chat_id: i64,
        request: &LikeRequest,
        outcome: &Outcome,
        failures: &mut Vec<UiFailure>,
    ) {
        let text = render_outcome(outcome, request);
        if matches!(outcome, Outcome::Success(_)) {
            if let Some(photo) = self.photos.default_photo().await {
                let sent = best_effort(
                    UiOperation::RenderPhoto,
                    self.chat.send_photo(chat_id, &photo, &text).await,
                    failures,
                );
                if sent.is_some() {
                    return;
                }
            }
        }
        best_effort(
            UiOperation::Render,
            self.chat.send_message(chat_id, &text).await,
            failures,
        );
    }
}
