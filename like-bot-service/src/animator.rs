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

use like_common::render_progress;
use tracing::debug;

use crate::{
    telegram::{ChatTransport, MessageRef},
    ui::{UiFailure, UiOperation, best_effort},
};

/// Edits `target` once per stage, sleeping `delay` after each edit.
///
/// Edit failures land in `failures` and never stop the sequence. Dropping
/// the future stops the animation at the current stage.
pub async fn animate(
    chat: &dyn ChatTransport,
    target: MessageRef,
    caption: &str,
    stages: &[u8],
    delay: Duration,
    failures: &mut Vec<UiFailure>,
) {
    for (index, percentage) in stages.iter().copied().enumerate() {
        let text = render_progress(caption, percentage, index);
        best_effort(
            UiOperation::Edit,
            chat.edit_message(target, &text).await,
            failures,
        );
        debug!(
            chat_id = target.chat_id,
            message_id = target.message_id,
            percentage,
            "progress stage rendered"
        );
        tokio::time::sleep(delay).await;
    }
}
