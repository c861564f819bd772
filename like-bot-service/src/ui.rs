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

use tracing::warn;

/// Chat operations whose failure is logged and swallowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiOperation {
    Reply,
    Announce,
    Edit,
    DeleteProgress,
    Preview,
    DeletePreview,
    Render,
    RenderPhoto,
    SendPhoto,
    LeaveChat,
}

impl UiOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reply => "reply",
            Self::Announce => "announce",
            Self::Edit => "edit",
            Self::DeleteProgress => "delete_progress",
            Self::Preview => "preview",
            Self::DeletePreview => "delete_preview",
            Self::Render => "render",
            Self::RenderPhoto => "render_photo",
            Self::SendPhoto => "send_photo",
            Self::LeaveChat => "leave_chat",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiFailure {
    pub operation: UiOperation,
    pub detail: String,
}

/// Unwraps a best-effort chat call. An error is logged, appended to
/// `failures`, and turned into `None`.
pub fn best_effort<T>(
    operation: UiOperation,
    result: anyhow::Result<T>,
    failures: &mut Vec<UiFailure>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            let detail = format!("{:#}", error);
            warn!(operation = operation.as_str(), error = %detail, "chat operation failed; continuing");
            failures.push(UiFailure { operation, detail });
            None
        }
    }
}
