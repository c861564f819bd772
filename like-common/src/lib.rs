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

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Percentage checkpoints rendered by the progress animation, in order.
pub const PROGRESS_STAGES: [u8; 6] = [10, 25, 45, 65, 85, 100];
pub const PROGRESS_BAR_WIDTH: usize = 20;
pub const PROGRESS_FILLED_GLYPH: char = '█';
pub const PROGRESS_EMPTY_GLYPH: char = '░';
pub const PROGRESS_MARKERS: [&str; 6] = ["🔥", "⚡", "✨", "💎", "🌟", "🚀"];

pub const INITIALIZING_TEXT: &str = "⏳ Initializing...";
pub const PROGRESS_CAPTION: &str = "🔒 Preparing secure like session...\n🔎 Validating details...";
pub const DEFAULT_NICKNAME: &str = "Unknown";

pub const STATUS_SUCCESS: i64 = 1;
pub const STATUS_ALREADY_LIKED: i64 = 2;

pub type ChatId = i64;
pub type MessageId = i32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeRequest {
    pub region: String,
    pub player_id: String,
}

impl LikeRequest {
    /// Builds a request from the positional arguments that follow `/like`.
    ///
    /// Returns `None` when fewer than two arguments were supplied. Anything
    /// past the second argument is ignored.
    pub fn from_args(args: &[&str]) -> Option<Self> {
        let region = args.first().map(|value| value.trim()).filter(|v| !v.is_empty())?;
        let player_id = args.get(1).map(|value| value.trim()).filter(|v| !v.is_empty())?;
        Some(Self {
            region: region.to_lowercase(),
            player_id: player_id.to_string(),
        })
    }
}

/// Raw body returned by the like service. Every field is optional and the
/// numeric ones tolerate strings and nulls.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LikeResponseBody {
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default, rename = "LikesGivenByAPI")]
    pub likes_given: Option<Value>,
    #[serde(default, rename = "LikesbeforeCommand")]
    pub likes_before: Option<Value>,
    #[serde(default, rename = "LikesafterCommand")]
    pub likes_after: Option<Value>,
    #[serde(default, rename = "PlayerNickname")]
    pub player_nickname: Option<Value>,
    #[serde(default, rename = "UID")]
    pub uid: Option<Value>,
}

impl LikeResponseBody {
    pub fn into_result(self, request: &LikeRequest) -> LikeResult {
        LikeResult {
            status_code: lenient_i64(self.status.as_ref()),
            likes_given: lenient_i64(self.likes_given.as_ref()),
            likes_before: lenient_i64(self.likes_before.as_ref()),
            likes_after: lenient_i64(self.likes_after.as_ref()),
            player_nickname: lenient_string(self.player_nickname.as_ref())
                .unwrap_or_else(|| DEFAULT_NICKNAME.to_string()),
            resolved_player_id: lenient_string(self.uid.as_ref())
                .unwrap_or_else(|| request.player_id.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LikeResult {
    pub status_code: i64,
    pub likes_given: i64,
    pub likes_before: i64,
    pub likes_after: i64,
    pub player_nickname: String,
    pub resolved_player_id: String,
}

fn lenient_i64(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float.trunc() as i64))
            .unwrap_or(0),
        Some(Value::String(text)) => {
            let text = text.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().map(|float| float.trunc() as i64))
                .unwrap_or(0)
        }
        Some(Value::Bool(flag)) => i64::from(*flag),
        _ => 0,
    }
}

fn lenient_string(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(text)) => Some(text.clone()),
        Some(Value::Number(number)) => Some(number.to_string()),
        Some(Value::Bool(flag)) => Some(flag.to_string()),
        _ => None,
    }
}

/// Terminal presentation state of a like request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(LikeResult),
    AlreadyLiked(LikeResult),
    Failed(LikeResult),
    ServiceUnavailable { status: u16 },
    TransportError { detail: String },
}

impl Outcome {
    pub fn from_result(result: LikeResult) -> Self {
        match result.status_code {
            STATUS_SUCCESS => Self::Success(result),
            STATUS_ALREADY_LIKED => Self::AlreadyLiked(result),
            _ => Self::Failed(result),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::AlreadyLiked(_) => "already_liked",
            Self::Failed(_) => "failed",
            Self::ServiceUnavailable { .. } => "service_unavailable",
            Self::TransportError { .. } => "transport_error",
        }
    }
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn progress_bar(percentage: u8, width: usize) -> String {
    let percentage = usize::from(percentage.min(100));
    let filled = width * percentage / 100;
    let mut bar = String::with_capacity(width * 3);
    bar.extend(std::iter::repeat_n(PROGRESS_FILLED_GLYPH, filled));
    bar.extend(std::iter::repeat_n(PROGRESS_EMPTY_GLYPH, width - filled));
    bar
}

pub fn render_progress(caption: &str, percentage: u8, stage_index: usize) -> String {
    let marker = PROGRESS_MARKERS[stage_index % PROGRESS_MARKERS.len()];
    format!(
        "┏━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┓\n\
         ┃ ⚡ <b>RS LIKE · PROCESSING</b> ⚡ ┃\n\
         ┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┛\n\n\
         {caption}\n\n\
         📊 Progress: <b>{percentage}%</b> {marker}\n{bar}",
        bar = progress_bar(percentage, PROGRESS_BAR_WIDTH),
    )
}

pub fn render_success_preview(result: &LikeResult) -> String {
    format!(
        "┏━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┓\n\
         ┃   ⚡ LIKE · SUCCESSFUL   ┃\n\
         ┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┛\n\n\
         [📌 Preparing secure like successful]\n\n\
         📊 Progress: 100% ✅✅💎\n\n\
         [RS LIKE BOT GOT {} LIKE 😍]",
        result.likes_given
    )
}

fn banner(decoration: &str, title: &str) -> String {
    format!("╔══════{decoration}══════╗\n{title}\n╚══════{decoration}══════╝")
}

fn player_block(result: &LikeResult, request: &LikeRequest) -> String {
    format!(
        "🏆 PLAYER DETAILS\n╭──────────────────╮\n  \
         🪪 Name: {}\n  🆔 UID: {}\n  🌍 Region: {}\n\
         ╰──────────────────╯",
        escape_html(&result.player_nickname),
        escape_html(&result.resolved_player_id),
        escape_html(&request.region.to_uppercase()),
    )
}

fn like_block(heading: &str, sent: i64, before: i64, after: i64) -> String {
    format!(
        "💎 {heading}\n╭───────────╮\n  \
         🎯 Sent: {sent}\n  📊 Before: {before}\n  📈 After: {after}\n\
         ╰───────────╯"
    )
}

/// Renders the single terminal message for `outcome`.
pub fn render_outcome(outcome: &Outcome, request: &LikeRequest) -> String {
    match outcome {
        Outcome::Success(result) => format!(
            "{}\n\n{}\n\n{}\n\n🌟 STATUS: ✅ Success",
            banner("🌟👑🌟", "      ✨ RS LIKE SUCCESS ✨"),
            player_block(result, request),
            like_block(
                "LIKE DETAILS",
                result.likes_given,
                result.likes_before,
                result.likes_after
            ),
        ),
        Outcome::AlreadyLiked(result) => format!(
            "{}\n\n{}\n\n💎 LIKE STATUS\n╭───────────╮\n  \
             💖 Current Likes: {}\n  ⚡ VIP Credit restored\n╰───────────╯\n\n\
             ⏳ You can try again later",
            banner("⚠️💖⚠️", "     ALREADY LIKED"),
            player_block(result, request),
            result.likes_after,
        ),
        // A failed attempt never changes the count, so "after" repeats "before".
        Outcome::Failed(result) => format!(
            "{}\n\n{}\n\n{}\n\n⚠️ Reason: Invalid UID / Server error",
            banner("❌⚡❌", "       LIKE FAILED"),
            player_block(result, request),
            like_block("LIKE ATTEMPT", 0, result.likes_before, result.likes_before),
        ),
        Outcome::ServiceUnavailable { .. } => "🚨 API not responding.".to_string(),
        Outcome::TransportError { detail } => {
            format!("❌ Connection Error: <code>{}</code>", escape_html(detail))
        }
    }
}

pub fn usage_text() -> &'static str {
    "⚠️ Wrong usage!\n<code>/like &lt;region&gt; &lt;uid&gt;</code>"
}

pub fn welcome_text() -> &'static str {
    "👋 <b>Welcome to RS Like Bot</b>\n\
     Send likes: <code>/like &lt;region&gt; &lt;uid&gt;</code>\n\
     Example: <code>/like bd 123456789</code>\n\
     ✨ Only allowed in VIP group."
}

pub fn help_text() -> &'static str {
    "📖 <b>Help</b>\n\
     <code>/like &lt;region&gt; &lt;uid&gt;</code>: send likes.\n\
     <code>/status</code>: bot status.\n\
     <code>/photo</code>: show your profile photo.\n\
     <code>/setdefaultphoto</code>: reply to a photo to make it the default."
}
