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

use async_trait::async_trait;
use tokio::sync::RwLock;

/// Holder for the process-wide default photo reference.
///
/// Writes are last-writer-wins. A reader sees either the value before or
/// after a concurrent write, never a torn one.
#[async_trait]
pub trait PhotoStore: Send + Sync {
    async fn default_photo(&self) -> Option<String>;
    async fn set_default_photo(&self, photo: String);
}

#[derive(Default)]
pub struct InMemoryPhotoStore {
    default_photo: RwLock<Option<String>>,
}

impl InMemoryPhotoStore {
    pub fn new(initial: Option<String>) -> Self {
        Self {
            default_photo: RwLock::new(initial),
        }
    }
}

#[async_trait]
impl PhotoStore for InMemoryPhotoStore {
    async fn default_photo(&self) -> Option<String> {
        self.default_photo.read().await.clone()
    }

    async fn set_default_photo(&self, photo: String) {
        *self.default_photo.write().await = Some(photo);
    }
}
