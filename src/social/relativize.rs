//! Viewer-relative flags stamped onto user-shaped records.
//!
//! Everything here is derived from the viewer's id and following set and is
//! recomputed per request. Nothing produced by the store carries viewer state.

use std::collections::HashSet;

use crate::db::models::UserId;
use crate::store::{GraphStore, StoreError};

/// Display fields longer than this many characters are cut.
pub const DISPLAY_WIDTH: usize = 12;

pub const ELLIPSIS: char = '…';

pub const NO_NAME: &str = "noName";
pub const NO_ACCOUNT: &str = "noAccount";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Relation {
    /// The viewer follows the candidate
    pub is_followed: bool,
    /// The candidate is the viewer
    pub is_self: bool,
}

/// The requester's identity plus the ids they follow, loaded once per request.
#[derive(Debug, Clone)]
pub struct ViewerContext {
    id: UserId,
    following: HashSet<UserId>,
}

impl ViewerContext {
    pub fn new(id: UserId, following: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            id,
            following: following.into_iter().collect(),
        }
    }

    pub async fn load(store: &dyn GraphStore, id: UserId) -> Result<Self, StoreError> {
        let following = store.following_ids(id).await?;
        Ok(Self::new(id, following))
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn relation(&self, candidate: UserId) -> Relation {
        Relation {
            is_followed: self.following.contains(&candidate),
            is_self: candidate == self.id,
        }
    }

    pub fn has_liked(&self, likers: &[UserId]) -> bool {
        likers.contains(&self.id)
    }
}

/// Cut `value` to [`DISPLAY_WIDTH`] characters, marking the cut with [`ELLIPSIS`].
pub fn truncate_display(value: &str) -> String {
    let mut chars = value.chars();
    let head: String = chars.by_ref().take(DISPLAY_WIDTH).collect();
    if chars.next().is_some() {
        format!("{head}{ELLIPSIS}")
    } else {
        head
    }
}

/// Truncated display text, or `placeholder` when the value is absent or empty.
pub fn display_label(value: Option<&str>, placeholder: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => truncate_display(v),
        _ => placeholder.to_string(),
    }
}
