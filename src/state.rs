//! Session state -- the user-interaction flags shared across the app.
//!
//! Holds the selected locality filter plus the liked posts, RSVP statuses,
//! joined groups and followed users of the current user. All changes flow
//! through [`SessionCommand`] -> [`SessionEvent`] -> [`Aggregate::apply`].

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::locality::LocalityFilter;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// A user's attendance intent for an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RsvpStatus {
    Going,
    Maybe,
    /// No intent recorded. Also what absent entries read as.
    #[default]
    None,
}

/// The full application session state.
///
/// Every field is required when deserializing: a record missing any field
/// is rejected rather than partially filled in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// The active locality filter (`"all"` on the wire when unfiltered).
    pub selected_locality: LocalityFilter,
    pub liked_post_ids: BTreeSet<String>,
    /// At most one status per event id.
    pub rsvp_status_by_event_id: BTreeMap<String, RsvpStatus>,
    pub joined_group_ids: BTreeSet<String>,
    pub followed_user_ids: BTreeSet<String>,
}

impl SessionState {
    pub fn is_post_liked(&self, post_id: &str) -> bool {
        self.liked_post_ids.contains(post_id)
    }

    /// RSVP status for `event_id`, [`RsvpStatus::None`] when never set.
    pub fn rsvp_status(&self, event_id: &str) -> RsvpStatus {
        self.rsvp_status_by_event_id
            .get(event_id)
            .copied()
            .unwrap_or_default()
    }

    pub fn is_group_joined(&self, group_id: &str) -> bool {
        self.joined_group_ids.contains(group_id)
    }

    pub fn is_following(&self, user_id: &str) -> bool {
        self.followed_user_ids.contains(user_id)
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Commands accepted by [`SessionState`], one per UI interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SessionCommand {
    /// Pick a locality filter. `"all"` clears the filter.
    SelectLocality { locality: String },
    /// Like the post if not liked, unlike it otherwise.
    ToggleLikedPost { post_id: String },
    /// Overwrite the RSVP status for an event.
    SetRsvpStatus { event_id: String, status: RsvpStatus },
    /// Join the group if not a member, leave it otherwise.
    ToggleJoinedGroup { group_id: String },
    /// Follow the user if not followed, unfollow otherwise.
    ToggleFollowedUser { user_id: String },
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Domain events produced by [`SessionState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SessionEvent {
    LocalitySelected { locality: LocalityFilter },
    PostLiked { post_id: String },
    PostUnliked { post_id: String },
    RsvpSet { event_id: String, status: RsvpStatus },
    GroupJoined { group_id: String },
    GroupLeft { group_id: String },
    UserFollowed { user_id: String },
    UserUnfollowed { user_id: String },
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from [`SessionCommand`] handling.
///
/// Currently empty -- every session command is unconditionally valid.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {}

// ---------------------------------------------------------------------------
// Aggregate impl
// ---------------------------------------------------------------------------

impl Aggregate for SessionState {
    const RECORD_KEY: &'static str = "appState";
    type Command = SessionCommand;
    type DomainEvent = SessionEvent;
    type Error = SessionError;

    fn handle(&self, cmd: SessionCommand) -> Result<Vec<SessionEvent>, SessionError> {
        let event = match cmd {
            SessionCommand::SelectLocality { locality } => SessionEvent::LocalitySelected {
                locality: LocalityFilter::from(locality),
            },
            SessionCommand::ToggleLikedPost { post_id } => {
                if self.is_post_liked(&post_id) {
                    SessionEvent::PostUnliked { post_id }
                } else {
                    SessionEvent::PostLiked { post_id }
                }
            }
            SessionCommand::SetRsvpStatus { event_id, status } => {
                SessionEvent::RsvpSet { event_id, status }
            }
            SessionCommand::ToggleJoinedGroup { group_id } => {
                if self.is_group_joined(&group_id) {
                    SessionEvent::GroupLeft { group_id }
                } else {
                    SessionEvent::GroupJoined { group_id }
                }
            }
            SessionCommand::ToggleFollowedUser { user_id } => {
                if self.is_following(&user_id) {
                    SessionEvent::UserUnfollowed { user_id }
                } else {
                    SessionEvent::UserFollowed { user_id }
                }
            }
        };
        Ok(vec![event])
    }

    fn apply(mut self, event: &SessionEvent) -> Self {
        match event {
            SessionEvent::LocalitySelected { locality } => {
                self.selected_locality = locality.clone();
            }
            SessionEvent::PostLiked { post_id } => {
                self.liked_post_ids.insert(post_id.clone());
            }
            SessionEvent::PostUnliked { post_id } => {
                self.liked_post_ids.remove(post_id);
            }
            SessionEvent::RsvpSet { event_id, status } => {
                self.rsvp_status_by_event_id.insert(event_id.clone(), *status);
            }
            SessionEvent::GroupJoined { group_id } => {
                self.joined_group_ids.insert(group_id.clone());
            }
            SessionEvent::GroupLeft { group_id } => {
                self.joined_group_ids.remove(group_id);
            }
            SessionEvent::UserFollowed { user_id } => {
                self.followed_user_ids.insert(user_id.clone());
            }
            SessionEvent::UserUnfollowed { user_id } => {
                self.followed_user_ids.remove(user_id);
            }
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
