//! Ownership and visibility rules for topics and their entries.
//!
//! An entry has no permissions of its own; callers pass the entry's parent
//! topic. Failed checks surface as [`AppError::NotFound`], never as a
//! forbidden response, so a non-owner cannot tell a private topic from a
//! missing one.

use uuid::Uuid;

use crate::{error::AppError, models::Topic};

/// True if the requester owns the topic or the topic is public.
pub fn can_view(topic: &Topic, requester: Option<Uuid>) -> bool {
    topic.public || is_owner(topic, requester)
}

/// True only for the owner. Anonymous requesters never qualify.
pub fn can_edit(topic: &Topic, requester: Option<Uuid>) -> bool {
    is_owner(topic, requester)
}

pub fn ensure_can_view(topic: &Topic, requester: Option<Uuid>) -> Result<(), AppError> {
    if can_view(topic, requester) {
        Ok(())
    } else {
        tracing::debug!(topic_id = topic.id, "view denied, reporting not found");
        Err(AppError::NotFound)
    }
}

pub fn ensure_can_edit(topic: &Topic, requester: Option<Uuid>) -> Result<(), AppError> {
    if can_edit(topic, requester) {
        Ok(())
    } else {
        tracing::warn!(topic_id = topic.id, "edit denied, reporting not found");
        Err(AppError::NotFound)
    }
}

fn is_owner(topic: &Topic, requester: Option<Uuid>) -> bool {
    requester == Some(topic.owner)
}
