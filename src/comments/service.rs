//! Comment listing and creation on top of a [`KvStore`].

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use chrono::{SubsecRound, Utc};
use futures_util::future::join_all;
use uuid::Uuid;

use crate::comments::model::{CommentPayload, StoredComment};
use crate::comments::store::{KvError, KvStore};
use crate::config::CommentsConfig;

const ANONYMOUS: &str = "Anonymous";
const MIN_AUTHOR_CHARS: usize = 2;

/// Everything the comment API can reject.
#[derive(Debug, thiserror::Error)]
pub enum CommentError {
    #[error("Missing \"postId\" query parameter.")]
    MissingPostId,

    #[error("Invalid JSON payload.")]
    InvalidJson,

    #[error("Both \"postId\" and \"content\" are required.")]
    MissingFields,

    #[error("Author name must contain at least 2 characters.")]
    AuthorTooShort,

    #[error("Comment content is too long.")]
    ContentTooLong,

    #[error("Request body too large.")]
    PayloadTooLarge,

    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("Comment storage unavailable.")]
    Storage(#[from] KvError),
}

impl CommentError {
    pub fn status(&self) -> StatusCode {
        match self {
            CommentError::MissingPostId | CommentError::InvalidJson | CommentError::MissingFields => {
                StatusCode::BAD_REQUEST
            }
            CommentError::AuthorTooShort | CommentError::ContentTooLong => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            CommentError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            CommentError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            CommentError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn prefix(post_id: &str) -> String {
    format!("comments:{post_id}:")
}

/// Key of the pre-per-comment format: one JSON array per post.
fn legacy_key(post_id: &str) -> String {
    format!("comments:{post_id}")
}

#[derive(Clone)]
pub struct CommentService {
    store: Arc<dyn KvStore>,
    ttl: Duration,
    max_content_chars: usize,
    list_limit: usize,
}

impl CommentService {
    pub fn new(store: Arc<dyn KvStore>, config: &CommentsConfig) -> Self {
        Self {
            store,
            ttl: Duration::from_secs(config.ttl_secs),
            max_content_chars: config.max_content_chars,
            list_limit: config.list_limit,
        }
    }

    /// Comments for a post, oldest first.
    pub async fn list(&self, post_id: &str) -> Result<Vec<StoredComment>, CommentError> {
        let keys = self.store.list(&prefix(post_id), self.list_limit).await?;
        let values = join_all(keys.iter().map(|key| self.store.get(key))).await;

        let mut comments = Vec::with_capacity(values.len());
        for (key, value) in keys.iter().zip(values) {
            let Some(raw) = value? else {
                // Expired between list and get
                continue;
            };
            match serde_json::from_str::<StoredComment>(&raw) {
                Ok(comment) => comments.push(comment),
                Err(e) => tracing::warn!(key = %key, error = %e, "Skipping unreadable comment"),
            }
        }

        if !comments.is_empty() {
            comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            return Ok(comments);
        }

        let legacy = self.store.get(&legacy_key(post_id)).await?;
        Ok(legacy
            .and_then(|raw| serde_json::from_str::<Vec<StoredComment>>(&raw).ok())
            .unwrap_or_default())
    }

    /// Validate and store a new comment.
    pub async fn create(&self, payload: CommentPayload) -> Result<StoredComment, CommentError> {
        let post_id = payload.post_id.as_deref().map(str::trim).unwrap_or_default();
        let content = payload.content.as_deref().map(str::trim).unwrap_or_default();
        if post_id.is_empty() || content.is_empty() {
            return Err(CommentError::MissingFields);
        }

        let author = match payload.author_text() {
            a if a.is_empty() => ANONYMOUS.to_string(),
            a if a.chars().count() < MIN_AUTHOR_CHARS => return Err(CommentError::AuthorTooShort),
            a => a,
        };
        if content.chars().count() > self.max_content_chars {
            return Err(CommentError::ContentTooLong);
        }

        let comment = StoredComment {
            id: Uuid::new_v4().to_string(),
            post_id: post_id.to_string(),
            author,
            content: content.to_string(),
            created_at: Utc::now().trunc_subsecs(3),
        };

        let value = serde_json::to_string(&comment).map_err(|e| KvError(e.to_string()))?;
        let key = format!("{}{}", prefix(post_id), comment.id);
        self.store.put(&key, value, Some(self.ttl)).await?;
        // The aggregated array would now be stale
        self.store.delete(&legacy_key(post_id)).await?;

        tracing::info!(post_id = %comment.post_id, comment_id = %comment.id, "Comment stored");
        Ok(comment)
    }
}
