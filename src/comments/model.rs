use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// A comment as persisted under `comments:<postId>:<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredComment {
    pub id: String,
    pub post_id: String,
    pub author: String,
    pub content: String,
    #[serde(serialize_with = "rfc3339_millis")]
    pub created_at: DateTime<Utc>,
}

/// Always `YYYY-MM-DDTHH:MM:SS.sssZ`, even when the fraction is zero.
fn rfc3339_millis<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Body of a comment submission. Fields are validated after parsing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPayload {
    pub post_id: Option<String>,
    /// Any JSON value; non-strings are rendered to text.
    pub author: Option<serde_json::Value>,
    pub content: Option<String>,
}

impl CommentPayload {
    /// Trimmed author text, empty when absent.
    pub fn author_text(&self) -> String {
        match &self.author {
            None | Some(serde_json::Value::Null) => String::new(),
            Some(serde_json::Value::String(s)) => s.trim().to_string(),
            Some(other) => other.to_string().trim().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentList<'a> {
    pub post_id: &'a str,
    pub comments: &'a [StoredComment],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentCreated<'a> {
    pub post_id: &'a str,
    pub comment: &'a StoredComment,
}
