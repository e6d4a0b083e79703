use mongodb::bson::oid::ObjectId;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

/// An inline reply stored inside its parent comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentReply {
    pub user_id: ObjectId,
    pub content: String,
    pub created_at: DateTime,
}

/// A comment on a lecture, stored in the `comments` collection.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub lecture_id: ObjectId,
    pub user_id: ObjectId,
    pub content: String,
    #[serde(default)]
    pub likes: Vec<ObjectId>,
    #[serde(default)]
    pub replies: Vec<CommentReply>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}
