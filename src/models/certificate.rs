use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// A completion certificate, written once when first requested and returned
/// verbatim on later requests, so `certificate_id` stays stable.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub certificate_id: String,
    pub user_id: ObjectId,
    pub course_id: ObjectId,
    pub student_name: String,
    pub student_email: String,
    pub course_name: String,
    pub course_category: String,
    /// Display form, e.g. "August 7, 2026".
    pub completion_date: String,
    pub issue_date: DateTime<Utc>,
    pub total_lectures: u32,
}
