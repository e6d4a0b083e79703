use mongodb::bson::oid::ObjectId;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

/// Difficulty level of a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CourseLevel {
    Beginner,
    Medium,
    Advanced,
}

/// A course document as stored in the `courses` collection.
///
/// `lectures` keeps insertion order; a lecture's `order` field mirrors its
/// position here at the time it was added.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<CourseLevel>,
    /// Absent means the course is free.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub enrolled_students: Vec<ObjectId>,
    #[serde(default)]
    pub lectures: Vec<ObjectId>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_serializes_as_spelled() {
        assert_eq!(serde_json::to_string(&CourseLevel::Beginner).unwrap(), "\"Beginner\"");
        assert_eq!(serde_json::to_string(&CourseLevel::Medium).unwrap(), "\"Medium\"");
        assert_eq!(serde_json::to_string(&CourseLevel::Advanced).unwrap(), "\"Advanced\"");
    }

    #[test]
    fn misspelled_level_is_rejected() {
        assert!(serde_json::from_str::<CourseLevel>("\"Begginer\"").is_err());
    }
}
