use mongodb::bson::oid::ObjectId;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

/// A supplementary resource attached to a lecture (slides, source code, links).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LectureResource {
    pub title: String,
    pub url: String,
    #[serde(rename = "type")]
    pub resource_type: String,
}

/// A lecture document as stored in the `lectures` collection.
///
/// Videos are external embeds; `video_url` is the iframe target, nothing is
/// hosted or transcoded here.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lecture {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub lecture_title: String,
    pub video_url: String,
    #[serde(default)]
    pub description: String,
    /// Free text ("12:30", "1h"), not a parsed duration.
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub is_preview_free: bool,
    pub course_id: ObjectId,
    #[serde(default)]
    pub resources: Vec<LectureResource>,
    #[serde(default)]
    pub likes: Vec<ObjectId>,
    /// Position within the owning course at insertion time.
    #[serde(default)]
    pub order: u32,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_type_uses_type_key() {
        let resource = LectureResource {
            title: "Slides".to_string(),
            url: "https://example.com/slides.pdf".to_string(),
            resource_type: "pdf".to_string(),
        };
        let json = serde_json::to_value(&resource).unwrap();
        assert_eq!(json["type"], "pdf");
        assert!(json.get("resource_type").is_none());
    }
}
