use mongodb::bson::oid::ObjectId;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

/// Account roles. Students enroll and learn; admins manage the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Admin,
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Student
    }
}

/// A user document as stored in the `users` collection.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub full_name: String,
    pub email: String,
    /// bcrypt hash, never exposed through the API.
    pub password: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub enrolled_courses: Vec<ObjectId>,
    #[serde(default)]
    pub completed_lectures: Vec<ObjectId>,
    #[serde(default)]
    pub liked_lectures: Vec<ObjectId>,
    #[serde(rename = "photo_url", default)]
    pub photo_url: String,
    #[serde(default)]
    pub notes: Vec<LectureNote>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// A free-text note a user keeps against one lecture. One note per lecture per user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LectureNote {
    pub lecture_id: ObjectId,
    pub content: String,
    pub timestamp: DateTime,
}

/// The user document as returned by the API: everything but the password hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub role: UserRole,
    pub enrolled_courses: Vec<String>,
    pub completed_lectures: Vec<String>,
    pub liked_lectures: Vec<String>,
    #[serde(rename = "photo_url")]
    pub photo_url: String,
    pub notes: Vec<LectureNote>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        UserProfile {
            id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
            full_name: user.full_name,
            email: user.email,
            role: user.role,
            enrolled_courses: user.enrolled_courses.iter().map(|id| id.to_hex()).collect(),
            completed_lectures: user.completed_lectures.iter().map(|id| id.to_hex()).collect(),
            liked_lectures: user.liked_lectures.iter().map(|id| id.to_hex()).collect(),
            photo_url: user.photo_url,
            notes: user.notes,
            created_at: user.created_at.to_chrono(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Some(ObjectId::new()),
            full_name: "Alice".to_string(),
            email: "a@x.com".to_string(),
            password: "$2b$12$secret".to_string(),
            role: UserRole::Student,
            enrolled_courses: vec![],
            completed_lectures: vec![],
            liked_lectures: vec![],
            photo_url: String::new(),
            notes: vec![],
            created_at: DateTime::now(),
            updated_at: DateTime::now(),
        }
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&UserRole::Student).unwrap(), "\"student\"");
        assert_eq!(serde_json::to_string(&UserRole::Admin).unwrap(), "\"admin\"");
    }

    #[test]
    fn profile_strips_password() {
        let profile: UserProfile = sample_user().into();
        let json = serde_json::to_value(&profile).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["fullName"], "Alice");
        assert_eq!(json["role"], "student");
    }
}
