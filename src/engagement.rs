use std::collections::{HashMap, HashSet};

use actix_web::{web, HttpRequest, HttpResponse, Responder};
use futures_util::StreamExt;
use log::error;
use mongodb::bson::{doc, oid::ObjectId, to_bson, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::auth::current_user;
use crate::models::{Comment, Lecture, LectureNote, User};

#[derive(Debug, Deserialize)]
pub struct NoteRequest {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub content: String,
}

/// Author info embedded into comment responses in place of the bare user id.
#[derive(Debug, Clone, Serialize)]
pub struct CommentAuthor {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    #[serde(rename = "photo_url")]
    pub photo_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyView {
    pub user: Option<CommentAuthor>,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    #[serde(rename = "_id")]
    pub id: String,
    pub lecture_id: String,
    pub user: Option<CommentAuthor>,
    pub content: String,
    pub likes: Vec<String>,
    pub replies: Vec<ReplyView>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

fn comment_view(comment: Comment, authors: &HashMap<ObjectId, CommentAuthor>) -> CommentView {
    CommentView {
        id: comment.id.map(|id| id.to_hex()).unwrap_or_default(),
        lecture_id: comment.lecture_id.to_hex(),
        user: authors.get(&comment.user_id).cloned(),
        content: comment.content,
        likes: comment.likes.iter().map(|id| id.to_hex()).collect(),
        replies: comment
            .replies
            .into_iter()
            .map(|reply| ReplyView {
                user: authors.get(&reply.user_id).cloned(),
                content: reply.content,
                created_at: reply.created_at.to_chrono(),
            })
            .collect(),
        created_at: comment.created_at.to_chrono(),
    }
}

async fn load_authors(
    data: &web::Data<AppState>,
    ids: HashSet<ObjectId>,
) -> Result<HashMap<ObjectId, CommentAuthor>, mongodb::error::Error> {
    let mut authors = HashMap::new();
    if ids.is_empty() {
        return Ok(authors);
    }

    let users_coll = data.mongodb.db.collection::<User>("users");
    let ids: Vec<ObjectId> = ids.into_iter().collect();
    let mut cursor = users_coll.find(doc! { "_id": { "$in": ids } }).await?;
    while let Some(user) = cursor.next().await {
        let user = user?;
        if let Some(id) = user.id {
            authors.insert(
                id,
                CommentAuthor {
                    id: id.to_hex(),
                    full_name: user.full_name,
                    photo_url: user.photo_url,
                },
            );
        }
    }
    Ok(authors)
}

/// POST /lectures/{id}/like
/// Toggles the caller's like on both the lecture and their own liked list.
pub async fn like_lecture(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let user = match current_user(&req) {
        Some(user) => user,
        None => {
            return HttpResponse::Unauthorized()
                .json(serde_json::json!({ "success": false, "message": "Unauthorized" }));
        }
    };
    let user_oid = match ObjectId::parse_str(&user.id) {
        Ok(oid) => oid,
        Err(_) => {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({ "success": false, "message": "Invalid user id" }));
        }
    };
    let lecture_id = match ObjectId::parse_str(path.as_str()) {
        Ok(oid) => oid,
        Err(_) => {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({ "success": false, "message": "Invalid Lecture ID" }));
        }
    };

    let lectures_coll = data.mongodb.db.collection::<Lecture>("lectures");
    let lecture = match lectures_coll.find_one(doc! { "_id": lecture_id }).await {
        Ok(Some(lecture)) => lecture,
        Ok(None) => {
            return HttpResponse::NotFound()
                .json(serde_json::json!({ "success": false, "message": "Lecture not found" }));
        }
        Err(e) => {
            error!("Error fetching lecture: {}", e);
            return HttpResponse::InternalServerError()
                .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }));
        }
    };

    let has_liked = lecture.likes.contains(&user_oid);
    let (lecture_update, user_update) = if has_liked {
        (
            doc! { "$pull": { "likes": user_oid } },
            doc! { "$pull": { "likedLectures": lecture_id } },
        )
    } else {
        (
            doc! { "$addToSet": { "likes": user_oid } },
            doc! { "$addToSet": { "likedLectures": lecture_id } },
        )
    };

    if let Err(e) = lectures_coll
        .update_one(doc! { "_id": lecture_id }, lecture_update)
        .await
    {
        error!("Error updating lecture likes: {}", e);
        return HttpResponse::InternalServerError()
            .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }));
    }

    let users_coll = data.mongodb.db.collection::<User>("users");
    if let Err(e) = users_coll
        .update_one(doc! { "_id": user_oid }, user_update)
        .await
    {
        error!("Error updating liked lectures: {}", e);
        return HttpResponse::InternalServerError()
            .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }));
    }

    let likes_count = if has_liked {
        lecture.likes.len().saturating_sub(1)
    } else {
        lecture.likes.len() + 1
    };

    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "liked": !has_liked,
        "likesCount": likes_count,
    }))
}

/// POST /lectures/{id}/notes
/// One note per lecture per user; an existing note is rewritten in place.
pub async fn save_note(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
    info: web::Json<NoteRequest>,
) -> impl Responder {
    let user = match current_user(&req) {
        Some(user) => user,
        None => {
            return HttpResponse::Unauthorized()
                .json(serde_json::json!({ "success": false, "message": "Unauthorized" }));
        }
    };
    let user_oid = match ObjectId::parse_str(&user.id) {
        Ok(oid) => oid,
        Err(_) => {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({ "success": false, "message": "Invalid user id" }));
        }
    };
    let lecture_id = match ObjectId::parse_str(path.as_str()) {
        Ok(oid) => oid,
        Err(_) => {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({ "success": false, "message": "Invalid Lecture ID" }));
        }
    };

    let note = LectureNote {
        lecture_id,
        content: info.content.clone(),
        timestamp: BsonDateTime::now(),
    };

    let users_coll = data.mongodb.db.collection::<User>("users");
    let updated = users_coll
        .update_one(
            doc! { "_id": user_oid, "notes.lectureId": lecture_id },
            doc! { "$set": {
                "notes.$.content": &note.content,
                "notes.$.timestamp": note.timestamp,
            } },
        )
        .await;

    match updated {
        Ok(res) if res.matched_count == 0 => {
            let note_bson = match to_bson(&note) {
                Ok(bson) => bson,
                Err(e) => {
                    error!("Error serializing note: {}", e);
                    return HttpResponse::InternalServerError().json(
                        serde_json::json!({ "success": false, "message": "Internal Server Error" }),
                    );
                }
            };
            if let Err(e) = users_coll
                .update_one(doc! { "_id": user_oid }, doc! { "$push": { "notes": note_bson } })
                .await
            {
                error!("Error saving note: {}", e);
                return HttpResponse::InternalServerError().json(
                    serde_json::json!({ "success": false, "message": "Internal Server Error" }),
                );
            }
        }
        Ok(_) => {}
        Err(e) => {
            error!("Error saving note: {}", e);
            return HttpResponse::InternalServerError()
                .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }));
        }
    }

    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Notes saved successfully",
        "note": {
            "lectureId": lecture_id.to_hex(),
            "content": note.content,
            "timestamp": note.timestamp.to_chrono(),
        }
    }))
}

/// GET /lectures/{id}/notes
pub async fn get_note(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let user = match current_user(&req) {
        Some(user) => user,
        None => {
            return HttpResponse::Unauthorized()
                .json(serde_json::json!({ "success": false, "message": "Unauthorized" }));
        }
    };
    let user_oid = match ObjectId::parse_str(&user.id) {
        Ok(oid) => oid,
        Err(_) => {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({ "success": false, "message": "Invalid user id" }));
        }
    };
    let lecture_id = match ObjectId::parse_str(path.as_str()) {
        Ok(oid) => oid,
        Err(_) => {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({ "success": false, "message": "Invalid Lecture ID" }));
        }
    };

    let users_coll = data.mongodb.db.collection::<User>("users");
    let db_user = match users_coll.find_one(doc! { "_id": user_oid }).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return HttpResponse::NotFound()
                .json(serde_json::json!({ "success": false, "message": "User not found" }));
        }
        Err(e) => {
            error!("Error fetching user: {}", e);
            return HttpResponse::InternalServerError()
                .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }));
        }
    };

    let note = db_user
        .notes
        .iter()
        .find(|note| note.lecture_id == lecture_id)
        .map(|note| {
            serde_json::json!({
                "lectureId": note.lecture_id.to_hex(),
                "content": note.content,
                "timestamp": note.timestamp.to_chrono(),
            })
        });

    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "note": note,
    }))
}

/// POST /lectures/{id}/comments
pub async fn add_comment(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
    info: web::Json<CommentRequest>,
) -> impl Responder {
    let user = match current_user(&req) {
        Some(user) => user,
        None => {
            return HttpResponse::Unauthorized()
                .json(serde_json::json!({ "success": false, "message": "Unauthorized" }));
        }
    };
    let user_oid = match ObjectId::parse_str(&user.id) {
        Ok(oid) => oid,
        Err(_) => {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({ "success": false, "message": "Invalid user id" }));
        }
    };
    let lecture_id = match ObjectId::parse_str(path.as_str()) {
        Ok(oid) => oid,
        Err(_) => {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({ "success": false, "message": "Invalid Lecture ID" }));
        }
    };

    let content = info.content.trim();
    if content.is_empty() {
        return HttpResponse::BadRequest().json(
            serde_json::json!({ "success": false, "message": "Comment content is required" }),
        );
    }

    let new_comment = Comment {
        id: Some(ObjectId::new()),
        lecture_id,
        user_id: user_oid,
        content: content.to_string(),
        likes: vec![],
        replies: vec![],
        created_at: BsonDateTime::now(),
        updated_at: BsonDateTime::now(),
    };

    let comments_coll = data.mongodb.db.collection::<Comment>("comments");
    if let Err(e) = comments_coll.insert_one(&new_comment).await {
        error!("Error adding comment: {}", e);
        return HttpResponse::InternalServerError()
            .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }));
    }

    let authors = match load_authors(&data, HashSet::from([user_oid])).await {
        Ok(authors) => authors,
        Err(e) => {
            error!("Error loading comment author: {}", e);
            return HttpResponse::InternalServerError()
                .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }));
        }
    };

    HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "message": "Comment added successfully",
        "comment": comment_view(new_comment, &authors),
    }))
}

/// GET /lectures/{id}/comments
/// Newest first, with comment and reply authors populated.
pub async fn get_comments(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let lecture_id = match ObjectId::parse_str(path.as_str()) {
        Ok(oid) => oid,
        Err(_) => {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({ "success": false, "message": "Invalid Lecture ID" }));
        }
    };

    let comments_coll = data.mongodb.db.collection::<Comment>("comments");
    let mut cursor = match comments_coll
        .find(doc! { "lectureId": lecture_id })
        .sort(doc! { "createdAt": -1 })
        .await
    {
        Ok(cursor) => cursor,
        Err(e) => {
            error!("Error fetching comments: {}", e);
            return HttpResponse::InternalServerError()
                .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }));
        }
    };

    let mut comments = Vec::new();
    while let Some(comment_res) = cursor.next().await {
        match comment_res {
            Ok(comment) => comments.push(comment),
            Err(e) => {
                error!("Error reading comments cursor: {}", e);
                return HttpResponse::InternalServerError().json(
                    serde_json::json!({ "success": false, "message": "Internal Server Error" }),
                );
            }
        }
    }

    let mut author_ids = HashSet::new();
    for comment in &comments {
        author_ids.insert(comment.user_id);
        for reply in &comment.replies {
            author_ids.insert(reply.user_id);
        }
    }

    let authors = match load_authors(&data, author_ids).await {
        Ok(authors) => authors,
        Err(e) => {
            error!("Error loading comment authors: {}", e);
            return HttpResponse::InternalServerError()
                .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }));
        }
    };

    let views: Vec<CommentView> = comments
        .into_iter()
        .map(|comment| comment_view(comment, &authors))
        .collect();

    HttpResponse::Ok().json(serde_json::json!({ "success": true, "comments": views }))
}

/// DELETE /comments/{id}
/// Only the comment's author may delete it.
pub async fn delete_comment(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let user = match current_user(&req) {
        Some(user) => user,
        None => {
            return HttpResponse::Unauthorized()
                .json(serde_json::json!({ "success": false, "message": "Unauthorized" }));
        }
    };
    let comment_id = match ObjectId::parse_str(path.as_str()) {
        Ok(oid) => oid,
        Err(_) => {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({ "success": false, "message": "Invalid Comment ID" }));
        }
    };

    let comments_coll = data.mongodb.db.collection::<Comment>("comments");
    let comment = match comments_coll.find_one(doc! { "_id": comment_id }).await {
        Ok(Some(comment)) => comment,
        Ok(None) => {
            return HttpResponse::NotFound()
                .json(serde_json::json!({ "success": false, "message": "Comment not found" }));
        }
        Err(e) => {
            error!("Error fetching comment: {}", e);
            return HttpResponse::InternalServerError()
                .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }));
        }
    };

    if comment.user_id.to_hex() != user.id {
        return HttpResponse::Forbidden()
            .json(serde_json::json!({ "success": false, "message": "Unauthorized" }));
    }

    match comments_coll.delete_one(doc! { "_id": comment_id }).await {
        Ok(_) => HttpResponse::Ok()
            .json(serde_json::json!({ "success": true, "message": "Comment deleted successfully" })),
        Err(e) => {
            error!("Error deleting comment: {}", e);
            HttpResponse::InternalServerError()
                .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }))
        }
    }
}
