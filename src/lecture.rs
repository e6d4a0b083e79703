use actix_web::{web, HttpRequest, HttpResponse, Responder};
use log::{error, info};
use mongodb::bson::{doc, oid::ObjectId, to_bson, DateTime as BsonDateTime};
use serde::Deserialize;

use crate::app_state::AppState;
use crate::auth::current_user;
use crate::models::{Course, Lecture, LectureResource, UserRole};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLectureRequest {
    #[serde(default)]
    pub lecture_title: String,
    #[serde(default)]
    pub video_url: String,
    pub description: Option<String>,
    pub duration: Option<String>,
    pub is_preview_free: Option<bool>,
    pub resources: Option<Vec<LectureResource>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLectureRequest {
    pub lecture_title: Option<String>,
    pub video_url: Option<String>,
    pub description: Option<String>,
    pub duration: Option<String>,
    pub is_preview_free: Option<bool>,
    pub resources: Option<Vec<LectureResource>>,
}

/// POST /add-lecture/{id}
/// Appends a lecture to a course; `order` records the position at insertion.
pub async fn add_lecture(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
    info: web::Json<AddLectureRequest>,
) -> impl Responder {
    let user = match current_user(&req) {
        Some(user) => user,
        None => {
            return HttpResponse::Unauthorized()
                .json(serde_json::json!({ "success": false, "message": "Unauthorized" }));
        }
    };
    if user.role != UserRole::Admin {
        return HttpResponse::Forbidden()
            .json(serde_json::json!({ "success": false, "message": "Access denied" }));
    }

    if info.lecture_title.trim().is_empty() || info.video_url.trim().is_empty() {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "message": "Lecture title and video URL are required"
        }));
    }

    let course_id = match ObjectId::parse_str(path.as_str()) {
        Ok(oid) => oid,
        Err(_) => {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({ "success": false, "message": "Invalid Course ID" }));
        }
    };

    let courses_coll = data.mongodb.db.collection::<Course>("courses");
    let course = match courses_coll.find_one(doc! { "_id": course_id }).await {
        Ok(Some(course)) => course,
        Ok(None) => {
            return HttpResponse::NotFound()
                .json(serde_json::json!({ "success": false, "message": "Course not found" }));
        }
        Err(e) => {
            error!("Error fetching course: {}", e);
            return HttpResponse::InternalServerError()
                .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }));
        }
    };

    let info = info.into_inner();
    let new_lecture = Lecture {
        id: Some(ObjectId::new()),
        lecture_title: info.lecture_title.trim().to_string(),
        video_url: info.video_url.trim().to_string(),
        description: info.description.unwrap_or_default(),
        duration: info.duration.unwrap_or_default(),
        is_preview_free: info.is_preview_free.unwrap_or(false),
        course_id,
        resources: info.resources.unwrap_or_default(),
        likes: vec![],
        order: course.lectures.len() as u32,
        created_at: BsonDateTime::now(),
        updated_at: BsonDateTime::now(),
    };

    let lectures_coll = data.mongodb.db.collection::<Lecture>("lectures");
    if let Err(e) = lectures_coll.insert_one(&new_lecture).await {
        error!("Error inserting lecture: {}", e);
        return HttpResponse::InternalServerError()
            .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }));
    }

    if let Err(e) = courses_coll
        .update_one(
            doc! { "_id": course_id },
            doc! { "$push": { "lectures": new_lecture.id } },
        )
        .await
    {
        error!("Error linking lecture to course: {}", e);
        return HttpResponse::InternalServerError()
            .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }));
    }

    info!("Lecture added to course {}: {:?}", course_id, new_lecture.id);
    HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "message": "Lecture created successfully",
        "lecture": new_lecture,
    }))
}

/// GET /lectures/{id}
pub async fn get_lecture(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let lecture_id = match ObjectId::parse_str(path.as_str()) {
        Ok(oid) => oid,
        Err(_) => {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({ "success": false, "message": "Invalid Lecture ID" }));
        }
    };

    let lectures_coll = data.mongodb.db.collection::<Lecture>("lectures");
    match lectures_coll.find_one(doc! { "_id": lecture_id }).await {
        Ok(Some(lecture)) => {
            HttpResponse::Ok().json(serde_json::json!({ "success": true, "lecture": lecture }))
        }
        Ok(None) => HttpResponse::NotFound()
            .json(serde_json::json!({ "success": false, "message": "Lecture not found" })),
        Err(e) => {
            error!("Error fetching lecture: {}", e);
            HttpResponse::InternalServerError()
                .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }))
        }
    }
}

/// PUT /lectures/{id}
pub async fn update_lecture(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
    info: web::Json<UpdateLectureRequest>,
) -> impl Responder {
    let user = match current_user(&req) {
        Some(user) => user,
        None => {
            return HttpResponse::Unauthorized()
                .json(serde_json::json!({ "success": false, "message": "Unauthorized" }));
        }
    };
    if user.role != UserRole::Admin {
        return HttpResponse::Forbidden()
            .json(serde_json::json!({ "success": false, "message": "Access denied" }));
    }

    let lecture_id = match ObjectId::parse_str(path.as_str()) {
        Ok(oid) => oid,
        Err(_) => {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({ "success": false, "message": "Invalid Lecture ID" }));
        }
    };

    let mut set_doc = doc! {};
    if let Some(lecture_title) = &info.lecture_title {
        set_doc.insert("lectureTitle", lecture_title);
    }
    if let Some(video_url) = &info.video_url {
        set_doc.insert("videoUrl", video_url);
    }
    if let Some(description) = &info.description {
        set_doc.insert("description", description);
    }
    if let Some(duration) = &info.duration {
        set_doc.insert("duration", duration);
    }
    if let Some(is_preview_free) = info.is_preview_free {
        set_doc.insert("isPreviewFree", is_preview_free);
    }
    if let Some(resources) = &info.resources {
        match to_bson(resources) {
            Ok(resources) => {
                set_doc.insert("resources", resources);
            }
            Err(e) => {
                error!("Error serializing resources: {}", e);
                return HttpResponse::InternalServerError().json(
                    serde_json::json!({ "success": false, "message": "Internal Server Error" }),
                );
            }
        }
    }
    if set_doc.is_empty() {
        return HttpResponse::BadRequest()
            .json(serde_json::json!({ "success": false, "message": "No fields to update" }));
    }
    set_doc.insert("updatedAt", BsonDateTime::now());

    let lectures_coll = data.mongodb.db.collection::<Lecture>("lectures");
    match lectures_coll
        .update_one(doc! { "_id": lecture_id }, doc! { "$set": set_doc })
        .await
    {
        Ok(res) if res.matched_count == 0 => {
            return HttpResponse::NotFound()
                .json(serde_json::json!({ "success": false, "message": "Lecture not found" }));
        }
        Ok(_) => {}
        Err(e) => {
            error!("Error updating lecture: {}", e);
            return HttpResponse::InternalServerError()
                .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }));
        }
    }

    match lectures_coll.find_one(doc! { "_id": lecture_id }).await {
        Ok(Some(updated)) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Lecture updated successfully",
            "lecture": updated,
        })),
        Ok(None) => HttpResponse::NotFound()
            .json(serde_json::json!({ "success": false, "message": "Lecture not found" })),
        Err(e) => {
            error!("Error fetching updated lecture: {}", e);
            HttpResponse::InternalServerError()
                .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }))
        }
    }
}
