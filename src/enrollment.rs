use actix_web::{web, HttpRequest, HttpResponse, Responder};
use log::{error, info};
use mongodb::bson::{doc, oid::ObjectId};
use serde::Deserialize;

use crate::app_state::AppState;
use crate::auth::current_user;
use crate::models::{Course, User};
use crate::progress::course_progress;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollRequest {
    #[serde(default)]
    pub course_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteLectureRequest {
    #[serde(default)]
    pub lecture_id: String,
    #[serde(default)]
    pub course_id: String,
}

/// POST /enroll-course
///
/// The course side is a single conditional update, so two concurrent enrolls
/// cannot both append the same student.
pub async fn enroll_course(
    req: HttpRequest,
    data: web::Data<AppState>,
    info: web::Json<EnrollRequest>,
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
    let course_id = match ObjectId::parse_str(&info.course_id) {
        Ok(oid) => oid,
        Err(_) => {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({ "success": false, "message": "Invalid Course ID" }));
        }
    };

    let courses_coll = data.mongodb.db.collection::<Course>("courses");
    let enrolled = courses_coll
        .update_one(
            doc! { "_id": course_id, "enrolledStudents": { "$ne": user_oid } },
            doc! { "$addToSet": { "enrolledStudents": user_oid } },
        )
        .await;

    match enrolled {
        Ok(res) if res.matched_count == 0 => {
            // Either the course does not exist or the student is already on it.
            match courses_coll.find_one(doc! { "_id": course_id }).await {
                Ok(Some(_)) => {
                    return HttpResponse::BadRequest().json(serde_json::json!({
                        "success": false,
                        "message": "Already enrolled in this course"
                    }));
                }
                Ok(None) => {
                    return HttpResponse::NotFound().json(
                        serde_json::json!({ "success": false, "message": "Course not found" }),
                    );
                }
                Err(e) => {
                    error!("Error checking course: {}", e);
                    return HttpResponse::InternalServerError().json(
                        serde_json::json!({ "success": false, "message": "Enrollment failed" }),
                    );
                }
            }
        }
        Ok(_) => {}
        Err(e) => {
            error!("Error enrolling in course: {}", e);
            return HttpResponse::InternalServerError()
                .json(serde_json::json!({ "success": false, "message": "Enrollment failed" }));
        }
    }

    let users_coll = data.mongodb.db.collection::<User>("users");
    if let Err(e) = users_coll
        .update_one(
            doc! { "_id": user_oid },
            doc! { "$addToSet": { "enrolledCourses": course_id } },
        )
        .await
    {
        error!("Error mirroring enrollment onto user: {}", e);
        return HttpResponse::InternalServerError()
            .json(serde_json::json!({ "success": false, "message": "Enrollment failed" }));
    }

    info!("User {} enrolled in course {}", user.id, course_id);
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Successfully enrolled in the course"
    }))
}

/// POST /complete-lecture
/// Idempotent; responds with the refreshed progress payload either way.
pub async fn complete_lecture(
    req: HttpRequest,
    data: web::Data<AppState>,
    info: web::Json<CompleteLectureRequest>,
) -> impl Responder {
    let user = match current_user(&req) {
        Some(user) => user,
        None => {
            return HttpResponse::Unauthorized()
                .json(serde_json::json!({ "success": false, "message": "Unauthorized" }));
        }
    };

    if info.lecture_id.is_empty() || info.course_id.is_empty() {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "message": "Lecture ID and Course ID are required"
        }));
    }

    let user_oid = match ObjectId::parse_str(&user.id) {
        Ok(oid) => oid,
        Err(_) => {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({ "success": false, "message": "Invalid user id" }));
        }
    };
    let (lecture_id, course_id) = match (
        ObjectId::parse_str(&info.lecture_id),
        ObjectId::parse_str(&info.course_id),
    ) {
        (Ok(lecture_id), Ok(course_id)) => (lecture_id, course_id),
        _ => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "message": "Lecture ID and Course ID are required"
            }));
        }
    };

    let users_coll = data.mongodb.db.collection::<User>("users");
    let courses_coll = data.mongodb.db.collection::<Course>("courses");

    let mut db_user = match users_coll.find_one(doc! { "_id": user_oid }).await {
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

    if !course.lectures.contains(&lecture_id) {
        return HttpResponse::NotFound().json(serde_json::json!({
            "success": false,
            "message": "Lecture not found in this course"
        }));
    }

    if !db_user.completed_lectures.contains(&lecture_id) {
        if let Err(e) = users_coll
            .update_one(
                doc! { "_id": user_oid },
                doc! { "$addToSet": { "completedLectures": lecture_id } },
            )
            .await
        {
            error!("Error marking lecture complete: {}", e);
            return HttpResponse::InternalServerError()
                .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }));
        }
        db_user.completed_lectures.push(lecture_id);
    }

    let summary = course_progress(&course.lectures, &db_user.completed_lectures);
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Lecture marked as completed",
        "progress": summary.progress,
        "completedCount": summary.completed_count,
        "totalLectures": summary.total_lectures,
        "isCompleted": summary.is_completed,
        "completedLectureIds": db_user.completed_lectures.iter().map(|id| id.to_hex()).collect::<Vec<_>>(),
    }))
}

/// GET /course-progress/{id}
pub async fn get_course_progress(
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
    let course_id = match ObjectId::parse_str(path.as_str()) {
        Ok(oid) => oid,
        Err(_) => {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({ "success": false, "message": "Invalid Course ID" }));
        }
    };

    let users_coll = data.mongodb.db.collection::<User>("users");
    let courses_coll = data.mongodb.db.collection::<Course>("courses");

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

    let summary = course_progress(&course.lectures, &db_user.completed_lectures);
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "progress": summary.progress,
        "completedCount": summary.completed_count,
        "totalLectures": summary.total_lectures,
        "isCompleted": summary.is_completed,
        "completedLectureIds": db_user.completed_lectures.iter().map(|id| id.to_hex()).collect::<Vec<_>>(),
    }))
}
