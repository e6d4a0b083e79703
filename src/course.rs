use actix_web::{web, HttpRequest, HttpResponse, Responder};
use futures_util::StreamExt;
use log::{error, info};
use mongodb::bson::{doc, oid::ObjectId, to_bson, DateTime as BsonDateTime};
use serde::Deserialize;

use crate::app_state::AppState;
use crate::auth::current_user;
use crate::models::{Course, CourseLevel, Lecture, UserRole};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub category: String,
    pub sub_title: Option<String>,
    pub description: Option<String>,
    pub level: Option<CourseLevel>,
    pub price: Option<f64>,
    pub thumbnail: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    pub sub_title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub level: Option<CourseLevel>,
    pub price: Option<f64>,
    pub thumbnail: Option<String>,
}

/// GET /courses
/// Public catalog listing.
pub async fn list_courses(data: web::Data<AppState>) -> impl Responder {
    let courses_coll = data.mongodb.db.collection::<Course>("courses");
    let mut cursor = match courses_coll.find(doc! {}).await {
        Ok(cursor) => cursor,
        Err(e) => {
            error!("Error fetching courses: {}", e);
            return HttpResponse::InternalServerError()
                .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }));
        }
    };

    let mut courses = Vec::new();
    while let Some(course_res) = cursor.next().await {
        match course_res {
            Ok(course) => courses.push(course),
            Err(e) => {
                error!("Error reading courses cursor: {}", e);
                return HttpResponse::InternalServerError().json(
                    serde_json::json!({ "success": false, "message": "Internal Server Error" }),
                );
            }
        }
    }

    HttpResponse::Ok().json(serde_json::json!({ "success": true, "courses": courses }))
}

/// POST /create-course
pub async fn create_course(
    req: HttpRequest,
    data: web::Data<AppState>,
    info: web::Json<CreateCourseRequest>,
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

    if info.title.trim().is_empty() || info.category.trim().is_empty() {
        return HttpResponse::BadRequest()
            .json(serde_json::json!({ "success": false, "message": "All fields are required" }));
    }

    let info = info.into_inner();
    let new_course = Course {
        id: Some(ObjectId::new()),
        title: info.title.trim().to_string(),
        sub_title: info.sub_title,
        description: info.description,
        category: info.category.trim().to_string(),
        level: info.level,
        price: info.price,
        thumbnail: info.thumbnail,
        enrolled_students: vec![],
        lectures: vec![],
        created_at: BsonDateTime::now(),
        updated_at: BsonDateTime::now(),
    };

    let courses_coll = data.mongodb.db.collection::<Course>("courses");
    match courses_coll.insert_one(&new_course).await {
        Ok(_) => {
            info!("Course created: {:?}", new_course.id);
            HttpResponse::Created().json(serde_json::json!({
                "success": true,
                "message": "Course created successfully",
                "course": new_course,
            }))
        }
        Err(e) => {
            error!("Error creating course: {}", e);
            HttpResponse::InternalServerError()
                .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }))
        }
    }
}

/// PUT /courses/{id}
pub async fn update_course(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
    info: web::Json<UpdateCourseRequest>,
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

    let course_id = match ObjectId::parse_str(path.as_str()) {
        Ok(oid) => oid,
        Err(_) => {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({ "success": false, "message": "Invalid Course ID" }));
        }
    };

    let mut set_doc = doc! {};
    if let Some(title) = &info.title {
        set_doc.insert("title", title);
    }
    if let Some(sub_title) = &info.sub_title {
        set_doc.insert("subTitle", sub_title);
    }
    if let Some(description) = &info.description {
        set_doc.insert("description", description);
    }
    if let Some(category) = &info.category {
        set_doc.insert("category", category);
    }
    if let Some(level) = &info.level {
        match to_bson(level) {
            Ok(level) => {
                set_doc.insert("level", level);
            }
            Err(e) => {
                error!("Error serializing course level: {}", e);
                return HttpResponse::InternalServerError().json(
                    serde_json::json!({ "success": false, "message": "Internal Server Error" }),
                );
            }
        }
    }
    if let Some(price) = info.price {
        set_doc.insert("price", price);
    }
    if let Some(thumbnail) = &info.thumbnail {
        set_doc.insert("thumbnail", thumbnail);
    }
    if set_doc.is_empty() {
        return HttpResponse::BadRequest()
            .json(serde_json::json!({ "success": false, "message": "No fields to update" }));
    }
    set_doc.insert("updatedAt", BsonDateTime::now());

    let courses_coll = data.mongodb.db.collection::<Course>("courses");
    match courses_coll
        .update_one(doc! { "_id": course_id }, doc! { "$set": set_doc })
        .await
    {
        Ok(res) if res.matched_count == 0 => {
            return HttpResponse::NotFound()
                .json(serde_json::json!({ "success": false, "message": "Course not found" }));
        }
        Ok(_) => {}
        Err(e) => {
            error!("Error updating course: {}", e);
            return HttpResponse::InternalServerError()
                .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }));
        }
    }

    match courses_coll.find_one(doc! { "_id": course_id }).await {
        Ok(Some(updated)) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Course updated successfully",
            "updatedCourse": updated,
        })),
        Ok(None) => HttpResponse::NotFound()
            .json(serde_json::json!({ "success": false, "message": "Course not found" })),
        Err(e) => {
            error!("Error fetching updated course: {}", e);
            HttpResponse::InternalServerError()
                .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }))
        }
    }
}

/// GET /view-courses/{id}
/// Course detail with its lectures populated in course order.
pub async fn view_course(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
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

    let lectures_coll = data.mongodb.db.collection::<Lecture>("lectures");
    let mut cursor = match lectures_coll
        .find(doc! { "courseId": course_id })
        .sort(doc! { "order": 1 })
        .await
    {
        Ok(cursor) => cursor,
        Err(e) => {
            error!("Error fetching lectures: {}", e);
            return HttpResponse::InternalServerError()
                .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }));
        }
    };

    let mut lectures = Vec::new();
    while let Some(lecture_res) = cursor.next().await {
        match lecture_res {
            Ok(lecture) => lectures.push(lecture),
            Err(e) => {
                error!("Error reading lectures cursor: {}", e);
                return HttpResponse::InternalServerError().json(
                    serde_json::json!({ "success": false, "message": "Internal Server Error" }),
                );
            }
        }
    }

    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "course": {
            "_id": course_id.to_hex(),
            "title": course.title,
            "subTitle": course.sub_title,
            "description": course.description,
            "category": course.category,
            "level": course.level,
            "price": course.price,
            "thumbnail": course.thumbnail,
            "enrolledStudents": course.enrolled_students.iter().map(|id| id.to_hex()).collect::<Vec<_>>(),
            "lectures": lectures,
            "createdAt": course.created_at.to_chrono(),
        }
    }))
}
