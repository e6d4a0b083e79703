use actix_web::{web, HttpRequest, HttpResponse, Responder};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use futures_util::StreamExt;
use log::{error, info};
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};
use serde::Serialize;

use crate::app_state::AppState;
use crate::auth::{current_user, AuthUser};
use crate::models::{Comment, Course, Lecture, User, UserRole};
use crate::progress::course_progress;

/// One student's standing within a course, for the analytics rollup.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProgress {
    pub student_id: String,
    pub student_name: String,
    pub student_email: String,
    pub student_photo: String,
    pub enrolled_date: DateTime<Utc>,
    pub progress: u32,
    pub completed_lectures: usize,
    pub total_lectures: usize,
    pub is_completed: bool,
}

struct MonthBucket {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    label: String,
}

fn month_start(year: i32, month: u32) -> Option<DateTime<Utc>> {
    let date = NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0)?;
    Some(DateTime::from_naive_utc_and_offset(date, Utc))
}

/// The last 12 calendar months ending with the current one, oldest first.
fn month_buckets(now: DateTime<Utc>) -> Vec<MonthBucket> {
    (0..12)
        .rev()
        .filter_map(|i| {
            let months = now.year() * 12 + now.month0() as i32 - i;
            let (year, month) = (months.div_euclid(12), months.rem_euclid(12) as u32 + 1);
            let start = month_start(year, month)?;
            let end = if month == 12 {
                month_start(year + 1, 1)?
            } else {
                month_start(year, month + 1)?
            };
            Some(MonthBucket {
                start,
                end,
                label: start.format("%b %Y").to_string(),
            })
        })
        .collect()
}

fn require_admin(req: &HttpRequest) -> Result<AuthUser, HttpResponse> {
    match current_user(req) {
        Some(user) if user.role == UserRole::Admin => Ok(user),
        Some(_) => Err(HttpResponse::Forbidden()
            .json(serde_json::json!({ "success": false, "message": "Access denied" }))),
        None => Err(HttpResponse::Unauthorized()
            .json(serde_json::json!({ "success": false, "message": "Unauthorized" }))),
    }
}

/// GET /admin/stats
pub async fn get_stats(req: HttpRequest, data: web::Data<AppState>) -> impl Responder {
    if let Err(resp) = require_admin(&req) {
        return resp;
    }

    let db = &data.mongodb.db;
    let courses_coll = db.collection::<Course>("courses");
    let users_coll = db.collection::<User>("users");
    let lectures_coll = db.collection::<Lecture>("lectures");

    let total_courses = match courses_coll.count_documents(doc! {}).await {
        Ok(count) => count,
        Err(e) => {
            error!("Error counting courses: {}", e);
            return HttpResponse::InternalServerError()
                .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }));
        }
    };
    let total_users = match users_coll.count_documents(doc! { "role": "student" }).await {
        Ok(count) => count,
        Err(e) => {
            error!("Error counting users: {}", e);
            return HttpResponse::InternalServerError()
                .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }));
        }
    };
    let total_lectures = match lectures_coll.count_documents(doc! {}).await {
        Ok(count) => count,
        Err(e) => {
            error!("Error counting lectures: {}", e);
            return HttpResponse::InternalServerError()
                .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }));
        }
    };

    let thirty_days_ago = BsonDateTime::from_chrono(Utc::now() - Duration::days(30));
    let recent_users = match users_coll
        .count_documents(doc! { "createdAt": { "$gte": thirty_days_ago } })
        .await
    {
        Ok(count) => count,
        Err(e) => {
            error!("Error counting recent users: {}", e);
            return HttpResponse::InternalServerError()
                .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }));
        }
    };

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

    let total_revenue: f64 = courses
        .iter()
        .map(|course| course.price.unwrap_or(0.0) * course.enrolled_students.len() as f64)
        .sum();

    courses.sort_by(|a, b| b.enrolled_students.len().cmp(&a.enrolled_students.len()));
    let top_courses: Vec<serde_json::Value> = courses
        .iter()
        .take(5)
        .map(|course| {
            serde_json::json!({
                "_id": course.id.map(|id| id.to_hex()),
                "title": course.title,
                "category": course.category,
                "price": course.price,
                "enrolledStudents": course.enrolled_students.len(),
            })
        })
        .collect();

    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "stats": {
            "totalCourses": total_courses,
            "totalUsers": total_users,
            "totalLectures": total_lectures,
            "totalRevenue": total_revenue,
            "recentUsers": recent_users,
            "topCourses": top_courses,
        }
    }))
}

/// GET /admin/enrollment-trends
/// Monthly registration counts for the trailing year.
pub async fn enrollment_trends(req: HttpRequest, data: web::Data<AppState>) -> impl Responder {
    if let Err(resp) = require_admin(&req) {
        return resp;
    }

    let users_coll = data.mongodb.db.collection::<User>("users");
    let mut trends = Vec::with_capacity(12);
    for bucket in month_buckets(Utc::now()) {
        let filter = doc! { "createdAt": {
            "$gte": BsonDateTime::from_chrono(bucket.start),
            "$lt": BsonDateTime::from_chrono(bucket.end),
        } };
        let count = match users_coll.count_documents(filter).await {
            Ok(count) => count,
            Err(e) => {
                error!("Error counting enrollments for {}: {}", bucket.label, e);
                return HttpResponse::InternalServerError().json(
                    serde_json::json!({ "success": false, "message": "Internal Server Error" }),
                );
            }
        };
        trends.push(serde_json::json!({ "month": bucket.label, "enrollments": count }));
    }

    HttpResponse::Ok().json(serde_json::json!({ "success": true, "trends": trends }))
}

/// GET /admin/course/{id}/analytics
/// Per-student progress rollup for one course.
pub async fn course_analytics(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    if let Err(resp) = require_admin(&req) {
        return resp;
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

    let users_coll = data.mongodb.db.collection::<User>("users");
    let mut cursor = match users_coll
        .find(doc! { "_id": { "$in": course.enrolled_students.clone() } })
        .await
    {
        Ok(cursor) => cursor,
        Err(e) => {
            error!("Error fetching enrolled students: {}", e);
            return HttpResponse::InternalServerError()
                .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }));
        }
    };

    let mut students = Vec::new();
    while let Some(user_res) = cursor.next().await {
        let user = match user_res {
            Ok(user) => user,
            Err(e) => {
                error!("Error reading students cursor: {}", e);
                return HttpResponse::InternalServerError().json(
                    serde_json::json!({ "success": false, "message": "Internal Server Error" }),
                );
            }
        };
        let summary = course_progress(&course.lectures, &user.completed_lectures);
        students.push(StudentProgress {
            student_id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
            student_name: user.full_name,
            student_email: user.email,
            student_photo: user.photo_url,
            enrolled_date: user.created_at.to_chrono(),
            progress: summary.progress,
            completed_lectures: summary.completed_count,
            total_lectures: summary.total_lectures,
            is_completed: summary.is_completed,
        });
    }

    let completed_students = students.iter().filter(|s| s.is_completed).count();
    let average_progress = if students.is_empty() {
        0
    } else {
        (students.iter().map(|s| s.progress as f64).sum::<f64>() / students.len() as f64).round()
            as u32
    };
    let revenue = course.price.unwrap_or(0.0) * course.enrolled_students.len() as f64;

    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "analytics": {
            "course": {
                "id": course_id.to_hex(),
                "title": course.title,
                "category": course.category,
                "price": course.price,
                "thumbnail": course.thumbnail,
                "totalLectures": course.lectures.len(),
            },
            "stats": {
                "totalEnrolled": course.enrolled_students.len(),
                "completedStudents": completed_students,
                "revenue": revenue,
                "averageProgress": average_progress,
            },
            "students": students,
        }
    }))
}

/// DELETE /admin/course/{id}
///
/// Best-effort sequential cascade (no multi-document transactions on a
/// standalone MongoDB): lecture IDs are taken from the course document before
/// anything is deleted, then comments, user references, lectures, and finally
/// the course itself are removed.
pub async fn delete_course(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    if let Err(resp) = require_admin(&req) {
        return resp;
    }

    let course_id = match ObjectId::parse_str(path.as_str()) {
        Ok(oid) => oid,
        Err(_) => {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({ "success": false, "message": "Invalid Course ID" }));
        }
    };

    let db = &data.mongodb.db;
    let courses_coll = db.collection::<Course>("courses");
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

    let lecture_ids = course.lectures;

    let comments_coll = db.collection::<Comment>("comments");
    if let Err(e) = comments_coll
        .delete_many(doc! { "lectureId": { "$in": lecture_ids.clone() } })
        .await
    {
        error!("Error deleting course comments: {}", e);
        return HttpResponse::InternalServerError()
            .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }));
    }

    let users_coll = db.collection::<User>("users");
    if let Err(e) = users_coll
        .update_many(doc! {}, doc! { "$pull": { "enrolledCourses": course_id } })
        .await
    {
        error!("Error removing course from enrollments: {}", e);
        return HttpResponse::InternalServerError()
            .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }));
    }
    if let Err(e) = users_coll
        .update_many(
            doc! {},
            doc! { "$pull": {
                "completedLectures": { "$in": lecture_ids.clone() },
                "likedLectures": { "$in": lecture_ids.clone() },
                "notes": { "lectureId": { "$in": lecture_ids.clone() } },
            } },
        )
        .await
    {
        error!("Error removing lecture references from users: {}", e);
        return HttpResponse::InternalServerError()
            .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }));
    }

    let lectures_coll = db.collection::<Lecture>("lectures");
    if let Err(e) = lectures_coll
        .delete_many(doc! { "courseId": course_id })
        .await
    {
        error!("Error deleting course lectures: {}", e);
        return HttpResponse::InternalServerError()
            .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }));
    }

    if let Err(e) = courses_coll.delete_one(doc! { "_id": course_id }).await {
        error!("Error deleting course: {}", e);
        return HttpResponse::InternalServerError()
            .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }));
    }

    info!("Course deleted: {}", course_id);
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Course and all associated data deleted successfully"
    }))
}

/// DELETE /admin/lecture/{id}
pub async fn delete_lecture(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    if let Err(resp) = require_admin(&req) {
        return resp;
    }

    let lecture_id = match ObjectId::parse_str(path.as_str()) {
        Ok(oid) => oid,
        Err(_) => {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({ "success": false, "message": "Invalid Lecture ID" }));
        }
    };

    let db = &data.mongodb.db;
    let lectures_coll = db.collection::<Lecture>("lectures");
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

    let courses_coll = db.collection::<Course>("courses");
    if let Err(e) = courses_coll
        .update_one(
            doc! { "_id": lecture.course_id },
            doc! { "$pull": { "lectures": lecture_id } },
        )
        .await
    {
        error!("Error unlinking lecture from course: {}", e);
        return HttpResponse::InternalServerError()
            .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }));
    }

    let comments_coll = db.collection::<Comment>("comments");
    if let Err(e) = comments_coll
        .delete_many(doc! { "lectureId": lecture_id })
        .await
    {
        error!("Error deleting lecture comments: {}", e);
        return HttpResponse::InternalServerError()
            .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }));
    }

    let users_coll = db.collection::<User>("users");
    if let Err(e) = users_coll
        .update_many(
            doc! {},
            doc! { "$pull": {
                "completedLectures": lecture_id,
                "likedLectures": lecture_id,
                "notes": { "lectureId": lecture_id },
            } },
        )
        .await
    {
        error!("Error removing lecture references from users: {}", e);
        return HttpResponse::InternalServerError()
            .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }));
    }

    if let Err(e) = lectures_coll.delete_one(doc! { "_id": lecture_id }).await {
        error!("Error deleting lecture: {}", e);
        return HttpResponse::InternalServerError()
            .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }));
    }

    info!("Lecture deleted: {}", lecture_id);
    HttpResponse::Ok()
        .json(serde_json::json!({ "success": true, "message": "Lecture deleted successfully" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn twelve_buckets_oldest_first() {
        let now = Utc.with_ymd_and_hms(2026, 8, 7, 10, 0, 0).unwrap();
        let buckets = month_buckets(now);
        assert_eq!(buckets.len(), 12);
        assert_eq!(buckets[0].label, "Sep 2025");
        assert_eq!(buckets[11].label, "Aug 2026");
        for bucket in &buckets {
            assert!(bucket.start < bucket.end);
        }
    }

    #[test]
    fn buckets_are_contiguous_across_year_boundary() {
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 0, 0, 0).unwrap();
        let buckets = month_buckets(now);
        assert_eq!(buckets[0].label, "Feb 2025");
        for pair in buckets.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        assert_eq!(buckets[11].start, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
    }
}
