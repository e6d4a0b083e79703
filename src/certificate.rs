use actix_web::{web, HttpRequest, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use log::{error, info};
use mongodb::bson::{doc, oid::ObjectId};

use crate::app_state::AppState;
use crate::auth::current_user;
use crate::models::{Certificate, Course, User};
use crate::progress::course_progress;

/// "CERT-<millis>-<last 6 of the user id, uppercased>".
fn certificate_id(user_id: &str, issued_at: DateTime<Utc>) -> String {
    let tail_start = user_id.len().saturating_sub(6);
    format!(
        "CERT-{}-{}",
        issued_at.timestamp_millis(),
        user_id[tail_start..].to_uppercase()
    )
}

fn format_completion_date(date: DateTime<Utc>) -> String {
    date.format("%B %-d, %Y").to_string()
}

fn certificate_response(cert: &Certificate) -> serde_json::Value {
    serde_json::json!({
        "success": true,
        "certificate": {
            "studentName": cert.student_name,
            "studentEmail": cert.student_email,
            "courseName": cert.course_name,
            "courseCategory": cert.course_category,
            "completionDate": cert.completion_date,
            "certificateId": cert.certificate_id,
            "issueDate": cert.issue_date,
            "totalLectures": cert.total_lectures,
        }
    })
}

/// GET /generate-certificate/{id}
///
/// Eligibility: enrolled, then 100% progress. The first successful request
/// persists the certificate; later requests return the stored one unchanged.
pub async fn generate_certificate(
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

    if !db_user.enrolled_courses.contains(&course_id) {
        return HttpResponse::Forbidden().json(serde_json::json!({
            "success": false,
            "message": "You must be enrolled in this course to get a certificate"
        }));
    }

    let summary = course_progress(&course.lectures, &db_user.completed_lectures);
    if !summary.is_completed {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "message": format!("Course not completed yet. Progress: {}%", summary.progress),
            "progress": summary.progress,
            "completedCount": summary.completed_count,
            "totalLectures": summary.total_lectures,
        }));
    }

    let certificates = data.mongodb.db.collection::<Certificate>("certificates");
    match certificates
        .find_one(doc! { "userId": user_oid, "courseId": course_id })
        .await
    {
        Ok(Some(existing)) => return HttpResponse::Ok().json(certificate_response(&existing)),
        Ok(None) => {}
        Err(e) => {
            error!("Error fetching certificate: {}", e);
            return HttpResponse::InternalServerError()
                .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }));
        }
    }

    let issued_at = Utc::now();
    let cert = Certificate {
        id: None,
        certificate_id: certificate_id(&user.id, issued_at),
        user_id: user_oid,
        course_id,
        student_name: db_user.full_name,
        student_email: db_user.email,
        course_name: course.title,
        course_category: course.category,
        completion_date: format_completion_date(issued_at),
        issue_date: issued_at,
        total_lectures: summary.total_lectures as u32,
    };

    match certificates.insert_one(&cert).await {
        Ok(_) => {
            info!("Certificate issued: {}", cert.certificate_id);
            HttpResponse::Ok().json(certificate_response(&cert))
        }
        Err(e) => {
            error!("Error storing certificate: {}", e);
            HttpResponse::InternalServerError()
                .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn certificate_id_format() {
        let issued_at = Utc.with_ymd_and_hms(2026, 3, 5, 12, 0, 0).unwrap();
        let id = certificate_id("65f0c0ffee0ddba11ca1fab1", issued_at);
        assert_eq!(
            id,
            format!("CERT-{}-A1FAB1", issued_at.timestamp_millis())
        );
    }

    #[test]
    fn certificate_id_handles_short_ids() {
        let issued_at = Utc.with_ymd_and_hms(2026, 3, 5, 12, 0, 0).unwrap();
        let id = certificate_id("ab1", issued_at);
        assert!(id.ends_with("-AB1"));
    }

    #[test]
    fn completion_date_is_long_form() {
        let date = Utc.with_ymd_and_hms(2026, 3, 5, 9, 30, 0).unwrap();
        assert_eq!(format_completion_date(date), "March 5, 2026");
    }
}
