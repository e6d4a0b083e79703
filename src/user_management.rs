use actix_web::{web, HttpRequest, HttpResponse, Responder};
use log::error;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};
use serde::Deserialize;

use crate::app_state::AppState;
use crate::auth::current_user;
use crate::models::{User, UserProfile};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditProfileRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "photo_url")]
    pub photo_url: Option<String>,
}

/// GET /profile
pub async fn get_profile(req: HttpRequest, data: web::Data<AppState>) -> impl Responder {
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

    let users = data.mongodb.db.collection::<User>("users");
    match users.find_one(doc! { "_id": user_oid }).await {
        Ok(Some(user)) => HttpResponse::Ok().json(UserProfile::from(user)),
        Ok(None) => HttpResponse::NotFound()
            .json(serde_json::json!({ "success": false, "message": "User not found" })),
        Err(e) => {
            error!("Error fetching profile: {}", e);
            HttpResponse::InternalServerError()
                .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }))
        }
    }
}

/// PUT /edit-profile
pub async fn edit_profile(
    req: HttpRequest,
    data: web::Data<AppState>,
    info: web::Json<EditProfileRequest>,
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

    let mut set_doc = doc! {};
    if let Some(full_name) = &info.full_name {
        set_doc.insert("fullName", full_name);
    }
    if let Some(email) = &info.email {
        set_doc.insert("email", email);
    }
    if let Some(photo_url) = &info.photo_url {
        set_doc.insert("photo_url", photo_url);
    }
    if set_doc.is_empty() {
        return HttpResponse::BadRequest()
            .json(serde_json::json!({ "success": false, "message": "No fields to update" }));
    }
    set_doc.insert("updatedAt", BsonDateTime::now());

    let users = data.mongodb.db.collection::<User>("users");
    match users
        .update_one(doc! { "_id": user_oid }, doc! { "$set": set_doc })
        .await
    {
        Ok(res) if res.matched_count == 0 => {
            return HttpResponse::NotFound()
                .json(serde_json::json!({ "success": false, "message": "User not found" }));
        }
        Ok(_) => {}
        Err(e) => {
            error!("Error updating profile: {}", e);
            return HttpResponse::InternalServerError()
                .json(serde_json::json!({ "success": false, "message": "Error updating profile" }));
        }
    }

    match users.find_one(doc! { "_id": user_oid }).await {
        Ok(Some(updated)) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "user": UserProfile::from(updated),
        })),
        Ok(None) => HttpResponse::NotFound()
            .json(serde_json::json!({ "success": false, "message": "User not found" })),
        Err(e) => {
            error!("Error fetching updated profile: {}", e);
            HttpResponse::InternalServerError()
                .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }))
        }
    }
}
