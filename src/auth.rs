use actix_web::http::header::HeaderMap;
use actix_web::{web, HttpMessage, HttpRequest, HttpResponse, Responder};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::{error, info};
use mongodb::bson::{doc, DateTime as BsonDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::models::{User, UserRole};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: UserRole,
    /// Token id; the revocation store is keyed by this.
    pub jti: String,
    pub exp: usize,
}

/// Identity of the caller, inserted into request extensions by the auth
/// middleware once the bearer token checks out.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub role: UserRole,
}

/// A logged-out token. Rows outlive process restarts and are purged once the
/// token itself would have expired anyway.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokedToken {
    pub token_id: String,
    pub expires_at: BsonDateTime,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub role: Option<UserRole>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

// JWT Creation
pub fn create_jwt(
    user_id: &str,
    role: UserRole,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let expiration = Utc::now() + Duration::days(1);
    let claims = Claims {
        sub: user_id.to_string(),
        role,
        jti: Uuid::new_v4().to_string(),
        exp: expiration.timestamp() as usize,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_ref()))
}

// JWT Validation
pub fn validate_jwt(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

/// Extract "Bearer <token>" from the Authorization header if present.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_str = headers.get(actix_web::http::header::AUTHORIZATION)?.to_str().ok()?;
    auth_str
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
}

/// The caller's identity, if the middleware authenticated the request.
pub fn current_user(req: &HttpRequest) -> Option<AuthUser> {
    req.extensions().get::<AuthUser>().cloned()
}

pub async fn is_token_revoked(state: &AppState, token_id: &str) -> bool {
    let revoked = state.mongodb.db.collection::<RevokedToken>("revoked_tokens");
    revoked
        .find_one(doc! { "tokenId": token_id })
        .await
        .ok()
        .flatten()
        .is_some()
}

async fn revoke_token(
    state: &AppState,
    token_id: &str,
    expires_at: BsonDateTime,
) -> mongodb::error::Result<()> {
    let revoked = state.mongodb.db.collection::<RevokedToken>("revoked_tokens");
    // Opportunistic purge: rows for tokens that have expired on their own.
    revoked
        .delete_many(doc! { "expiresAt": { "$lt": BsonDateTime::now() } })
        .await?;
    revoked
        .insert_one(&RevokedToken {
            token_id: token_id.to_string(),
            expires_at,
        })
        .await?;
    Ok(())
}

fn is_valid_email(email: &str) -> bool {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$")
        .map(|re| re.is_match(email))
        .unwrap_or(false)
}

/// POST /register
pub async fn register(
    data: web::Data<AppState>,
    info: web::Json<RegisterRequest>,
) -> impl Responder {
    if info.full_name.trim().is_empty() || info.email.trim().is_empty() || info.password.is_empty()
    {
        return HttpResponse::BadRequest()
            .json(serde_json::json!({ "success": false, "message": "All fields are required" }));
    }

    if !is_valid_email(info.email.trim()) {
        return HttpResponse::BadRequest()
            .json(serde_json::json!({ "success": false, "message": "Invalid email address" }));
    }

    let users = data.mongodb.db.collection::<User>("users");
    match users.find_one(doc! { "email": info.email.trim() }).await {
        Ok(Some(_)) => {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({ "success": false, "message": "User already exists" }));
        }
        Ok(None) => {}
        Err(e) => {
            error!("Error checking existing user: {}", e);
            return HttpResponse::InternalServerError()
                .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }));
        }
    }

    let hashed_password = match hash(&info.password, DEFAULT_COST) {
        Ok(h) => h,
        Err(e) => {
            error!("Error hashing password: {}", e);
            return HttpResponse::InternalServerError()
                .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }));
        }
    };

    let new_user = User {
        id: None,
        full_name: info.full_name.trim().to_string(),
        email: info.email.trim().to_string(),
        password: hashed_password,
        role: info.role.unwrap_or_default(),
        enrolled_courses: vec![],
        completed_lectures: vec![],
        liked_lectures: vec![],
        photo_url: String::new(),
        notes: vec![],
        created_at: BsonDateTime::now(),
        updated_at: BsonDateTime::now(),
    };

    match users.insert_one(&new_user).await {
        Ok(_) => {
            info!("User registered: {}", new_user.email);
            HttpResponse::Created().json(
                serde_json::json!({ "success": true, "message": "User registered successfully" }),
            )
        }
        Err(e) => {
            error!("Error registering user: {}", e);
            HttpResponse::InternalServerError()
                .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }))
        }
    }
}

/// POST /login
pub async fn login(data: web::Data<AppState>, info: web::Json<LoginRequest>) -> impl Responder {
    if info.email.trim().is_empty() || info.password.is_empty() {
        return HttpResponse::BadRequest().json(
            serde_json::json!({ "success": false, "message": "Email and password are required" }),
        );
    }

    let users = data.mongodb.db.collection::<User>("users");
    let user = match users.find_one(doc! { "email": info.email.trim() }).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return HttpResponse::NotFound()
                .json(serde_json::json!({ "success": false, "message": "User not found" }));
        }
        Err(e) => {
            error!("Error logging in: {}", e);
            return HttpResponse::InternalServerError()
                .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }));
        }
    };

    if !verify(&info.password, &user.password).unwrap_or(false) {
        return HttpResponse::Unauthorized()
            .json(serde_json::json!({ "success": false, "message": "Invalid credentials" }));
    }

    let user_id = user.id.map(|id| id.to_hex()).unwrap_or_default();
    let token = match create_jwt(&user_id, user.role, &data.config.jwt_secret) {
        Ok(token) => token,
        Err(e) => {
            error!("Error signing token: {}", e);
            return HttpResponse::InternalServerError()
                .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }));
        }
    };

    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Logged in successfully",
        "token": token,
        "user": {
            "id": user_id,
            "fullName": user.full_name,
            "email": user.email,
            "role": user.role,
        }
    }))
}

/// POST /logout
pub async fn logout(req: HttpRequest, data: web::Data<AppState>) -> impl Responder {
    let token = match bearer_token(req.headers()) {
        Some(token) => token,
        None => {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({ "success": false, "message": "No token provided" }));
        }
    };

    let claims = match validate_jwt(&token, &data.config.jwt_secret) {
        Ok(claims) => claims,
        Err(_) => {
            return HttpResponse::Unauthorized()
                .json(serde_json::json!({ "success": false, "message": "Invalid Token" }));
        }
    };

    let expires_at = BsonDateTime::from_millis(claims.exp as i64 * 1000);
    match revoke_token(&data, &claims.jti, expires_at).await {
        Ok(()) => HttpResponse::Ok()
            .json(serde_json::json!({ "success": true, "message": "Logged out successfully" })),
        Err(e) => {
            error!("Error revoking token: {}", e);
            HttpResponse::InternalServerError()
                .json(serde_json::json!({ "success": false, "message": "Internal Server Error" }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jwt_round_trip_preserves_claims() {
        let token = create_jwt("65f0c0ffee0ddba11ca11ab1", UserRole::Admin, "test-secret").unwrap();
        let claims = validate_jwt(&token, "test-secret").unwrap();
        assert_eq!(claims.sub, "65f0c0ffee0ddba11ca11ab1");
        assert_eq!(claims.role, UserRole::Admin);
        assert!(!claims.jti.is_empty());
    }

    #[test]
    fn jwt_rejects_wrong_secret() {
        let token = create_jwt("65f0c0ffee0ddba11ca11ab1", UserRole::Student, "secret-a").unwrap();
        assert!(validate_jwt(&token, "secret-b").is_err());
    }

    #[test]
    fn expired_jwt_is_rejected() {
        let claims = Claims {
            sub: "65f0c0ffee0ddba11ca11ab1".to_string(),
            role: UserRole::Student,
            jti: Uuid::new_v4().to_string(),
            exp: (Utc::now() - Duration::hours(2)).timestamp() as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert!(validate_jwt(&token, "test-secret").is_err());
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last@sub.domain.org"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("missing@tld"));
        assert!(!is_valid_email("spaces in@mail.com"));
    }

    #[test]
    fn password_hash_round_trip() {
        let hashed = hash("secret1", 4).unwrap();
        assert!(verify("secret1", &hashed).unwrap());
        assert!(!verify("secret2", &hashed).unwrap());
    }
}
