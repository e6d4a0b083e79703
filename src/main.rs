// src/main.rs

mod admin;
mod app_state;
mod auth;
mod certificate;
mod config;
mod course;
mod db;
mod engagement;
mod enrollment;
mod lecture;
mod models;
mod progress;
mod user_management;

use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};

use actix_cors::Cors;
use actix_web::{
    body::{BoxBody, MessageBody},
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http,
    middleware::Logger,
    web, App, Error, HttpMessage, HttpResponse, HttpServer,
};
use env_logger::Env;
use futures::future::{ok, Ready};

use crate::admin::{
    course_analytics, delete_course, delete_lecture, enrollment_trends, get_stats,
};
use crate::app_state::AppState;
use crate::auth::{login, logout, register, AuthUser};
use crate::certificate::generate_certificate;
use crate::course::{create_course, list_courses, update_course, view_course};
use crate::engagement::{
    add_comment, delete_comment, get_comments, get_note, like_lecture, save_note,
};
use crate::enrollment::{complete_lecture, enroll_course, get_course_progress};
use crate::lecture::{add_lecture, get_lecture, update_lecture};
use crate::user_management::{edit_profile, get_profile};

#[derive(Debug)]
pub struct Authentication;

impl<S, B> Transform<S, ServiceRequest> for Authentication
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Transform = AuthMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddleware {
            service: Rc::new(service),
        })
    }
}

pub struct AuthMiddleware<S> {
    service: Rc<S>,
}

fn reject_unauthorized(req: ServiceRequest, message: &str) -> ServiceResponse<BoxBody> {
    let (req_parts, _payload) = req.into_parts();
    let resp = HttpResponse::Unauthorized()
        .json(serde_json::json!({ "success": false, "message": message }));
    ServiceResponse::new(req_parts, resp)
}

impl<S, B> Service<ServiceRequest> for AuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    // Requests without a bearer token pass through untouched; protected
    // handlers reject when no identity extension is present. A token that is
    // present must verify and must not have been revoked.
    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        Box::pin(async move {
            if let Some(token) = auth::bearer_token(req.headers()) {
                let state = req.app_data::<web::Data<AppState>>().cloned();
                if let Some(state) = state {
                    match auth::validate_jwt(&token, &state.config.jwt_secret) {
                        Ok(claims) => {
                            if auth::is_token_revoked(&state, &claims.jti).await {
                                return Ok(reject_unauthorized(
                                    req,
                                    "Unauthorized or Token Expired",
                                ));
                            }
                            req.extensions_mut().insert(AuthUser {
                                id: claims.sub,
                                role: claims.role,
                            });
                        }
                        Err(_) => {
                            return Ok(reject_unauthorized(req, "Invalid Token"));
                        }
                    }
                }
            }

            let res = service.call(req).await?;
            Ok(res.map_into_boxed_body())
        })
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = config::Config::from_env();
    let mongodb = Arc::new(db::MongoDB::init(&config).await);

    println!("Server running at http://0.0.0.0:{}", config.port);
    println!("Allowed CORS Origin: {}", config.frontend_origin);

    let bind_addr = ("0.0.0.0", config.port);
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&config.frontend_origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                http::header::CONTENT_TYPE,
                http::header::ACCEPT,
                http::header::AUTHORIZATION,
            ])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .wrap(Authentication)
            .app_data(web::Data::new(AppState {
                mongodb: mongodb.clone(),
                config: config.clone(),
            }))
            // AUTH + PROFILE
            .route("/register", web::post().to(register))
            .route("/login", web::post().to(login))
            .route("/logout", web::post().to(logout))
            .route("/profile", web::get().to(get_profile))
            .route("/edit-profile", web::put().to(edit_profile))
            // COURSES
            .route("/courses", web::get().to(list_courses))
            .route("/create-course", web::post().to(create_course))
            .route("/courses/{id}", web::put().to(update_course))
            .route("/view-courses/{id}", web::get().to(view_course))
            .route("/add-lecture/{id}", web::post().to(add_lecture))
            // LEARNING
            .route("/enroll-course", web::post().to(enroll_course))
            .route("/complete-lecture", web::post().to(complete_lecture))
            .route("/course-progress/{id}", web::get().to(get_course_progress))
            .route("/generate-certificate/{id}", web::get().to(generate_certificate))
            // LECTURES + ENGAGEMENT
            .service(
                web::scope("/lectures/{id}")
                    .route("", web::get().to(get_lecture))
                    .route("", web::put().to(update_lecture))
                    .route("/like", web::post().to(like_lecture))
                    .route("/notes", web::post().to(save_note))
                    .route("/notes", web::get().to(get_note))
                    .route("/comments", web::post().to(add_comment))
                    .route("/comments", web::get().to(get_comments)),
            )
            .route("/comments/{id}", web::delete().to(delete_comment))
            // ADMIN
            .service(
                web::scope("/admin")
                    .route("/stats", web::get().to(get_stats))
                    .route("/enrollment-trends", web::get().to(enrollment_trends))
                    .route("/course/{id}/analytics", web::get().to(course_analytics))
                    .route("/course/{id}", web::delete().to(delete_course))
                    .route("/lecture/{id}", web::delete().to(delete_lecture)),
            )
    })
    .bind(bind_addr)?
    .run()
    .await
}
