//! HTTP handlers. Each one is a single pass-through call to the document
//! store; results are returned as the store produced them.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::db::{Collection, Filter, FindOptions, Sort};
use crate::error::{AppError, AppResult};
use crate::models::review::{ReviewUpdate, DATE, FOOD_NAME, RATING, USER_EMAIL};
use crate::models::user::{EMAIL, USER_EXISTS_MESSAGE};
use crate::state::AppState;

pub const ROOT_MESSAGE: &str = "Local Food Lovers Network Server Running!";

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

impl EmailQuery {
    // A missing email is queried as null, which matches documents without an owner.
    fn owner(&self) -> Value {
        self.email.clone().map(Value::String).unwrap_or(Value::Null)
    }
}

/// Register every route on the given service config.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/users", web::post().to(create_user))
        .route("/reviews", web::post().to(create_review))
        .route("/reviews", web::get().to(get_reviews))
        .route("/reviews/{id}", web::get().to(get_review))
        .route("/reviews/{id}", web::patch().to(update_review))
        .route("/reviews/{id}", web::delete().to(delete_review))
        .route("/featured-reviews", web::get().to(get_featured_reviews))
        .route("/my-reviews", web::get().to(get_my_reviews))
        .route("/favorites", web::post().to(create_favorite))
        .route("/favorites", web::get().to(get_favorites))
        .route("/favorites/{id}", web::delete().to(delete_favorite));
}

/// JSON body extractor settings; malformed bodies get the same error shape as handler errors.
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

pub async fn index() -> HttpResponse {
    HttpResponse::Ok().body(ROOT_MESSAGE)
}

pub async fn create_user(
    state: web::Data<AppState>,
    user: web::Json<Value>,
) -> AppResult<HttpResponse> {
    let db = state.store.database().await?;
    let user = user.into_inner();
    let email = user.get(EMAIL).cloned().unwrap_or(Value::Null);

    if db
        .find_one(Collection::Users, Filter::eq(EMAIL, email.clone()))
        .await?
        .is_some()
    {
        debug!(%email, "user already registered");
        return Ok(HttpResponse::Ok().json(json!({ "message": USER_EXISTS_MESSAGE })));
    }

    let result = db.insert_one(Collection::Users, user).await?;
    info!(id = %result.inserted_id, %email, "user registered");
    Ok(HttpResponse::Ok().json(result))
}

pub async fn create_review(
    state: web::Data<AppState>,
    review: web::Json<Value>,
) -> AppResult<HttpResponse> {
    let db = state.store.database().await?;
    let result = db.insert_one(Collection::Reviews, review.into_inner()).await?;
    info!(id = %result.inserted_id, "review created");
    Ok(HttpResponse::Ok().json(result))
}

pub async fn get_reviews(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> AppResult<HttpResponse> {
    let filter = match query.search.as_deref() {
        Some(search) if !search.is_empty() => Filter::contains_ignore_case(FOOD_NAME, search),
        _ => Filter::All,
    };

    let db = state.store.database().await?;
    let reviews = db
        .find(
            Collection::Reviews,
            FindOptions::filter(filter).sort(Sort::descending(DATE)),
        )
        .await?;
    Ok(HttpResponse::Ok().json(reviews))
}

/// Responds with `null` when no review has the id.
pub async fn get_review(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> AppResult<HttpResponse> {
    let db = state.store.database().await?;
    let review = db.find_by_id(Collection::Reviews, &id).await?;
    Ok(HttpResponse::Ok().json(review))
}

pub async fn get_featured_reviews(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let db = state.store.database().await?;
    let reviews = db
        .find(
            Collection::Reviews,
            FindOptions::default()
                .sort(Sort::descending(RATING))
                .limit(state.featured_limit),
        )
        .await?;
    Ok(HttpResponse::Ok().json(reviews))
}

pub async fn get_my_reviews(
    state: web::Data<AppState>,
    query: web::Query<EmailQuery>,
) -> AppResult<HttpResponse> {
    let db = state.store.database().await?;
    let reviews = db
        .find(
            Collection::Reviews,
            FindOptions::filter(Filter::eq(USER_EMAIL, query.owner()))
                .sort(Sort::descending(DATE)),
        )
        .await?;
    Ok(HttpResponse::Ok().json(reviews))
}

pub async fn update_review(
    state: web::Data<AppState>,
    id: web::Path<String>,
    update: web::Json<ReviewUpdate>,
) -> AppResult<HttpResponse> {
    let db = state.store.database().await?;
    let result = db
        .update_one(Collection::Reviews, &id, update.into_inner().into_set())
        .await?;
    info!(
        id = %id,
        matched = result.matched_count,
        modified = result.modified_count,
        "review update"
    );
    Ok(HttpResponse::Ok().json(result))
}

pub async fn delete_review(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> AppResult<HttpResponse> {
    let db = state.store.database().await?;
    let result = db.delete_one(Collection::Reviews, &id).await?;
    info!(id = %id, deleted = result.deleted_count, "review delete");
    Ok(HttpResponse::Ok().json(result))
}

pub async fn create_favorite(
    state: web::Data<AppState>,
    favorite: web::Json<Value>,
) -> AppResult<HttpResponse> {
    let db = state.store.database().await?;
    let result = db
        .insert_one(Collection::Favorites, favorite.into_inner())
        .await?;
    info!(id = %result.inserted_id, "favorite added");
    Ok(HttpResponse::Ok().json(result))
}

pub async fn get_favorites(
    state: web::Data<AppState>,
    query: web::Query<EmailQuery>,
) -> AppResult<HttpResponse> {
    let db = state.store.database().await?;
    let favorites = db
        .find(
            Collection::Favorites,
            FindOptions::filter(Filter::eq(USER_EMAIL, query.owner())),
        )
        .await?;
    Ok(HttpResponse::Ok().json(favorites))
}

pub async fn delete_favorite(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> AppResult<HttpResponse> {
    let db = state.store.database().await?;
    let result = db.delete_one(Collection::Favorites, &id).await?;
    info!(id = %id, deleted = result.deleted_count, "favorite delete");
    Ok(HttpResponse::Ok().json(result))
}
