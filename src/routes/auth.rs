use crate::{
    auth::{
        hash_password, verify_password, LoginRequest, RefreshRequest, RegisterRequest,
        SessionManager, TokenResponse,
    },
    error::AppError,
    models::User,
};
use actix_web::{post, web, HttpResponse, Responder};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// Register a new user
///
/// Creates a new user account and returns an access/refresh token pair.
#[post("/register")]
pub async fn register(
    pool: web::Data<PgPool>,
    sessions: web::Data<SessionManager>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    // Validate input
    register_data.validate()?;

    // Check if email already exists
    let existing_user: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM users WHERE email = $1")
            .bind(&register_data.email)
            .fetch_optional(&**pool)
            .await?;

    if existing_user.is_some() {
        return Err(AppError::BadRequest("Email already registered".into()));
    }

    // Hash password
    let password_hash = hash_password(&register_data.password)?;

    // Insert new user
    let user_id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, email, password_hash) VALUES ($1, $2, $3)")
        .bind(user_id)
        .bind(&register_data.email)
        .bind(&password_hash)
        .execute(&**pool)
        .await?;

    // Issue the initial token pair
    let pair = sessions.issue(user_id).await?;

    Ok(HttpResponse::Created().json(TokenResponse::from(pair)))
}

/// Login user
///
/// Authenticates a user and returns an access/refresh token pair.
#[post("/login")]
pub async fn login(
    pool: web::Data<PgPool>,
    sessions: web::Data<SessionManager>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    // Validate input
    login_data.validate()?;

    // Get user from database
    let user = sqlx::query_as::<_, User>(
        "SELECT id, email, password_hash, created_at FROM users WHERE email = $1",
    )
    .bind(&login_data.email)
    .fetch_optional(&**pool)
    .await?;

    // Unknown email and wrong password answer identically.
    match user {
        Some(user) => {
            if verify_password(&login_data.password, &user.password_hash)? {
                let pair = sessions.issue(user.id).await?;
                Ok(HttpResponse::Ok().json(TokenResponse::from(pair)))
            } else {
                Err(AppError::Unauthorized("Invalid credentials".into()))
            }
        }
        None => Err(AppError::Unauthorized("Invalid credentials".into())),
    }
}

/// Exchange a refresh token for a new token pair
///
/// The presented token is revoked in the process; presenting it a second time
/// is rejected as reuse.
#[post("/refresh")]
pub async fn refresh(
    sessions: web::Data<SessionManager>,
    refresh_data: web::Json<RefreshRequest>,
) -> Result<impl Responder, AppError> {
    let pair = sessions.rotate(&refresh_data.refresh_token).await?;
    Ok(HttpResponse::Ok().json(TokenResponse::from(pair)))
}

/// Logout
///
/// Revokes the presented refresh token. Succeeds as long as the token parses,
/// whether or not it was still live.
#[post("/logout")]
pub async fn logout(
    sessions: web::Data<SessionManager>,
    refresh_data: web::Json<RefreshRequest>,
) -> Result<impl Responder, AppError> {
    sessions.revoke(&refresh_data.refresh_token).await?;
    Ok(HttpResponse::NoContent().finish())
}
