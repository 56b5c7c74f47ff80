use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{
            AuthResponse, ForgotPasswordRequest, ForgotPasswordResponse, LoginRequest,
            MessageResponse, PublicUser, RefreshRequest, RegisterRequest, ResetPasswordRequest,
            TokenPair, UpdateProfileRequest,
        },
        jwt::JwtKeys,
        password::{burn_password_check, check_password, hash_password},
        repo::UserRepo,
        repo_types::{NewUser, User},
        reset,
    },
    categories::services::seed_default_categories,
    error::{AppError, AppResult, AuthError},
    state::AppState,
    validation::{normalize_email, Validator, NAME_MAX, NAME_MIN},
};

const FORGOT_PASSWORD_MESSAGE: &str = "If the email exists, a password reset link has been sent";

fn issue_tokens(state: &AppState, user: &User) -> AppResult<TokenPair> {
    let keys = JwtKeys::from_config(&state.config.jwt);
    let access_token = keys.sign_access(user.id, &user.email).map_err(|e| {
        error!(error = %e, "jwt sign access failed");
        AppError::Internal(e)
    })?;
    let refresh_token = keys.sign_refresh(user.id, &user.email).map_err(|e| {
        error!(error = %e, "jwt sign refresh failed");
        AppError::Internal(e)
    })?;
    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

#[instrument(skip(state, payload))]
pub async fn register(state: &AppState, payload: RegisterRequest) -> AppResult<AuthResponse> {
    let email = normalize_email(&payload.email);
    let name = payload.name.trim().to_string();

    let mut v = Validator::new();
    v.length("name", &name, NAME_MIN, NAME_MAX)
        .email("email", &email)
        .password("password", &payload.password);
    v.finish()?;

    // Ensure email is not taken
    if state.store.find_user_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::Conflict("User already exists with this email".into()));
    }

    let password_hash = hash_password(&payload.password)?;
    let user = state
        .store
        .create_user(NewUser {
            email,
            name,
            password_hash,
        })
        .await?;

    let seeded = seed_default_categories(state, user.id).await?;
    let tokens = issue_tokens(state, &user)?;

    info!(user_id = %user.id, email = %user.email, seeded, "user registered");
    Ok(AuthResponse {
        user: user.into(),
        tokens,
    })
}

#[instrument(skip(state, payload))]
pub async fn login(state: &AppState, payload: LoginRequest) -> AppResult<AuthResponse> {
    let email = normalize_email(&payload.email);

    let mut v = Validator::new();
    v.email("email", &email)
        .check(!payload.password.is_empty(), "password", "Password is required");
    v.finish()?;

    let Some(user) = state.store.find_user_by_email(&email).await? else {
        burn_password_check(&payload.password);
        warn!(email = %email, "login unknown email");
        return Err(AuthError::InvalidCredentials.into());
    };

    check_password(&payload.password, &user.password_hash).map_err(|e| {
        warn!(user_id = %user.id, "login invalid password");
        e
    })?;

    let tokens = issue_tokens(state, &user)?;
    info!(user_id = %user.id, "user logged in");
    Ok(AuthResponse {
        user: user.into(),
        tokens,
    })
}

#[instrument(skip(state, payload))]
pub async fn refresh(state: &AppState, payload: RefreshRequest) -> AppResult<AuthResponse> {
    if payload.refresh_token.trim().is_empty() {
        return Err(AppError::validation("refreshToken", "Refresh token is required"));
    }

    let keys = JwtKeys::from_config(&state.config.jwt);
    let claims = keys.verify_refresh(&payload.refresh_token).map_err(|e| {
        warn!(error = %e, "refresh token rejected");
        AuthError::from(e)
    })?;

    // The user must still exist for the token to be honoured.
    let Some(user) = state.store.find_user_by_id(claims.sub).await? else {
        warn!(user_id = %claims.sub, "refresh for missing user");
        return Err(AuthError::TokenInvalid.into());
    };

    let tokens = issue_tokens(state, &user)?;
    info!(user_id = %user.id, "tokens refreshed");
    Ok(AuthResponse {
        user: user.into(),
        tokens,
    })
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    state: &AppState,
    payload: ForgotPasswordRequest,
) -> AppResult<ForgotPasswordResponse> {
    let email = normalize_email(&payload.email);
    let mut v = Validator::new();
    v.email("email", &email);
    v.finish()?;

    let mut response = ForgotPasswordResponse {
        message: FORGOT_PASSWORD_MESSAGE.into(),
        reset_token: None,
    };

    // Same answer whether or not the account exists.
    let Some(user) = state.store.find_user_by_email(&email).await? else {
        info!("password reset requested for unknown email");
        return Ok(response);
    };

    let token = reset::generate();
    let expires_at =
        OffsetDateTime::now_utc() + TimeDuration::minutes(state.config.reset_token_ttl_minutes);
    state
        .store
        .set_reset_token(user.id, &token.digest, expires_at)
        .await?;

    if let Err(e) = state.mailer.send_password_reset(&user.email, &token.raw).await {
        // An undeliverable token must not stay redeemable.
        error!(error = %e, user_id = %user.id, "password reset delivery failed");
        state.store.clear_reset_token(user.id).await?;
        return Ok(response);
    }

    if state.config.expose_reset_token {
        response.message = "Password reset token generated".into();
        response.reset_token = Some(token.raw);
    }
    info!(user_id = %user.id, "password reset token issued");
    Ok(response)
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    state: &AppState,
    payload: ResetPasswordRequest,
) -> AppResult<MessageResponse> {
    let mut v = Validator::new();
    v.check(!payload.token.trim().is_empty(), "token", "Reset token is required")
        .password("password", &payload.password);
    v.finish()?;

    let digest = reset::digest(payload.token.trim());
    let Some(user) = state
        .store
        .find_user_by_reset_token(&digest, OffsetDateTime::now_utc())
        .await?
    else {
        warn!("invalid or expired reset token");
        return Err(AppError::validation("token", "Invalid or expired reset token"));
    };

    let password_hash = hash_password(&payload.password)?;
    state.store.update_password(user.id, &password_hash).await?;

    info!(user_id = %user.id, "password reset");
    Ok(MessageResponse::new("Password reset successfully"))
}

#[instrument(skip(state))]
pub async fn profile(state: &AppState, user_id: Uuid) -> AppResult<PublicUser> {
    let user = state.store.find_user_by_id(user_id).await?.ok_or_else(|| {
        warn!(user_id = %user_id, "token for missing user");
        AppError::from(AuthError::TokenInvalid)
    })?;
    Ok(user.into())
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    state: &AppState,
    user_id: Uuid,
    payload: UpdateProfileRequest,
) -> AppResult<PublicUser> {
    let current = state
        .store
        .find_user_by_id(user_id)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    let name = payload
        .name
        .map(|n| n.trim().to_string())
        .unwrap_or(current.name);
    let email = payload
        .email
        .map(|e| normalize_email(&e))
        .unwrap_or(current.email);

    let mut v = Validator::new();
    v.length("name", &name, NAME_MIN, NAME_MAX).email("email", &email);
    v.finish()?;

    let user = state
        .store
        .update_user_profile(user_id, &name, &email)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::Conflict("Email is already in use".into()),
            other => other,
        })?
        .ok_or(AppError::NotFound("User"))?;

    info!(user_id = %user.id, "profile updated");
    Ok(user.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::repo::CategoryRepo;
    use crate::notify::Mailer;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send_password_reset(&self, email: &str, token: &str) -> anyhow::Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((email.to_string(), token.to_string()));
            Ok(())
        }
    }

    fn register_req(email: &str) -> RegisterRequest {
        RegisterRequest {
            name: "Ann Example".into(),
            email: email.into(),
            password: "Passw0rdX".into(),
        }
    }

    #[tokio::test]
    async fn register_normalizes_email_and_seeds_categories() {
        let state = AppState::fake();
        let res = register(&state, register_req("  Ann@Example.COM ")).await.unwrap();
        assert_eq!(res.user.email, "ann@example.com");
        assert!(!res.tokens.access_token.is_empty());

        let categories = state.store.list_categories(res.user.id, None).await.unwrap();
        assert_eq!(categories.len(), 13);
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let state = AppState::fake();
        register(&state, register_req("ann@example.com")).await.unwrap();
        let err = register(&state, register_req("ANN@example.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn register_reports_every_bad_field() {
        let state = AppState::fake();
        let err = register(
            &state,
            RegisterRequest {
                name: "A".into(),
                email: "nope".into(),
                password: "weak".into(),
            },
        )
        .await
        .unwrap_err();
        let AppError::Validation(fields) = err else {
            panic!("expected validation error");
        };
        let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(names, vec!["name", "email", "password"]);
    }

    #[tokio::test]
    async fn login_errors_are_indistinguishable() {
        let state = AppState::fake();
        register(&state, register_req("ann@example.com")).await.unwrap();

        let wrong_password = login(
            &state,
            LoginRequest {
                email: "ann@example.com".into(),
                password: "Wrong0ne".into(),
            },
        )
        .await
        .unwrap_err();
        let unknown_email = login(
            &state,
            LoginRequest {
                email: "bob@example.com".into(),
                password: "Passw0rdX".into(),
            },
        )
        .await
        .unwrap_err();

        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert!(matches!(wrong_password, AppError::Auth(AuthError::InvalidCredentials)));
        assert!(matches!(unknown_email, AppError::Auth(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn refresh_issues_new_pair_for_existing_user() {
        let state = AppState::fake();
        let registered = register(&state, register_req("ann@example.com")).await.unwrap();
        let res = refresh(
            &state,
            RefreshRequest {
                refresh_token: registered.tokens.refresh_token,
            },
        )
        .await
        .unwrap();
        assert_eq!(res.user.id, registered.user.id);
        let keys = JwtKeys::from_config(&state.config.jwt);
        assert!(keys.verify_access(&res.tokens.access_token).is_ok());
    }

    #[tokio::test]
    async fn refresh_rejects_access_token_and_missing_user() {
        let state = AppState::fake();
        let registered = register(&state, register_req("ann@example.com")).await.unwrap();
        let err = refresh(
            &state,
            RefreshRequest {
                refresh_token: registered.tokens.access_token,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::TokenInvalid)));

        let keys = JwtKeys::from_config(&state.config.jwt);
        let orphan = keys.sign_refresh(Uuid::new_v4(), "ghost@example.com").unwrap();
        let err = refresh(&state, RefreshRequest { refresh_token: orphan })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::TokenInvalid)));
    }

    #[tokio::test]
    async fn password_reset_flow_stores_only_the_digest() {
        let mailer = Arc::new(RecordingMailer::default());
        let base = AppState::fake();
        let state = AppState::from_parts(
            Arc::new(MemoryStore::new()),
            base.config.clone(),
            mailer.clone(),
        );
        let registered = register(&state, register_req("ann@example.com")).await.unwrap();

        let res = forgot_password(
            &state,
            ForgotPasswordRequest {
                email: "ann@example.com".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(res.message, FORGOT_PASSWORD_MESSAGE);
        assert!(res.reset_token.is_none());

        let (to, raw) = mailer.sent.lock().unwrap()[0].clone();
        assert_eq!(to, "ann@example.com");
        let stored = state
            .store
            .find_user_by_id(registered.user.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.reset_token_hash.as_deref(), Some(reset::digest(&raw).as_str()));
        assert_ne!(stored.reset_token_hash.as_deref(), Some(raw.as_str()));

        reset_password(
            &state,
            ResetPasswordRequest {
                token: raw.clone(),
                password: "NewPassw0rd".into(),
            },
        )
        .await
        .unwrap();

        let logged_in = login(
            &state,
            LoginRequest {
                email: "ann@example.com".into(),
                password: "NewPassw0rd".into(),
            },
        )
        .await;
        assert!(logged_in.is_ok());

        // Token is single use.
        let err = reset_password(
            &state,
            ResetPasswordRequest {
                token: raw,
                password: "Another0ne".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn expired_reset_token_is_rejected() {
        let state = AppState::fake();
        let registered = register(&state, register_req("ann@example.com")).await.unwrap();
        let token = reset::generate();
        state
            .store
            .set_reset_token(
                registered.user.id,
                &token.digest,
                OffsetDateTime::now_utc() - TimeDuration::minutes(1),
            )
            .await
            .unwrap();
        let err = reset_password(
            &state,
            ResetPasswordRequest {
                token: token.raw,
                password: "NewPassw0rd".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    struct FailingMailer;

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send_password_reset(&self, _email: &str, _token: &str) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("smtp unavailable"))
        }
    }

    #[tokio::test]
    async fn undelivered_reset_token_is_discarded() {
        let base = AppState::fake();
        let mut config = (*base.config).clone();
        config.expose_reset_token = true;
        let state = AppState::from_parts(
            Arc::new(MemoryStore::new()),
            Arc::new(config),
            Arc::new(FailingMailer),
        );
        let registered = register(&state, register_req("ann@example.com")).await.unwrap();

        let res = forgot_password(
            &state,
            ForgotPasswordRequest {
                email: "ann@example.com".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(res.message, FORGOT_PASSWORD_MESSAGE);
        assert!(res.reset_token.is_none());

        let stored = state
            .store
            .find_user_by_id(registered.user.id)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.reset_token_hash.is_none());
        assert!(stored.reset_token_expires_at.is_none());
    }

    #[tokio::test]
    async fn forgot_password_for_unknown_email_looks_the_same() {
        let state = AppState::fake();
        let res = forgot_password(
            &state,
            ForgotPasswordRequest {
                email: "nobody@example.com".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(res.message, FORGOT_PASSWORD_MESSAGE);
        assert!(res.reset_token.is_none());
    }

    #[tokio::test]
    async fn update_profile_checks_email_uniqueness() {
        let state = AppState::fake();
        register(&state, register_req("ann@example.com")).await.unwrap();
        let bob = register(&state, register_req("bob@example.com")).await.unwrap();

        let err = update_profile(
            &state,
            bob.user.id,
            UpdateProfileRequest {
                name: None,
                email: Some("ann@example.com".into()),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let updated = update_profile(
            &state,
            bob.user.id,
            UpdateProfileRequest {
                name: Some("Robert".into()),
                email: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.name, "Robert");
        assert_eq!(updated.email, "bob@example.com");
    }
}
