//! Registration, login, token and password flows

use async_trait::async_trait;
use tracing::info;
use validator::{Validate, ValidationErrors};

use super::{Command, HandlerContext, Query};
use crate::{
    config::AppConfig,
    db::{AdminRepository, EmployeeRepository},
    middleware::{
        auth::{decode_purpose_token, TokenPurpose},
        AuthUser,
    },
    models::{
        AccountProfile, AccountRole, Admin, AuthResponse, ChangePasswordRequest, Employee,
        LoginRequest, RegisterRequest, ResetPasswordRequest, TokenResponse, UpdateProfileRequest,
    },
    services::{
        auth::AuthService,
        identity::{self, Actor},
        mailer::{MailKind, MailMessage},
    },
    utils::{validation::normalize_email, AppError, AppResult},
};

fn validate_registration(
    request: &RegisterRequest,
    config: &AppConfig,
) -> Result<(), ValidationErrors> {
    request.validate()?;
    AuthService::check_password_policy(&config.auth, "password", &request.password)
}

async fn send_verification(ctx: &mut HandlerContext<'_>, actor: &Actor) -> AppResult<()> {
    let profile = actor.profile();
    let token = AuthService::issue_verification_token(
        &ctx.config.auth,
        &profile.id,
        &profile.email,
        profile.role,
    )?;
    ctx.mailer
        .send(MailMessage {
            to: profile.email,
            kind: MailKind::EmailVerification,
            subject: "Verify your email address".to_string(),
            token: Some(token),
        })
        .await?;
    Ok(())
}

/// Register a new admin account (unverified)
pub struct RegisterAdmin {
    pub request: RegisterRequest,
}

#[async_trait]
impl Command for RegisterAdmin {
    type Output = AccountProfile;

    fn validate(&self, config: &AppConfig) -> Result<(), ValidationErrors> {
        validate_registration(&self.request, config)
    }

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<AccountProfile> {
        let email = normalize_email(&self.request.email);
        if identity::email_in_use(&mut *ctx.conn, &email).await? {
            return Err(AppError::conflict("Email address is already registered"));
        }

        let password_hash = AuthService::hash_password(&self.request.password)?;
        let admin = Admin::new(email, self.request.full_name.trim().to_string(), password_hash);
        AdminRepository::new(&mut *ctx.conn).create(&admin).await?;

        let actor = Actor::Admin(admin);
        send_verification(ctx, &actor).await?;

        info!(admin_id = %actor.id(), "Admin registered");
        Ok(actor.profile())
    }
}

/// Register a new employee account (unverified, no organization)
pub struct RegisterEmployee {
    pub request: RegisterRequest,
}

#[async_trait]
impl Command for RegisterEmployee {
    type Output = AccountProfile;

    fn validate(&self, config: &AppConfig) -> Result<(), ValidationErrors> {
        validate_registration(&self.request, config)
    }

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<AccountProfile> {
        let email = normalize_email(&self.request.email);
        if identity::email_in_use(&mut *ctx.conn, &email).await? {
            return Err(AppError::conflict("Email address is already registered"));
        }

        let password_hash = AuthService::hash_password(&self.request.password)?;
        let employee =
            Employee::new(email, self.request.full_name.trim().to_string(), password_hash);
        EmployeeRepository::new(&mut *ctx.conn)
            .create(&employee)
            .await?;

        let actor = Actor::Employee(employee);
        send_verification(ctx, &actor).await?;

        info!(employee_id = %actor.id(), "Employee registered");
        Ok(actor.profile())
    }
}

/// Exchange credentials for an access/refresh token pair
pub struct Login {
    pub request: LoginRequest,
}

#[async_trait]
impl Query for Login {
    type Output = AuthResponse;

    fn validate(&self, _config: &AppConfig) -> Result<(), ValidationErrors> {
        self.request.validate()
    }

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<AuthResponse> {
        let email = normalize_email(&self.request.email);
        let invalid = || AppError::unauthorized("Invalid email or password");

        let actor = identity::find_account_by_email(&mut *ctx.conn, &email)
            .await?
            .ok_or_else(invalid)?;
        let (password_hash, is_verified) = match &actor {
            Actor::Admin(admin) => (&admin.password_hash, admin.is_verified),
            Actor::Employee(employee) => (&employee.password_hash, employee.is_verified),
        };

        if !AuthService::verify_password(&self.request.password, password_hash)? {
            return Err(invalid());
        }
        if !is_verified {
            return Err(AppError::bad_request("Email address is not verified"));
        }

        info!(account_id = %actor.id(), role = %actor.role(), "Login succeeded");
        AuthService::issue_session(&ctx.config.auth, actor.profile())
    }
}

/// Issue a new access token from a `refresh` token
pub struct RefreshToken {
    pub refresh_token: String,
}

#[async_trait]
impl Query for RefreshToken {
    type Output = TokenResponse;

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<TokenResponse> {
        let claims = decode_purpose_token(
            &self.refresh_token,
            &ctx.config.auth.jwt_secret,
            TokenPurpose::Refresh,
        )?;
        let actor = identity::find_account(&mut *ctx.conn, claims.subject_id()?, claims.role)
            .await?
            .ok_or_else(|| AppError::unauthorized("Account no longer exists"))?;
        let profile = actor.profile();

        AuthService::issue_access(&ctx.config.auth, &profile.id, &profile.email, profile.role)
    }
}

/// Confirm an email address with an `email_verification` token
pub struct VerifyEmail {
    pub token: String,
}

#[async_trait]
impl Command for VerifyEmail {
    type Output = AccountProfile;

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<AccountProfile> {
        let claims = decode_purpose_token(
            &self.token,
            &ctx.config.auth.jwt_secret,
            TokenPurpose::EmailVerification,
        )?;
        let mut actor = identity::find_account(&mut *ctx.conn, claims.subject_id()?, claims.role)
            .await?
            .ok_or_else(|| AppError::not_found("Account not found"))?;

        match &mut actor {
            Actor::Admin(admin) => admin.verify()?,
            Actor::Employee(employee) => employee.verify()?,
        }
        identity::save_actor(&mut *ctx.conn, &actor).await?;

        info!(account_id = %actor.id(), "Email verified");
        Ok(actor.profile())
    }
}

/// Send a fresh verification token. Unknown or verified emails are ignored.
pub struct ResendVerification {
    pub email: String,
}

#[async_trait]
impl Query for ResendVerification {
    type Output = ();

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<()> {
        let email = normalize_email(&self.email);
        let Some(actor) = identity::find_account_by_email(&mut *ctx.conn, &email).await? else {
            return Ok(());
        };
        let verified = match &actor {
            Actor::Admin(admin) => admin.is_verified,
            Actor::Employee(employee) => employee.is_verified,
        };
        if !verified {
            send_verification(ctx, &actor).await?;
        }
        Ok(())
    }
}

/// Mail a `password_recovery` token. Unknown emails are ignored.
pub struct RequestPasswordRecovery {
    pub email: String,
}

#[async_trait]
impl Query for RequestPasswordRecovery {
    type Output = ();

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<()> {
        let email = normalize_email(&self.email);
        let Some(actor) = identity::find_account_by_email(&mut *ctx.conn, &email).await? else {
            return Ok(());
        };
        let profile = actor.profile();
        let token = AuthService::issue_recovery_token(
            &ctx.config.auth,
            &profile.id,
            &profile.email,
            profile.role,
        )?;
        ctx.mailer
            .send(MailMessage {
                to: profile.email,
                kind: MailKind::PasswordRecovery,
                subject: "Reset your password".to_string(),
                token: Some(token),
            })
            .await?;
        Ok(())
    }
}

/// Set a new password with a `password_recovery` token
pub struct ResetPassword {
    pub request: ResetPasswordRequest,
}

#[async_trait]
impl Command for ResetPassword {
    type Output = ();

    fn validate(&self, config: &AppConfig) -> Result<(), ValidationErrors> {
        self.request.validate()?;
        AuthService::check_password_policy(&config.auth, "new_password", &self.request.new_password)
    }

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<()> {
        let claims = decode_purpose_token(
            &self.request.token,
            &ctx.config.auth.jwt_secret,
            TokenPurpose::PasswordRecovery,
        )?;
        let mut actor = identity::find_account(&mut *ctx.conn, claims.subject_id()?, claims.role)
            .await?
            .ok_or_else(|| AppError::not_found("Account not found"))?;

        set_password(&mut actor, &self.request.new_password)?;
        identity::save_actor(&mut *ctx.conn, &actor).await?;

        info!(account_id = %actor.id(), "Password reset");
        Ok(())
    }
}

/// Change the caller's password
pub struct ChangePassword {
    pub user: AuthUser,
    pub request: ChangePasswordRequest,
}

#[async_trait]
impl Command for ChangePassword {
    type Output = ();

    fn validate(&self, config: &AppConfig) -> Result<(), ValidationErrors> {
        self.request.validate()?;
        AuthService::check_password_policy(&config.auth, "new_password", &self.request.new_password)
    }

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<()> {
        let mut actor = identity::load_actor(&mut *ctx.conn, &self.user).await?;
        let current_hash = match &actor {
            Actor::Admin(admin) => &admin.password_hash,
            Actor::Employee(employee) => &employee.password_hash,
        };
        if !AuthService::verify_password(&self.request.current_password, current_hash)? {
            return Err(AppError::unauthorized("Current password is incorrect"));
        }

        set_password(&mut actor, &self.request.new_password)?;
        identity::save_actor(&mut *ctx.conn, &actor).await?;
        Ok(())
    }
}

fn set_password(actor: &mut Actor, password: &str) -> AppResult<()> {
    let hash = AuthService::hash_password(password)?;
    let now = chrono::Utc::now();
    match actor {
        Actor::Admin(admin) => {
            admin.password_hash = hash;
            admin.updated_at = now;
        }
        Actor::Employee(employee) => {
            employee.password_hash = hash;
            employee.updated_at = now;
        }
    }
    Ok(())
}

/// The caller's own profile
pub struct GetProfile {
    pub user: AuthUser,
}

#[async_trait]
impl Query for GetProfile {
    type Output = AccountProfile;

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<AccountProfile> {
        Ok(identity::load_actor(&mut *ctx.conn, &self.user)
            .await?
            .profile())
    }
}

pub struct UpdateProfile {
    pub user: AuthUser,
    pub request: UpdateProfileRequest,
}

#[async_trait]
impl Command for UpdateProfile {
    type Output = AccountProfile;

    fn validate(&self, _config: &AppConfig) -> Result<(), ValidationErrors> {
        self.request.validate()
    }

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<AccountProfile> {
        let mut actor = identity::load_actor(&mut *ctx.conn, &self.user).await?;
        let full_name = self.request.full_name.trim().to_string();
        let now = chrono::Utc::now();
        match &mut actor {
            Actor::Admin(admin) => {
                admin.full_name = full_name;
                admin.updated_at = now;
            }
            Actor::Employee(employee) => {
                employee.full_name = full_name;
                employee.updated_at = now;
            }
        }
        identity::save_actor(&mut *ctx.conn, &actor).await?;
        Ok(actor.profile())
    }
}
