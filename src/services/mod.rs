//! Business logic services

pub mod auth;
pub mod cleanup_scheduler;
pub mod identity;
pub mod mailer;

pub use auth::AuthService;
pub use cleanup_scheduler::{run_cleanup_pass, start_cleanup_scheduler, CleanupReport};
pub use mailer::{build_mailer, LogMailer, MailKind, MailMessage, Mailer, OutboxMailer, SmtpMailer};
