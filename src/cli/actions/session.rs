use crate::auth::{AdminPolicy, Session};
use crate::cli::globals::GlobalArgs;
use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Serialize;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub refresh_token: Option<SecretString>,
    pub admin_emails: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionReport<'a> {
    pub authenticated: bool,
    pub admin: bool,
    pub session: Option<&'a Session>,
}

impl<'a> SessionReport<'a> {
    #[must_use]
    pub fn new(session: Option<&'a Session>, policy: &AdminPolicy) -> Self {
        Self {
            authenticated: session.is_some(),
            admin: session.is_some_and(|session| policy.allows(session)),
            session,
        }
    }
}

/// Restore the stored session and print what the site would render.
///
/// # Errors
/// Returns an error if the provider cannot be reached or rejects the request.
pub async fn execute(args: Args) -> Result<()> {
    let controller = args.globals.controller(args.refresh_token)?;

    let session = controller
        .bootstrap()
        .await
        .context("failed to restore session")?;
    if session.is_none() {
        info!("no active session");
    }

    let policy = AdminPolicy::new(&args.admin_emails);
    let report = SessionReport::new(session.as_ref(), &policy);
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn session(email: &str) -> Session {
        Session::new(
            "user-1",
            email,
            SecretString::from("access-secret".to_string()),
            None,
            DateTime::<Utc>::from_timestamp(1_900_000_000, 0).unwrap(),
        )
    }

    #[test]
    fn report_marks_admins() {
        let policy = AdminPolicy::new(["admin@example.com"]);
        let admin = session("admin@example.com");

        let report = SessionReport::new(Some(&admin), &policy);
        assert!(report.authenticated);
        assert!(report.admin);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["session"]["email"], "admin@example.com");
        assert!(!json.to_string().contains("access-secret"));
    }

    #[test]
    fn report_without_session() {
        let report = SessionReport::new(None, &AdminPolicy::default());
        assert!(!report.authenticated);
        assert!(!report.admin);
        assert_eq!(
            serde_json::to_value(&report).unwrap()["session"],
            serde_json::Value::Null
        );
    }
}
