//! AWS Credentials
//!
//! Resolves static credentials from the environment or from the shared
//! credentials file (`~/.aws/credentials`).

use anyhow::{anyhow, Context, Result};
use std::fmt;
use std::path::PathBuf;

/// Profile used when nothing else is configured
pub const DEFAULT_PROFILE: &str = "default";

/// Static access key credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl Credentials {
    pub fn new(access_key_id: &str, secret_access_key: &str, session_token: Option<&str>) -> Self {
        Self {
            access_key_id: access_key_id.to_string(),
            secret_access_key: secret_access_key.to_string(),
            session_token: session_token.map(|s| s.to_string()),
        }
    }
}

// Security: never print the secret or the session token
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &mask_credential(&self.access_key_id))
            .field("secret_access_key", &"***")
            .field("session_token", &self.session_token.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Mask a credential value for logging
pub fn mask_credential(value: &str) -> String {
    let count = value.chars().count();
    if count <= 8 {
        "*".repeat(count)
    } else {
        let head: String = value.chars().take(4).collect();
        let tail: String = value.chars().skip(count - 4).collect();
        format!("{}...{}", head, tail)
    }
}

/// Validate a profile name before using it to select a file section.
/// Names are non-empty and limited to letters, digits and `-_.@+`.
pub fn validate_profile_name(profile: &str) -> bool {
    !profile.is_empty()
        && profile.len() <= 128
        && profile
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@' | '+'))
}

/// Profile from `AWS_PROFILE`, or `default`
pub fn default_profile() -> String {
    match std::env::var("AWS_PROFILE") {
        Ok(profile) if validate_profile_name(&profile) => profile,
        Ok(_) => {
            tracing::warn!("Invalid profile name in AWS_PROFILE, using default");
            DEFAULT_PROFILE.to_string()
        }
        Err(_) => DEFAULT_PROFILE.to_string(),
    }
}

/// Location of the shared credentials file
pub fn credentials_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("AWS_SHARED_CREDENTIALS_FILE") {
        return Some(PathBuf::from(path));
    }

    dirs::home_dir().map(|p| p.join(".aws").join("credentials"))
}

/// Credentials from `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY`
pub fn from_env() -> Option<Credentials> {
    let access_key_id = std::env::var("AWS_ACCESS_KEY_ID").ok()?;
    let secret_access_key = std::env::var("AWS_SECRET_ACCESS_KEY").ok()?;
    if access_key_id.is_empty() || secret_access_key.is_empty() {
        return None;
    }

    let session_token = std::env::var("AWS_SESSION_TOKEN")
        .ok()
        .filter(|t| !t.is_empty());

    Some(Credentials {
        access_key_id,
        secret_access_key,
        session_token,
    })
}

/// Read the `[profile]` section of a credentials file
pub fn parse_credentials_file(content: &str, profile: &str) -> Option<Credentials> {
    let mut in_section = false;
    let mut access_key_id = None;
    let mut secret_access_key = None;
    let mut session_token = None;

    for line in content.lines() {
        let line = line.trim();
        // Security: Skip comments and empty lines
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            if in_section {
                break;
            }
            in_section = line[1..line.len() - 1].trim() == profile;
            continue;
        }

        if !in_section {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim().to_string();
        match key.trim() {
            "aws_access_key_id" => access_key_id = Some(value),
            "aws_secret_access_key" => secret_access_key = Some(value),
            "aws_session_token" => session_token = Some(value),
            _ => {}
        }
    }

    Some(Credentials {
        access_key_id: access_key_id.filter(|v| !v.is_empty())?,
        secret_access_key: secret_access_key.filter(|v| !v.is_empty())?,
        session_token: session_token.filter(|v| !v.is_empty()),
    })
}

/// Resolve credentials for `profile`.
///
/// Environment variables win over the credentials file, matching the AWS CLI.
pub fn load_credentials(profile: &str) -> Result<Credentials> {
    if let Some(credentials) = from_env() {
        tracing::debug!(
            "Using credentials from environment, access_key: {}",
            mask_credential(&credentials.access_key_id)
        );
        return Ok(credentials);
    }

    if !validate_profile_name(profile) {
        return Err(anyhow!("Invalid profile name: {:?}", profile));
    }

    let path = credentials_file_path()
        .ok_or_else(|| anyhow!("No credentials - set AWS_ACCESS_KEY_ID or run 'aws configure'"))?;

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("No credentials - could not read {}", path.display()))?;

    let credentials = parse_credentials_file(&content, profile).ok_or_else(|| {
        anyhow!(
            "No credentials for profile '{}' in {}",
            profile,
            path.display()
        )
    })?;

    tracing::debug!(
        "Using credentials for profile {}, access_key: {}",
        profile,
        mask_credential(&credentials.access_key_id)
    );
    Ok(credentials)
}
