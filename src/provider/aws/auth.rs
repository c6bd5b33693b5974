//! # AWS Authentication
//!
//! Handles AWS SDK configuration from a Provider's credentials secret.

use crate::provider::ConnectError;
use aws_config::SdkConfig;
use aws_credential_types::Credentials;
use tracing::info;
use zeroize::Zeroizing;

/// Static credentials read from a shared-credentials profile
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: Zeroizing<String>,
    pub session_token: Option<Zeroizing<String>>,
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .finish_non_exhaustive()
    }
}

/// Parse one profile out of an AWS shared-credentials (INI) document
///
/// # Errors
///
/// Returns [`ConnectError::InvalidCredentials`] if the profile is missing or
/// lacks `aws_access_key_id` / `aws_secret_access_key`.
pub fn parse_credentials(document: &str, profile: &str) -> Result<StaticCredentials, ConnectError> {
    let mut in_profile = false;
    let mut found_profile = false;
    let mut access_key_id = None;
    let mut secret_access_key = None;
    let mut session_token = None;

    for line in document.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(section) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            in_profile = section.trim() == profile;
            found_profile |= in_profile;
            continue;
        }
        if !in_profile {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim().to_string();
        match key.trim().to_ascii_lowercase().as_str() {
            "aws_access_key_id" => access_key_id = Some(value),
            "aws_secret_access_key" => secret_access_key = Some(Zeroizing::new(value)),
            "aws_session_token" => session_token = Some(Zeroizing::new(value)),
            _ => {}
        }
    }

    if !found_profile {
        return Err(ConnectError::InvalidCredentials(format!(
            "profile [{profile}] not found"
        )));
    }

    match (access_key_id, secret_access_key) {
        (Some(access_key_id), Some(secret_access_key)) => Ok(StaticCredentials {
            access_key_id,
            secret_access_key,
            session_token,
        }),
        (None, _) => Err(ConnectError::InvalidCredentials(format!(
            "profile [{profile}] has no aws_access_key_id"
        ))),
        (_, None) => Err(ConnectError::InvalidCredentials(format!(
            "profile [{profile}] has no aws_secret_access_key"
        ))),
    }
}

/// Create AWS SDK config with static credentials
///
/// `endpoint_url` routes requests to an alternative endpoint (e.g. a mock server).
pub async fn create_sdk_config(
    region: &str,
    credentials: &StaticCredentials,
    endpoint_url: Option<&str>,
) -> SdkConfig {
    let credentials = Credentials::new(
        credentials.access_key_id.clone(),
        credentials.secret_access_key.as_str(),
        credentials
            .session_token
            .as_ref()
            .map(|token| token.as_str().to_string()),
        None,
        "provider-secret",
    );

    let mut builder = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(region.to_string()))
        .credentials_provider(credentials);

    if let Some(endpoint) = endpoint_url {
        info!("Routing RDS requests to {}", endpoint);
        builder = builder.endpoint_url(endpoint);
    }

    builder.load().await
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = "\
# written by the installer
[other]
aws_access_key_id = OTHER
aws_secret_access_key = other-secret

[default]
aws_access_key_id = AKIAEXAMPLE
aws_secret_access_key = wJalrXUtnFEMI/K7MDENG
";

    #[test]
    fn test_parse_selects_profile() {
        let creds = parse_credentials(DOCUMENT, "default").unwrap();
        assert_eq!(creds.access_key_id, "AKIAEXAMPLE");
        assert_eq!(creds.secret_access_key.as_str(), "wJalrXUtnFEMI/K7MDENG");
        assert!(creds.session_token.is_none());
    }

    #[test]
    fn test_parse_session_token() {
        let document = "[default]\naws_access_key_id=A\naws_secret_access_key=B\naws_session_token=C\n";
        let creds = parse_credentials(document, "default").unwrap();
        assert_eq!(creds.session_token.as_deref().map(String::as_str), Some("C"));
    }

    #[test]
    fn test_parse_missing_profile() {
        let err = parse_credentials(DOCUMENT, "prod").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid credentials: profile [prod] not found"
        );
    }

    #[test]
    fn test_parse_missing_secret() {
        let err = parse_credentials("[default]\naws_access_key_id = A\n", "default").unwrap_err();
        assert!(matches!(err, ConnectError::InvalidCredentials(_)));
    }

    #[test]
    fn test_debug_hides_secret() {
        let creds = parse_credentials(DOCUMENT, "default").unwrap();
        let debug = format!("{creds:?}");
        assert!(!debug.contains("wJalrXUtnFEMI"));
    }
}
