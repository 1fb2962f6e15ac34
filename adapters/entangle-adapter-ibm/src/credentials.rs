//! IBM Quantum credentials.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{IbmError, IbmResult};

/// Environment variable holding an IBM Cloud API key.
pub const ENV_API_KEY: &str = "IBM_API_KEY";
/// Environment variable holding the service instance CRN.
pub const ENV_SERVICE_CRN: &str = "IBM_SERVICE_CRN";
/// Environment variable holding a legacy IBM Quantum token.
pub const ENV_LEGACY_TOKEN: &str = "IBM_QUANTUM_TOKEN";

/// How to authenticate against IBM Quantum.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "channel", rename_all = "snake_case")]
pub enum IbmCredentials {
    /// IBM Cloud API key exchanged for an IAM bearer token.
    Cloud {
        /// IBM Cloud API key.
        api_key: String,
        /// Service instance CRN sent on every request.
        service_crn: String,
    },
    /// Direct bearer token for the legacy endpoint.
    Legacy {
        /// IBM Quantum API token.
        token: String,
    },
}

impl IbmCredentials {
    /// Read credentials from the environment.
    ///
    /// `IBM_API_KEY` takes priority and requires `IBM_SERVICE_CRN`;
    /// otherwise `IBM_QUANTUM_TOKEN` selects the legacy endpoint.
    pub fn from_env() -> IbmResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve credentials through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> IbmResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(api_key) = non_empty(ENV_API_KEY) {
            let service_crn = non_empty(ENV_SERVICE_CRN).ok_or(IbmError::MissingServiceCrn)?;
            return Ok(Self::Cloud {
                api_key,
                service_crn,
            });
        }
        if let Some(token) = non_empty(ENV_LEGACY_TOKEN) {
            return Ok(Self::Legacy { token });
        }
        Err(IbmError::MissingToken)
    }

    /// Short name of the channel.
    pub fn channel(&self) -> &'static str {
        match self {
            Self::Cloud { .. } => "cloud",
            Self::Legacy { .. } => "legacy",
        }
    }
}

impl fmt::Debug for IbmCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cloud { service_crn, .. } => f
                .debug_struct("Cloud")
                .field("api_key", &"[REDACTED]")
                .field("service_crn", service_crn)
                .finish(),
            Self::Legacy { .. } => f
                .debug_struct("Legacy")
                .field("token", &"[REDACTED]")
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_cloud_takes_priority() {
        let creds = IbmCredentials::from_lookup(lookup(&[
            (ENV_API_KEY, "key"),
            (ENV_SERVICE_CRN, "crn:v1:bluemix"),
            (ENV_LEGACY_TOKEN, "legacy"),
        ]))
        .unwrap();
        assert_eq!(creds.channel(), "cloud");
    }

    #[test]
    fn test_api_key_without_crn() {
        let err = IbmCredentials::from_lookup(lookup(&[(ENV_API_KEY, "key")])).unwrap_err();
        assert!(matches!(err, IbmError::MissingServiceCrn));
    }

    #[test]
    fn test_legacy_fallback_and_missing() {
        let creds = IbmCredentials::from_lookup(lookup(&[(ENV_LEGACY_TOKEN, "tok")])).unwrap();
        assert_eq!(
            creds,
            IbmCredentials::Legacy {
                token: "tok".into()
            }
        );

        let err = IbmCredentials::from_lookup(lookup(&[(ENV_LEGACY_TOKEN, "  ")])).unwrap_err();
        assert!(matches!(err, IbmError::MissingToken));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = IbmCredentials::Cloud {
            api_key: "super-secret".into(),
            service_crn: "crn:v1".into(),
        };
        let debug = format!("{creds:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("crn:v1"));
    }

    #[test]
    fn test_yaml_shape() {
        let creds = IbmCredentials::Legacy {
            token: "tok".into(),
        };
        let json = serde_json::to_value(&creds).unwrap();
        assert_eq!(json["channel"], "legacy");
        assert_eq!(json["token"], "tok");
    }
}
