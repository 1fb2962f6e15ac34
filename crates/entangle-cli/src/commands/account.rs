//! Account command implementations.
//!
//! The account file holds IBM Quantum credentials and a default backend.
//! Environment variables take precedence over it.

use std::path::Path;

use anyhow::Result;
use console::style;

use entangle_adapter_ibm::{ENV_API_KEY, ENV_LEGACY_TOKEN, ENV_SERVICE_CRN, IbmCredentials};

use super::common::{Account, state_dir};

/// Execute `account save`.
pub fn execute_save(
    api_key: Option<&str>,
    service_crn: Option<&str>,
    token: Option<&str>,
    default_backend: Option<&str>,
) -> Result<()> {
    let dir = state_dir()?;
    let path = save(&dir, api_key, service_crn, token, default_backend)?;
    println!(
        "{} Account saved to {}",
        style("✓").green().bold(),
        style(path.display()).dim()
    );
    Ok(())
}

/// Execute `account show`.
pub fn execute_show() -> Result<()> {
    let dir = state_dir()?;
    let account = Account::load(&dir)?;

    if account == Account::default() {
        println!("No saved account.");
        return Ok(());
    }

    println!("{} Saved account:", style("→").cyan().bold());
    match &account.credentials {
        Some(IbmCredentials::Cloud { service_crn, .. }) => {
            println!("  Channel: {}", style("cloud").green());
            println!("  API key: {}", style("[REDACTED]").dim());
            println!("  Service CRN: {service_crn}");
        }
        Some(IbmCredentials::Legacy { .. }) => {
            println!("  Channel: {}", style("legacy").green());
            println!("  Token: {}", style("[REDACTED]").dim());
        }
        None => println!("  Credentials: {}", style("none").dim()),
    }
    println!(
        "  Default backend: {}",
        style(account.default_backend.as_deref().unwrap_or("simulator")).yellow()
    );
    println!("  File: {}", style(Account::path(&dir).display()).dim());
    Ok(())
}

/// Execute `account clear`.
pub fn execute_clear() -> Result<()> {
    let dir = state_dir()?;
    if Account::clear(&dir)? {
        println!("{} Account removed", style("✓").green().bold());
    } else {
        println!("No saved account.");
    }
    Ok(())
}

/// Merge the given values into the saved account and write it.
///
/// Credential flags are resolved like the environment: an API key needs a
/// service CRN and wins over a legacy token. Without credential flags the
/// saved credentials are kept.
fn save(
    dir: &Path,
    api_key: Option<&str>,
    service_crn: Option<&str>,
    token: Option<&str>,
    default_backend: Option<&str>,
) -> Result<std::path::PathBuf> {
    let mut account = Account::load(dir)?;

    if api_key.is_some() || service_crn.is_some() || token.is_some() {
        let credentials = IbmCredentials::from_lookup(|key| {
            match key {
                ENV_API_KEY => api_key,
                ENV_SERVICE_CRN => service_crn,
                ENV_LEGACY_TOKEN => token,
                _ => None,
            }
            .map(str::to_string)
        })?;
        account.credentials = Some(credentials);
    } else if default_backend.is_none() {
        anyhow::bail!("Nothing to save. Pass --api-key and --service-crn, --token, or --default-backend");
    }

    if let Some(backend) = default_backend {
        account.default_backend = Some(backend.to_string());
    }

    account.save(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_cloud_credentials() {
        let dir = tempfile::tempdir().unwrap();
        save(dir.path(), Some("key"), Some("crn:v1"), None, None).unwrap();
        let account = Account::load(dir.path()).unwrap();
        assert_eq!(account.credentials.unwrap().channel(), "cloud");
        assert_eq!(account.default_backend, None);
    }

    #[test]
    fn test_save_keeps_credentials_when_only_backend_changes() {
        let dir = tempfile::tempdir().unwrap();
        save(dir.path(), None, None, Some("tok"), None).unwrap();
        save(dir.path(), None, None, None, Some("least-busy")).unwrap();

        let account = Account::load(dir.path()).unwrap();
        assert_eq!(
            account.credentials,
            Some(IbmCredentials::Legacy {
                token: "tok".into()
            })
        );
        assert_eq!(account.default_backend.as_deref(), Some("least-busy"));
    }

    #[test]
    fn test_save_rejects_incomplete_input() {
        let dir = tempfile::tempdir().unwrap();
        assert!(save(dir.path(), Some("key"), None, None, None).is_err());
        assert!(save(dir.path(), None, None, None, None).is_err());
        assert!(!Account::path(dir.path()).exists());
    }
}
