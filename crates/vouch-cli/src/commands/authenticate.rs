//! `authenticate` command

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};
use vouch_auth::{
    AuthResult, ContextSource, Identity, InMemoryDirectory, LdapContextSource,
    PasswordComparisonAuthenticator,
};
use vouch_core::config::AuthenticatorConfig;
use vouch_core::VouchConfig;

pub async fn run(
    config: &VouchConfig,
    username: &str,
    password: &str,
    fixture: Option<PathBuf>,
    json: bool,
) -> anyhow::Result<ExitCode> {
    let result = match fixture {
        Some(path) => {
            let content = std::fs::read_to_string(&path)?;
            let directory = InMemoryDirectory::from_json(&content)?;
            info!("Loaded {} fixture entries from {:?}", directory.len(), path);
            authenticate(Arc::new(directory), &config.authenticator, username, password).await
        }
        None => {
            let source = LdapContextSource::new(config.directory.clone())?;
            authenticate(Arc::new(source), &config.authenticator, username, password).await
        }
    };

    match result {
        Ok(identity) => {
            info!("Authenticated {} as {}", username, identity.location);
            print_identity(&identity, json)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if e.is_authentication_failure() => {
            warn!("Authentication failed for {}: {}", username, e.code());
            eprintln!("{}", e.public_message());
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e.into()),
    }
}

async fn authenticate<S: ContextSource + 'static>(
    source: Arc<S>,
    config: &AuthenticatorConfig,
    username: &str,
    password: &str,
) -> AuthResult<Identity> {
    let authenticator = PasswordComparisonAuthenticator::from_config(source, config)?;
    authenticator.authenticate(username, password).await
}

fn print_identity(identity: &Identity, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(identity)?);
        return Ok(());
    }

    println!("Authenticated: {}", identity.username);
    println!("DN:            {}", identity.location);
    for (name, values) in identity.attributes.iter() {
        println!("  {}: {}", name, values.join(", "));
    }
    Ok(())
}
