//! `check-config` command

use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use vouch_auth::{ContextSource, LdapContextSource, PasswordComparisonAuthenticator};
use vouch_core::VouchConfig;

pub async fn run(config: &VouchConfig, connect: bool) -> anyhow::Result<ExitCode> {
    config.validate()?;

    let source = Arc::new(LdapContextSource::new(config.directory.clone())?);
    let authenticator = PasswordComparisonAuthenticator::from_config(source.clone(), &config.authenticator)?;

    println!("Directory:        {}", config.directory.url);
    println!("Base DN:          {}", source.base_dn());
    for pattern in authenticator.resolver().patterns() {
        println!("DN pattern:       {}", pattern);
    }
    if let Some(search) = &config.authenticator.user_search {
        println!(
            "User search:      {} below '{}'{}",
            search.filter,
            search.search_base,
            if search.search_subtree { " (subtree)" } else { "" }
        );
    }
    println!("Password attr:    {}", config.authenticator.password_attribute);
    println!("Password encoder: {}", config.authenticator.password_encoder);

    if connect {
        // Dropped immediately, the connection is only opened and bound
        source.context().await?;
        info!("Connected to {}", config.directory.url);
        println!("Connection:       ok");
    }

    println!("Configuration is valid");
    Ok(ExitCode::SUCCESS)
}
