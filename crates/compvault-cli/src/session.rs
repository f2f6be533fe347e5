use color_eyre::{eyre::eyre, Report, Result};
use compvault_core::VaultError;
use compvault_records::ComponentSession;
use compvault_store::GitHubContents;
use tracing::debug;

use crate::config::Config;

/// Build a session against the configured GitHub repository.
pub fn github_session(config: &Config) -> Result<ComponentSession<GitHubContents>> {
    config.github.validate().map_err(report)?;
    let gh = config.github.to_github_config();
    let location = gh.location();
    debug!(%location, "initializing GitHub session");
    let api = GitHubContents::new(&gh).map_err(report)?;
    ComponentSession::new(api, location, config.github.encryption_password.clone()).map_err(report)
}

/// Turn a core error into the message shown to the user.
pub fn report(err: VaultError) -> Report {
    match &err {
        VaultError::Decryption { .. } => eyre!(
            "{err}\nThe stored data could not be opened with this password. \
             Run `compvault setup` with the password the data was saved with."
        ),
        VaultError::Conflict { .. } => eyre!(
            "{err}\nSomeone else saved in the meantime; nothing was written. \
             Run the command again to work on the latest data."
        ),
        _ => eyre!("{err}"),
    }
}

/// Helper for tests to construct a session over in-memory contents.
#[cfg(test)]
pub fn test_session(
    api: compvault_core::contents::InMemoryContents,
) -> ComponentSession<compvault_core::contents::InMemoryContents> {
    use compvault_core::revision::StoreLocation;

    ComponentSession::new(
        api,
        StoreLocation::new("acme", crate::config::DEFAULT_REPO),
        "correct-horse-battery",
    )
    .expect("test session")
}
