use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::Result;
use crate::providers::wallet::WalletProvider;

/// Plain-text file holding the last exported wallet state.
pub struct WalletStore {
    path: PathBuf,
}

impl WalletStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        WalletStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Contents of the file, or `None` when it does not exist yet.
    pub fn load(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrite the file with `wallet_data`.
    pub fn save(&self, wallet_data: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, wallet_data)?;
        Ok(())
    }

    /// Build the wallet from persisted state, then write its fresh export back.
    ///
    /// The file is rewritten on every call, even when the state did not change.
    pub fn initialize<F>(&self, build: F) -> Result<Arc<dyn WalletProvider>>
    where
        F: FnOnce(Option<&str>) -> Result<Arc<dyn WalletProvider>>,
    {
        let persisted = self.load()?;
        if persisted.is_some() {
            tracing::info!(path = %self.path().display(), "Loading persisted wallet");
        }

        let wallet = build(persisted.as_deref())?;

        let exported = wallet.export()?;
        self.save(&exported)?;
        tracing::info!(
            wallet_id = %wallet.wallet_id(),
            address = %wallet.default_address(),
            network = %wallet.network_id(),
            "Wallet ready"
        );
        Ok(wallet)
    }
}
