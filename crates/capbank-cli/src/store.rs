//! State file - the persisted bank plus the wallets it has paid into

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use capbank_ledger::{Bank, BankSnapshot, Wallets};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StateFile {
    bank: BankSnapshot,
    #[serde(default)]
    wallets: Wallets,
}

/// JSON-file store for one bank
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Write a fresh bank, refusing to clobber an existing one unless `force`
    pub fn create(&self, bank: &Bank, force: bool) -> anyhow::Result<()> {
        if self.exists() && !force {
            bail!(
                "a bank already exists at {} (use --force to replace it)",
                self.path.display()
            );
        }
        self.save(bank, &Wallets::new())
    }

    pub fn load(&self) -> anyhow::Result<(Bank, Wallets)> {
        if !self.exists() {
            bail!(
                "no bank at {} (run `capbank init` first)",
                self.path.display()
            );
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let state: StateFile = serde_json::from_str(&raw)
            .with_context(|| format!("corrupt state file {}", self.path.display()))?;
        let bank = Bank::from_snapshot(state.bank)
            .with_context(|| format!("refusing to load {}", self.path.display()))?;
        Ok((bank, state.wallets))
    }

    /// Persist via a temporary file and rename, so a crash never leaves a
    /// half-written state file behind
    pub fn save(&self, bank: &Bank, wallets: &Wallets) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let state = StateFile {
            bank: bank.snapshot(),
            wallets: wallets.clone(),
        };
        let json = serde_json::to_string_pretty(&state)?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        Ok(())
    }
}
