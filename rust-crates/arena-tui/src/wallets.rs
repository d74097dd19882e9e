use chrono::Utc;
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use serde::Deserialize;
use sha2::{
    Digest,
    Sha256,
};
use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
    sync::atomic::{
        AtomicU64,
        Ordering,
    },
};

const DEFAULT_WALLET_DIR: &str = "~/.arena/wallets";
const PROFILE_EXTENSION: &str = "json";

/// Anything that can name the connected account and turn a request into a
/// submitted transaction reference.
pub trait WalletSigner: Send + Sync {
    fn current_account(&self) -> Option<String>;

    fn sign_and_submit(&self, request: &TransactionRequest) -> Result<String>;
}

/// Carries only the sender, a nonce and its creation time; bets are recorded
/// locally and no contract call is encoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionRequest {
    pub sender: String,
    pub nonce: u64,
    pub created_at: i64,
}

impl TransactionRequest {
    pub fn minimal(sender: impl Into<String>, nonce: u64) -> Self {
        Self {
            sender: sender.into(),
            nonce,
            created_at: Utc::now().timestamp_millis(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct WalletDescriptor {
    pub name: String,
    pub path: PathBuf,
}

impl WalletDescriptor {
    pub fn new(name: impl Into<String>, path: PathBuf) -> Self {
        Self {
            name: name.into(),
            path,
        }
    }
}

#[derive(Deserialize)]
struct WalletProfile {
    address: String,
}

pub fn resolve_wallet_dir(dir: Option<&str>) -> PathBuf {
    let raw = dir.unwrap_or(DEFAULT_WALLET_DIR);
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}

pub fn list_wallets(dir: &Path) -> Result<Vec<WalletDescriptor>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut wallets = Vec::new();
    for entry in fs::read_dir(dir).wrap_err("Failed to read wallet directory")? {
        let entry = entry.wrap_err("Failed to read wallet entry")?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|ext| ext.to_str()) != Some(PROFILE_EXTENSION) {
            continue;
        }
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| eyre!("Invalid wallet filename {:?}", path))?
            .to_owned();
        wallets.push(WalletDescriptor::new(name, path));
    }
    wallets.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(wallets)
}

pub fn find_wallet(dir: &Path, name: &str) -> Result<WalletDescriptor> {
    let wallets = list_wallets(dir)?;
    wallets
        .into_iter()
        .find(|w| w.name == name)
        .ok_or_else(|| eyre!("Wallet '{name}' not found in {}", dir.to_string_lossy()))
}

fn is_valid_address(address: &str) -> bool {
    address
        .strip_prefix("0x")
        .is_some_and(|hex| !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

/// A wallet profile on disk. Signing hashes the request locally.
#[derive(Debug)]
pub struct LocalWallet {
    name: String,
    address: String,
    nonce: AtomicU64,
}

impl LocalWallet {
    pub fn load(descriptor: &WalletDescriptor) -> Result<Self> {
        let raw = fs::read_to_string(&descriptor.path).wrap_err_with(|| {
            format!("Failed to read wallet profile '{}'", descriptor.name)
        })?;
        let profile: WalletProfile = serde_json::from_str(&raw).wrap_err_with(|| {
            format!("Wallet profile '{}' is not valid JSON", descriptor.name)
        })?;
        if !is_valid_address(&profile.address) {
            return Err(eyre!(
                "Wallet '{}' has an invalid address {}",
                descriptor.name,
                profile.address
            ));
        }
        Ok(Self {
            name: descriptor.name.clone(),
            address: profile.address,
            nonce: AtomicU64::new(0),
        })
    }

    pub fn open(dir: &Path, name: &str) -> Result<Self> {
        Self::load(&find_wallet(dir, name)?)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// A fresh request from this wallet with the next nonce.
    pub fn next_request(&self) -> TransactionRequest {
        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);
        TransactionRequest::minimal(self.address.clone(), nonce)
    }
}

impl WalletSigner for LocalWallet {
    fn current_account(&self) -> Option<String> {
        Some(self.address.clone())
    }

    fn sign_and_submit(&self, request: &TransactionRequest) -> Result<String> {
        if request.sender != self.address {
            return Err(eyre!(
                "Wallet '{}' cannot sign for {}",
                self.name,
                request.sender
            ));
        }
        let mut hasher = Sha256::new();
        hasher.update(
            format!("{}|{}|{}", request.sender, request.nonce, request.created_at)
                .as_bytes(),
        );
        let reference = format!("0x{}", hex::encode(hasher.finalize()));
        tracing::info!(wallet = %self.name, %reference, "transaction signed");
        Ok(reference)
    }
}
