//! Accounts persisted in a JSON file, keyed by domain.
//!
//! The file holds a single object mapping each domain to its [`Account`]:
//!
//! ```json
//! {
//!   "example.org": {
//!     "subdomain": "8e5700ea-a4bf-41c7-8a77-e990661dcc6a",
//!     "username": "c36f50e8-4632-44f0-83fe-e070fef28a10",
//!     "password": "htB9mR9DYgcu9bX_afHF62erXaH2TS7bg9KW3F7Z",
//!     "fulldomain": "8e5700ea-a4bf-41c7-8a77-e990661dcc6a.auth.acme-dns.io",
//!     "server_url": "https://auth.acme-dns.io"
//!   }
//! }
//! ```
//!
//! Only [`Storage::save`] writes the file, and only [`Storage::load`] (also run by the
//! constructors) reads it into memory. `save` re-reads the file first and keeps entries
//! written by other processes in the meantime. There is no locking, so two saves at the
//! same instant can still lose one of them.
use crate::error::{Error, Result};
use crate::Account;
use log::{debug, info};
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Mode for a newly created storage file: it holds credentials.
pub const DEFAULT_PERMISSION: u32 = 0o600;

type Accounts = BTreeMap<String, Account>;

#[derive(Debug)]
pub struct Storage {
    path: PathBuf,
    permission: u32,
    accounts: Accounts,
}

impl Storage {
    /// Opens the storage at `path`. A missing file is an empty storage.
    pub fn new(path: impl Into<PathBuf>) -> Result<Storage> {
        Storage::with_permission(path, DEFAULT_PERMISSION)
    }

    /// Like [`Storage::new`], with the Unix mode used if `save` has to create the file.
    pub fn with_permission(path: impl Into<PathBuf>, permission: u32) -> Result<Storage> {
        let mut storage = Storage {
            path: path.into(),
            permission,
            accounts: Accounts::new(),
        };
        storage.load()?;
        Ok(storage)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the in-memory accounts with the file content.
    pub fn load(&mut self) -> Result<()> {
        self.accounts = read_accounts(&self.path)?;
        debug!(
            "loaded {} account(s) from {}",
            self.accounts.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Looks up the account for `domain`; `*.example.org` finds the entry of `example.org`.
    pub fn fetch(&self, domain: &str) -> Option<&Account> {
        self.accounts.get(storage_key(domain))
    }

    /// Stores `account` for `domain` in memory, replacing any previous one.
    ///
    /// A wildcard domain is stored under its base domain, as both are validated through
    /// the same `_acme-challenge` record.
    pub fn put(&mut self, domain: &str, account: Account) {
        self.accounts.insert(storage_key(domain).to_string(), account);
    }

    /// Writes the accounts to the file, merged over whatever the file holds now.
    ///
    /// In-memory entries win on conflict. The merged set becomes the in-memory state.
    pub fn save(&mut self) -> Result<()> {
        let mut merged = read_accounts(&self.path)?;
        merged.extend(
            self.accounts
                .iter()
                .map(|(domain, account)| (domain.clone(), account.clone())),
        );

        let serialized = serde_json::to_string_pretty(&merged).map_err(|source| Error::Format {
            context: self.path.display().to_string(),
            source,
        })?;
        self.write(serialized.as_bytes())?;

        info!(
            "saved {} account(s) to {}",
            merged.len(),
            self.path.display()
        );
        self.accounts = merged;
        Ok(())
    }

    /// Stored domains, in sorted order.
    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.accounts.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Writes `payload` to a temporary file next to the storage file and renames it into
    /// place, so readers never see a truncated or half-written file.
    fn write(&self, payload: &[u8]) -> Result<()> {
        let io_error = |source| Error::Io {
            path: self.path.clone(),
            source,
        };
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(io_error)?;

        let mut file = NamedTempFile::new_in(dir).map_err(io_error)?;
        file.write_all(payload).map_err(io_error)?;
        file.as_file().sync_all().map_err(io_error)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = match fs::metadata(&self.path) {
                Ok(existing) => existing.permissions(),
                Err(_) => fs::Permissions::from_mode(self.permission),
            };
            file.as_file().set_permissions(permissions).map_err(io_error)?;
        }
        file.persist(&self.path).map_err(|persist| io_error(persist.error))?;
        Ok(())
    }
}

fn storage_key(domain: &str) -> &str {
    domain.strip_prefix("*.").unwrap_or(domain)
}

/// Reads the accounts file. Missing and blank files are both empty.
fn read_accounts(path: &Path) -> Result<Accounts> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Accounts::new()),
        Err(source) => {
            return Err(Error::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    if content.trim().is_empty() {
        return Ok(Accounts::new());
    }
    serde_json::from_str(&content).map_err(|source| Error::Format {
        context: path.display().to_string(),
        source,
    })
}
