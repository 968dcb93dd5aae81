//! Client for the [acme-dns](https://github.com/joohoi/acme-dns) delegation API.
//!
//! acme-dns lets an ACME client solve DNS-01 challenges without write access to the
//! authoritative zone: the domain owner publishes a one-time CNAME from
//! `_acme-challenge.<domain>` to an acme-dns subdomain, and every renewal afterwards only
//! pushes a TXT value to the acme-dns server.
//!
//! The crate has two independent halves:
//!
//! * [`Client`] registers accounts and updates TXT records on one acme-dns server.
//! * [`Storage`] keeps the issued [`Account`]s in a JSON file keyed by domain, so they
//!   survive between renewal runs.
//!
//! # Examples
//!
//! ```no_run
//! use acmedns::{Client, Storage};
//!
//! let client = Client::new("https://auth.acme-dns.io");
//! let mut storage = Storage::new("/etc/acmedns/accounts.json")?;
//!
//! let account = match storage.fetch("example.org") {
//!     Some(account) => account.clone(),
//!     None => {
//!         let account = client.register_account(&[])?;
//!         storage.put("example.org", account.clone());
//!         storage.save()?;
//!         account
//!     }
//! };
//! client.update_txt_record(&account, "LPsIwTo7o8BoG0-vjCyGQGBWSVIPxI-i_X336eUOQZo")?;
//! # Ok::<(), acmedns::Error>(())
//! ```
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod client;
pub mod error;
pub mod storage;

pub use client::Client;
pub use error::{Error, Result};
pub use storage::Storage;

pub const APP_NAME: &str = "acmedns";

/// Sent with every request so acme-dns operators can tell clients apart in their logs.
pub const USER_AGENT_VALUE: &str = concat!("acmedns/", env!("CARGO_PKG_VERSION"));

/// Credentials and identifiers of one acme-dns sub-account.
///
/// Accounts are never edited in place: a re-registration replaces the whole record.
/// All five fields are required when deserializing, so a record missing any of them
/// fails to load instead of surfacing half-populated.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Server-assigned identifier used for TXT updates.
    pub subdomain: String,
    pub username: String,
    pub password: String,
    /// CNAME target for `_acme-challenge.<domain>`.
    pub fulldomain: String,
    /// Base URL of the acme-dns server that issued the account.
    pub server_url: String,
}

impl Account {
    /// The CNAME record the domain owner has to publish to delegate validation of `domain`.
    pub fn cname_record(&self, domain: &str) -> String {
        let domain = domain.strip_prefix("*.").unwrap_or(domain);
        format!("_acme-challenge.{} CNAME {}.", domain, self.fulldomain.trim_end_matches('.'))
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("subdomain", &self.subdomain)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("fulldomain", &self.fulldomain)
            .field("server_url", &self.server_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Account {
        Account {
            subdomain: "8e5700ea-a4bf-41c7-8a77-e990661dcc6a".to_string(),
            username: "c36f50e8-4632-44f0-83fe-e070fef28a10".to_string(),
            password: "htB9mR9DYgcu9bX_afHF62erXaH2TS7bg9KW3F7Z".to_string(),
            fulldomain: "8e5700ea-a4bf-41c7-8a77-e990661dcc6a.auth.acme-dns.io".to_string(),
            server_url: "https://auth.acme-dns.io".to_string(),
        }
    }

    #[test]
    fn debug_output_hides_password() {
        let printed = format!("{:?}", account());
        assert!(printed.contains("8e5700ea-a4bf-41c7-8a77-e990661dcc6a"));
        assert!(!printed.contains("htB9mR9DYgcu9bX_afHF62erXaH2TS7bg9KW3F7Z"));
    }

    #[test]
    fn cname_record_strips_wildcard() {
        let acc = account();
        assert_eq!(
            acc.cname_record("*.example.org"),
            "_acme-challenge.example.org CNAME 8e5700ea-a4bf-41c7-8a77-e990661dcc6a.auth.acme-dns.io."
        );
    }

    #[test]
    fn deserializing_requires_every_field() {
        let missing_server = r#"{"subdomain":"s","username":"u","password":"p","fulldomain":"f"}"#;
        assert!(serde_json::from_str::<Account>(missing_server).is_err());

        let full = r#"{"subdomain":"s","username":"u","password":"p","fulldomain":"f","server_url":"http://x"}"#;
        let acc: Account = serde_json::from_str(full).unwrap();
        assert_eq!(acc.server_url, "http://x");
    }
}
