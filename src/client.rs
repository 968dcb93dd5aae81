//! HTTP side of acme-dns: account registration and TXT record updates.
//!
//! ```text
//! POST {base}/register     {"allowfrom": ["192.0.2.0/24"]}   -> 201 + account JSON
//! POST {base}/update       {"subdomain": "..", "txt": ".."}  -> 200
//!                          X-Api-User / X-Api-Key headers
//! ```
//!
//! Every call is a single blocking attempt; there is no retry here. Timeouts are whatever
//! the `reqwest` client was built with, see [`Client::with_http_client`].
use crate::error::{Error, Result};
use crate::{Account, USER_AGENT_VALUE};
use log::{debug, info, warn};
use reqwest::blocking::{Client as HttpClient, RequestBuilder};
use reqwest::header::USER_AGENT;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

const API_USER_HEADER: &str = "X-Api-User";
const API_KEY_HEADER: &str = "X-Api-Key";

#[derive(Serialize)]
struct RegisterRequest<'a> {
    allowfrom: &'a [&'a str],
}

/// The registration response also echoes `allowfrom`; only the credentials are kept.
#[derive(Deserialize)]
struct RegisterResponse {
    subdomain: String,
    username: String,
    password: String,
    fulldomain: String,
}

#[derive(Serialize)]
struct UpdateRequest<'a> {
    subdomain: &'a str,
    txt: &'a str,
}

/// Talks to a single acme-dns server.
#[derive(Debug, Clone)]
pub struct Client {
    http: HttpClient,
    base_url: String,
}

impl Client {
    pub fn new(base_url: impl Into<String>) -> Client {
        Client::with_http_client(base_url, HttpClient::new())
    }

    /// Uses a caller-built `reqwest` client, e.g. one with a request timeout or a proxy.
    pub fn with_http_client(base_url: impl Into<String>, http: HttpClient) -> Client {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Client { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Registers a new account.
    ///
    /// `allow_from` is a list of CIDR ranges allowed to update the account's TXT record.
    /// When empty, no body is sent and the server applies its default policy.
    pub fn register_account(&self, allow_from: &[&str]) -> Result<Account> {
        let url = self.endpoint("register");
        debug!("registering account at {} (allowfrom: {:?})", url, allow_from);

        let mut request = self.http.post(&url).header(USER_AGENT, USER_AGENT_VALUE);
        if !allow_from.is_empty() {
            request = request.json(&RegisterRequest {
                allowfrom: allow_from,
            });
        }
        let body = self.execute(&url, request, StatusCode::CREATED)?;

        let registered: RegisterResponse =
            serde_json::from_str(&body).map_err(|source| Error::Format {
                context: "registration response".to_string(),
                source,
            })?;
        info!(
            "registered account {} ({})",
            registered.subdomain, registered.fulldomain
        );
        Ok(Account {
            subdomain: registered.subdomain,
            username: registered.username,
            password: registered.password,
            fulldomain: registered.fulldomain,
            server_url: self.base_url.clone(),
        })
    }

    /// Publishes `txt` as the challenge record of `account`.
    ///
    /// The value is sent as given; acme-dns enforces its own length and charset rules.
    pub fn update_txt_record(&self, account: &Account, txt: &str) -> Result<()> {
        if account.server_url.trim_end_matches('/') != self.base_url {
            warn!(
                "account {} was issued by {}, updating through {}",
                account.subdomain, account.server_url, self.base_url
            );
        }
        let url = self.endpoint("update");
        debug!("updating TXT record of {} at {}", account.subdomain, url);

        let request = self
            .http
            .post(&url)
            .header(USER_AGENT, USER_AGENT_VALUE)
            .header(API_USER_HEADER, account.username.as_str())
            .header(API_KEY_HEADER, account.password.as_str())
            .json(&UpdateRequest {
                subdomain: &account.subdomain,
                txt,
            });
        self.execute(&url, request, StatusCode::OK)?;

        info!("updated TXT record of {}", account.fulldomain);
        Ok(())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Sends `request` and returns the response body if the status is `expected`.
    fn execute(&self, url: &str, request: RequestBuilder, expected: StatusCode) -> Result<String> {
        let connection = |source| Error::Connection {
            url: url.to_string(),
            source,
        };
        let res = request.send().map_err(|source: reqwest::Error| {
            if source.is_builder() {
                Error::InvalidRequest {
                    url: url.to_string(),
                    source,
                }
            } else {
                connection(source)
            }
        })?;
        let status = res.status();
        let body = res.text().map_err(connection)?;
        if status != expected {
            debug!("{} answered {}: {}", url, status, body);
            return Err(Error::Client { status, body });
        }
        Ok(body)
    }
}
