#![deny(clippy::mem_forget)]
use acmedns::{Client, Storage};
use anyhow::{bail, Context, Result};
use std::env;
mod config;
mod log;

const USAGE: &str = "usage: acmedns <register|update|show> <domain> [txt]";

fn main() -> Result<()> {
    let config = config::Config::parse()?;
    crate::log::init(config.log_level)?;

    let command = env::args().nth(1).context(USAGE)?;
    let domain = env::args().nth(2).context(USAGE)?;
    let mut storage = Storage::new(&config.storage_path).with_context(|| {
        format!(
            "failed to open account storage {}",
            config.storage_path.display()
        )
    })?;

    match command.as_str() {
        "register" => register(&config, &mut storage, &domain),
        "update" => {
            let txt = env::args().nth(3).context("TXT value not provided")?;
            update(&config, &storage, &domain, &txt)
        }
        "show" => show(&storage, &domain),
        other => bail!("unknown command {:?}\n{}", other, USAGE),
    }
}

/// Registers an account for `domain` unless one is already stored, then prints the CNAME
/// the domain owner has to publish.
fn register(config: &config::Config, storage: &mut Storage, domain: &str) -> Result<()> {
    let account = match storage.fetch(domain) {
        Some(account) => {
            println!("{} already has an account at {}", domain, account.server_url);
            account.clone()
        }
        None => {
            let client = Client::new(config.server_url.as_str());
            let allow_from: Vec<&str> = config.allow_from.iter().map(String::as_str).collect();
            let account = client
                .register_account(&allow_from)
                .context("account registration failed")?;
            storage.put(domain, account.clone());
            storage.save()?;
            account
        }
    };
    println!("{}", account.cname_record(domain));
    Ok(())
}

fn update(config: &config::Config, storage: &Storage, domain: &str, txt: &str) -> Result<()> {
    let account = storage
        .fetch(domain)
        .with_context(|| format!("no account stored for {}, run register first", domain))?;
    let client = Client::new(config.server_url.as_str());
    client
        .update_txt_record(account, txt)
        .with_context(|| format!("failed to update TXT record for {}", domain))?;
    Ok(())
}

fn show(storage: &Storage, domain: &str) -> Result<()> {
    let account = match storage.fetch(domain) {
        Some(account) => account,
        None => bail!("no account stored for {}", domain),
    };
    println!("subdomain:  {}", account.subdomain);
    println!("fulldomain: {}", account.fulldomain);
    println!("server:     {}", account.server_url);
    Ok(())
}
