use std::{fmt, time::Duration};

use anyhow::anyhow;

use crate::config::TlsPolicy;

/// The three parts of a bundle, in the order they are concatenated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertSource {
    TenantRoot,
    TenantIntermediate,
    PublicRoots,
}

impl CertSource {
    pub const ALL: [CertSource; 3] = [
        CertSource::TenantRoot,
        CertSource::TenantIntermediate,
        CertSource::PublicRoots,
    ];
}

impl fmt::Display for CertSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CertSource::TenantRoot => "tenant root CA",
            CertSource::TenantIntermediate => "tenant intermediate CA",
            CertSource::PublicRoots => "public trusted-root bundle",
        })
    }
}

pub trait Fetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, anyhow::Error>;
}

pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(tls: TlsPolicy) -> Result<Self, anyhow::Error> {
        let permissive = tls == TlsPolicy::Permissive;
        if permissive {
            log::warn!("certificate endpoints will be fetched without TLS verification");
        }

        let client = reqwest::blocking::Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .timeout(Duration::from_secs(60))
            .danger_accept_invalid_certs(permissive)
            .danger_accept_invalid_hostnames(permissive)
            .build()?;

        Ok(HttpFetcher { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, anyhow::Error> {
        // reqwest errors carry the URL, and with it the org key.
        let response = self
            .client
            .get(url)
            .send()
            .map_err(reqwest::Error::without_url)?;
        let status = response.status();

        if !status.is_success() {
            return Err(anyhow!("server answered {}", status));
        }

        let body = response.bytes().map_err(reqwest::Error::without_url)?;
        if body.is_empty() {
            return Err(anyhow!("server answered with an empty body"));
        }

        log::debug!("fetched {} bytes", body.len());

        Ok(body.to_vec())
    }
}
