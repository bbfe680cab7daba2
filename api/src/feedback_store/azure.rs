//! Minimal Azure Blob Storage client: download and overwrite one block blob.
//!
//! Requests are authorized with Shared Key (HMAC-SHA256 over the canonical
//! request) or with a SAS token, whichever the connection string carries.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, StatusCode};
use sha2::Sha256;
use url::Url;

use super::StoreError;

pub const API_VERSION: &str = "2021-08-06";

const DEV_ACCOUNT: &str = "devstoreaccount1";
const DEV_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";
const DEV_ENDPOINT: &str = "http://127.0.0.1:10000/devstoreaccount1";

#[derive(Clone)]
enum Credential {
    SharedKey(Vec<u8>),
    Sas(String),
}

#[derive(Clone)]
pub struct AzureBlobClient {
    client: reqwest::Client,
    account: String,
    endpoint: Url,
    container: String,
    credential: Credential,
}

impl std::fmt::Debug for AzureBlobClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureBlobClient")
            .field("account", &self.account)
            .field("endpoint", &self.endpoint.as_str())
            .field("container", &self.container)
            .finish_non_exhaustive()
    }
}

impl AzureBlobClient {
    /// Parse a storage connection string such as
    /// `DefaultEndpointsProtocol=https;AccountName=..;AccountKey=..;EndpointSuffix=core.windows.net`.
    pub fn from_connection_string(conn: &str, container: &str) -> Result<Self, String> {
        let mut account = None;
        let mut key = None;
        let mut protocol = "https".to_string();
        let mut suffix = "core.windows.net".to_string();
        let mut blob_endpoint = None;
        let mut sas = None;
        let mut dev = false;

        for part in conn.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let Some((name, value)) = part.split_once('=') else {
                return Err(format!("malformed connection string segment '{part}'"));
            };
            match name.to_ascii_lowercase().as_str() {
                "accountname" => account = Some(value.to_string()),
                "accountkey" => key = Some(value.to_string()),
                "defaultendpointsprotocol" => protocol = value.to_string(),
                "endpointsuffix" => suffix = value.to_string(),
                "blobendpoint" => blob_endpoint = Some(value.to_string()),
                "sharedaccesssignature" => sas = Some(value.trim_start_matches('?').to_string()),
                "usedevelopmentstorage" => dev = value.eq_ignore_ascii_case("true"),
                _ => {}
            }
        }

        if dev {
            account.get_or_insert_with(|| DEV_ACCOUNT.to_string());
            key.get_or_insert_with(|| DEV_KEY.to_string());
            blob_endpoint.get_or_insert_with(|| DEV_ENDPOINT.to_string());
        }

        let endpoint = match (&blob_endpoint, &account) {
            (Some(endpoint), _) => endpoint.clone(),
            (None, Some(account)) => format!("{protocol}://{account}.blob.{suffix}"),
            (None, None) => {
                return Err(
                    "connection string has neither AccountName nor BlobEndpoint".to_string(),
                );
            }
        };
        let endpoint =
            Url::parse(&endpoint).map_err(|e| format!("invalid blob endpoint '{endpoint}': {e}"))?;

        let credential = match (key, sas) {
            (Some(key), _) => {
                if account.is_none() {
                    return Err("AccountKey requires AccountName".to_string());
                }
                let key = STANDARD
                    .decode(key.as_bytes())
                    .map_err(|e| format!("AccountKey is not valid base64: {e}"))?;
                Credential::SharedKey(key)
            }
            (None, Some(sas)) => Credential::Sas(sas),
            (None, None) => {
                return Err(
                    "connection string has neither AccountKey nor SharedAccessSignature"
                        .to_string(),
                );
            }
        };

        Ok(Self {
            client: reqwest::Client::new(),
            account: account.unwrap_or_default(),
            endpoint,
            container: container.to_string(),
            credential,
        })
    }

    pub fn blob_url(&self, name: &str) -> Result<Url, StoreError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Invalid(format!("cannot append path to {}", self.endpoint)))?
            .pop_if_empty()
            .push(&self.container)
            .push(name);
        if let Credential::Sas(sas) = &self.credential {
            url.set_query(Some(sas));
        }
        Ok(url)
    }

    /// Download a blob; `None` when it does not exist.
    pub async fn get(&self, name: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let url = self.blob_url(name)?;
        let response = self.request(Method::GET, url, None)?.send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(Some(response.bytes().await?.to_vec()))
    }

    /// Create or replace a block blob with `body`.
    pub async fn put(&self, name: &str, body: Vec<u8>) -> Result<(), StoreError> {
        let url = self.blob_url(name)?;
        let response = self.request(Method::PUT, url, Some(body))?.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }

    fn request(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
    ) -> Result<RequestBuilder, StoreError> {
        let mut ms_headers = vec![
            ("x-ms-date", Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string()),
            ("x-ms-version", API_VERSION.to_string()),
        ];
        if body.is_some() {
            ms_headers.push(("x-ms-blob-type", "BlockBlob".to_string()));
        }
        ms_headers.sort_by_key(|(name, _)| *name);

        let content_length = body.as_ref().map_or(0, Vec::len);
        let content_type = if body.is_some() { "application/json" } else { "" };

        let mut builder = self.client.request(method.clone(), url.clone());
        for (name, value) in &ms_headers {
            builder = builder.header(*name, value);
        }
        if !content_type.is_empty() {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        if let Credential::SharedKey(key) = &self.credential {
            let to_sign = string_to_sign(
                method.as_str(),
                content_length,
                content_type,
                &ms_headers,
                &canonical_resource(&self.account, &url),
            );
            let signature = sign(key, &to_sign)?;
            builder = builder.header(
                AUTHORIZATION,
                format!("SharedKey {}:{signature}", self.account),
            );
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }
        Ok(builder)
    }
}

fn canonical_resource(account: &str, url: &Url) -> String {
    format!("/{account}{}", url.path())
}

/// Shared Key string-to-sign for the blob service. `ms_headers` must be
/// sorted by lowercase name.
fn string_to_sign(
    verb: &str,
    content_length: usize,
    content_type: &str,
    ms_headers: &[(&str, String)],
    resource: &str,
) -> String {
    let length = if content_length == 0 {
        String::new()
    } else {
        content_length.to_string()
    };
    // encoding, language, length, md5, type, date, if-*, range
    let mut out = format!("{verb}\n\n\n{length}\n\n{content_type}\n\n\n\n\n\n\n");
    for (name, value) in ms_headers {
        out.push_str(name);
        out.push(':');
        out.push_str(value.trim());
        out.push('\n');
    }
    out.push_str(resource);
    out
}

fn sign(key: &[u8], to_sign: &str) -> Result<String, StoreError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key)
        .map_err(|e| StoreError::Invalid(format!("unusable account key: {e}")))?;
    mac.update(to_sign.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}
