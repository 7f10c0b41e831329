//! Thin REST adapter for the Delta Sharing protocol, implementing the
//! [`CatalogPort`] over a blocking HTTP client.
//!
//! Deliberately minimal: shares/all-tables listing (with pagination), the
//! table query endpoint for file descriptors, and plain GETs on signed
//! URLs. Advanced protocol features (change data feeds, predicate
//! pushdown, delta-format responses) are out of scope.
//!
//! Every failure is mapped to a tagged [`ErrorKind`] at this boundary so
//! the retry policy upstream never has to inspect message text.

use crate::domain::entities::{FileDescriptor, TableData, TableRef};
use crate::domain::errors::{ErrorKind, FetchError, Result};
use crate::infrastructure::delta::profile::ShareProfile;
use crate::ports::catalog_port::CatalogPort;
use arrow_schema::Schema;
use bytes::Bytes;
use log::debug;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub struct DeltaSharingClient {
    http: Client,
    profile: ShareProfile,
}

impl DeltaSharingClient {
    pub fn new(profile: ShareProfile, request_timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FetchError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, profile })
    }

    fn get_authed(&self, url: &str) -> Result<String> {
        debug!("GET {url}");
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.profile.bearer_token)
            .send()
            .map_err(|e| FetchError::catalog(classify_transport(&e), e.to_string()))?;
        Self::read_body(response)
    }

    fn post_authed(&self, url: &str, body: Value) -> Result<String> {
        debug!("POST {url}");
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.profile.bearer_token)
            .json(&body)
            .send()
            .map_err(|e| FetchError::catalog(classify_transport(&e), e.to_string()))?;
        Self::read_body(response)
    }

    fn read_body(response: reqwest::blocking::Response) -> Result<String> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(FetchError::catalog(
                classify_status(status),
                format!("HTTP {}: {}", status.as_u16(), body),
            ));
        }
        response
            .text()
            .map_err(|e| FetchError::catalog(classify_transport(&e), e.to_string()))
    }

    /// Follows `nextPageToken` until the listing is exhausted.
    fn get_paged(&self, base: &str) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let url = match &page_token {
                Some(token) => format!("{base}?pageToken={token}"),
                None => base.to_string(),
            };
            let body = self.get_authed(&url)?;
            let page: Value = serde_json::from_str(&body)
                .map_err(|e| FetchError::catalog(ErrorKind::Malformed, e.to_string()))?;
            if let Some(page_items) = page.get("items").and_then(Value::as_array) {
                items.extend(page_items.iter().cloned());
            }
            match page.get("nextPageToken").and_then(Value::as_str) {
                Some(token) if !token.is_empty() => page_token = Some(token.to_string()),
                _ => return Ok(items),
            }
        }
    }
}

impl CatalogPort for DeltaSharingClient {
    fn list_all_tables(&self) -> Result<Vec<TableRef>> {
        let base = self.profile.base_url();
        let shares = self.get_paged(&format!("{base}/shares"))?;

        let mut tables = Vec::new();
        for share in shares {
            let Some(share_name) = share.get("name").and_then(Value::as_str) else {
                continue;
            };
            let listed = self.get_paged(&format!("{base}/shares/{share_name}/all-tables"))?;
            for item in listed {
                if let Some(table) = parse_table_item(&item) {
                    tables.push(table);
                }
            }
        }
        Ok(tables)
    }

    fn list_files_in_table(&self, table: &TableRef) -> Result<Vec<FileDescriptor>> {
        let url = format!(
            "{}/shares/{}/schemas/{}/tables/{}/query",
            self.profile.base_url(),
            table.share,
            table.schema,
            table.name
        );
        let body = self.post_authed(&url, serde_json::json!({}))?;
        parse_files_response(&body)
    }

    fn fetch_file(&self, file: &FileDescriptor) -> Result<Bytes> {
        // Signed URLs carry their own authorization; our bearer token
        // must not be attached.
        let response = self
            .http
            .get(&file.url)
            .send()
            .map_err(|e| FetchError::catalog(classify_transport(&e), e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::catalog(
                classify_status(status),
                format!("HTTP {} on signed URL", status.as_u16()),
            ));
        }
        response
            .bytes()
            .map_err(|e| FetchError::catalog(classify_transport(&e), e.to_string()))
    }

    /// Whole-table load: downloads and decodes every partition in listing
    /// order, concatenated into one in-memory table.
    fn load_table(&self, table: &TableRef) -> Result<TableData> {
        let files = self.list_files_in_table(table)?;
        if files.is_empty() {
            return Ok(TableData::new(Arc::new(Schema::empty()), Vec::new()));
        }

        let mut schema = None;
        let mut batches = Vec::new();
        for file in &files {
            let payload = self.fetch_file(file)?;
            let part = TableData::from_parquet_bytes(payload)?;
            match &schema {
                None => schema = Some(part.schema.clone()),
                Some(existing) if existing.fields() != part.schema.fields() => {
                    return Err(FetchError::Decode(format!(
                        "partition schema mismatch in {table}"
                    )));
                }
                Some(_) => {}
            }
            batches.extend(part.batches);
        }
        // files is non-empty here, so the schema is set.
        Ok(TableData::new(schema.unwrap_or_else(|| Arc::new(Schema::empty())), batches))
    }
}

fn parse_table_item(item: &Value) -> Option<TableRef> {
    Some(TableRef::new(
        item.get("share")?.as_str()?,
        item.get("schema")?.as_str()?,
        item.get("name")?.as_str()?,
    ))
}

/// Parses the NDJSON body of the table query endpoint. Protocol and
/// metadata lines are skipped; each `file` line yields one descriptor.
pub(crate) fn parse_files_response(body: &str) -> Result<Vec<FileDescriptor>> {
    let mut files = Vec::new();
    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line)
            .map_err(|e| FetchError::catalog(ErrorKind::Malformed, format!("bad query line: {e}")))?;
        let Some(file) = value.get("file") else {
            continue;
        };
        let url = file
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                FetchError::catalog(ErrorKind::Malformed, "file entry without url".to_string())
            })?
            .to_string();
        let size = file.get("size").and_then(Value::as_u64).unwrap_or(0);
        files.push(FileDescriptor { url, size });
    }
    Ok(files)
}

fn classify_status(status: StatusCode) -> ErrorKind {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ErrorKind::Auth,
        StatusCode::NOT_FOUND => ErrorKind::NotFound,
        _ => ErrorKind::Other,
    }
}

fn classify_transport(error: &reqwest::Error) -> ErrorKind {
    if error.is_timeout() || error.is_connect() {
        ErrorKind::Network
    } else if error.is_decode() {
        ErrorKind::Malformed
    } else {
        ErrorKind::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_files_response() {
        let body = concat!(
            "{\"protocol\":{\"minReaderVersion\":1}}\n",
            "{\"metaData\":{\"id\":\"abc\",\"format\":{\"provider\":\"parquet\"}}}\n",
            "{\"file\":{\"url\":\"https://signed.example/a?sig=1\",\"size\":1024}}\n",
            "{\"file\":{\"url\":\"https://signed.example/b?sig=2\",\"size\":2048}}\n",
        );
        let files = parse_files_response(body).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].url, "https://signed.example/a?sig=1");
        assert_eq!(files[0].size, 1024);
        assert_eq!(files[1].size, 2048);
    }

    #[test]
    fn test_parse_files_response_empty_table() {
        let body = "{\"protocol\":{}}\n{\"metaData\":{}}\n";
        assert!(parse_files_response(body).unwrap().is_empty());
    }

    #[test]
    fn test_parse_files_response_rejects_garbage() {
        assert!(parse_files_response("not json at all").is_err());
    }

    #[test]
    fn test_parse_table_item() {
        let item = serde_json::json!({
            "share": "payments_prod",
            "schema": "tables",
            "name": "payments_item_summary"
        });
        let table = parse_table_item(&item).unwrap();
        assert_eq!(table.to_string(), "payments_prod.tables.payments_item_summary");

        let incomplete = serde_json::json!({"name": "x"});
        assert!(parse_table_item(&incomplete).is_none());
    }

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(StatusCode::UNAUTHORIZED), ErrorKind::Auth);
        assert_eq!(classify_status(StatusCode::FORBIDDEN), ErrorKind::Auth);
        assert_eq!(classify_status(StatusCode::NOT_FOUND), ErrorKind::NotFound);
        assert_eq!(
            classify_status(StatusCode::INTERNAL_SERVER_ERROR),
            ErrorKind::Other
        );
    }
}
