// # Alibaba Cloud DNS Provider
//
// This crate implements `DnsProvider` against the Alidns RPC API
// (version 2015-01-09) for the aliddns record synchronizer.
//
// ## Behavior
//
// - One signed HTTP request per trait call
// - Errors propagate to the caller; the engine's next tick is the retry
// - HTTP timeout configured (30 seconds)
// - HTTP status codes and Alidns `Code` bodies mapped to readable errors
// - Dry-run mode: listings run, writes are logged and skipped
// - A response without `TotalCount` is an error; paging cannot proceed without it
// - No caching, no background tasks
//
// ## Security Requirements
//
// - The access key secret NEVER appears in logs or Debug output
// - Construction fails fast if either half of the key pair is empty
//
// ## API Reference
//
// - Request signing: ACS3-HMAC-SHA256 (see `sign.rs`)
// - List zones: `DescribeDomains` (PageNumber, PageSize)
// - List records: `DescribeDomainRecords` (DomainName, RRKeyWord, PageNumber, PageSize)
// - Create record: `AddDomainRecord` (DomainName, RR, Type, Value, TTL, Line)
// - Update record: `UpdateDomainRecord` (RecordId, RR, Type, Value, TTL, Line)

mod sign;
pub mod types;

use aliddns_core::{
    Credentials, DnsProvider, Error, NewRecord, ProviderRecord, RecordPage, RecordUpdate, Result,
    SyncConfig,
};
use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::types::{
    AddDomainRecordResponse, ApiErrorBody, DescribeDomainRecordsResponse, DescribeDomainsResponse,
    UpdateDomainRecordResponse, canonical_query,
};

/// Name reported in errors and logs
pub const PROVIDER_NAME: &str = "aliyun";

/// Alidns API version sent as `x-acs-version`
pub const ALIDNS_API_VERSION: &str = "2015-01-09";

/// Hex SHA-256 of an empty body
pub const EMPTY_BODY_SHA256: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Record id returned by `create_record` in dry-run mode
pub const DRY_RUN_RECORD_ID: &str = "dry-run";

/// Zones requested per `DescribeDomains` page (the API maximum)
const ZONE_PAGE_SIZE: u64 = 100;

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Alibaba Cloud DNS provider
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform all `DescribeDomainRecords` requests
/// - Log the intended create/update parameters
/// - **NOT** actually modify DNS records
///
/// # Security
///
/// The Debug implementation does NOT expose the access key secret.
pub struct AliyunProvider {
    /// Access key pair
    /// ⚠️ NEVER log the secret
    credentials: Credentials,

    /// API host, e.g. `alidns.cn-hangzhou.aliyuncs.com`
    endpoint: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, list records but skip writes
    dry_run: bool,
}

impl std::fmt::Debug for AliyunProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AliyunProvider")
            .field("access_key_id", &self.credentials.access_key_id)
            .field("access_key_secret", &"<REDACTED>")
            .field("endpoint", &self.endpoint)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

/// A request ready to send: URL plus the signed headers
#[derive(Debug, Clone)]
pub(crate) struct SignedRequest {
    pub(crate) url: String,
    pub(crate) headers: Vec<(&'static str, String)>,
}

impl AliyunProvider {
    /// Create a new Alidns provider
    ///
    /// # Parameters
    ///
    /// - `credentials`: access key pair with AliyunDNSFullAccess rights
    /// - `endpoint`: API host; a scheme prefix or trailing slash is tolerated
    /// - `dry_run`: If true, list records but skip create/update calls
    ///
    /// # Returns
    ///
    /// - `Err(Error::InvalidInput)` if a credential or the endpoint is empty
    pub fn new(
        credentials: Credentials,
        endpoint: impl Into<String>,
        dry_run: bool,
    ) -> Result<Self> {
        if credentials.access_key_id.is_empty() {
            return Err(Error::invalid_input("Aliyun access key id cannot be empty"));
        }
        if credentials.access_key_secret.is_empty() {
            return Err(Error::invalid_input("Aliyun access key secret cannot be empty"));
        }

        let endpoint = normalize_endpoint(&endpoint.into());
        if endpoint.is_empty() {
            return Err(Error::invalid_input("Aliyun DNS endpoint cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| {
                Error::provider(PROVIDER_NAME, format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            credentials,
            endpoint,
            client,
            dry_run,
        })
    }

    /// Create a provider from the loaded configuration's credentials and DNS endpoint
    pub fn from_config(config: &SyncConfig, dry_run: bool) -> Result<Self> {
        Self::new(config.credentials.clone(), config.dns_endpoint.as_str(), dry_run)
    }

    /// Whether writes are skipped
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// API host requests are sent to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Build the URL and signed headers for one action
    pub(crate) fn signed_request(
        &self,
        action: &str,
        params: &BTreeMap<&str, String>,
        timestamp: &str,
        nonce: &str,
    ) -> Result<SignedRequest> {
        let query_string = canonical_query(params);
        let authorization = self.sign(action, &query_string, timestamp, nonce)?;

        let url = if query_string.is_empty() {
            format!("https://{}/", self.endpoint)
        } else {
            format!("https://{}/?{}", self.endpoint, query_string)
        };

        Ok(SignedRequest {
            url,
            headers: vec![
                ("host", self.endpoint.clone()),
                ("x-acs-action", action.to_string()),
                ("x-acs-version", ALIDNS_API_VERSION.to_string()),
                ("x-acs-date", timestamp.to_string()),
                ("x-acs-signature-nonce", nonce.to_string()),
                ("x-acs-content-sha256", EMPTY_BODY_SHA256.to_string()),
                ("authorization", authorization),
            ],
        })
    }

    /// Sign and send one action, decoding the response body as `T`
    async fn call<T: DeserializeOwned>(
        &self,
        action: &str,
        params: &BTreeMap<&str, String>,
    ) -> Result<T> {
        let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let nonce = uuid::Uuid::new_v4().to_string();
        let signed = self.signed_request(action, params, &timestamp, &nonce)?;

        tracing::debug!(action, endpoint = %self.endpoint, "Sending Alidns request");

        let mut request = self.client.post(&signed.url);
        for (name, value) in &signed.headers {
            request = request.header(*name, value);
        }

        let response = request.send().await.map_err(|e| {
            Error::provider(PROVIDER_NAME, format!("{action}: HTTP request failed: {e}"))
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());

        parse_response(action, status, &body)
    }
}

/// Strip a scheme prefix and trailing slashes from a configured endpoint
fn normalize_endpoint(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    without_scheme.trim_end_matches('/').to_string()
}

/// Decode a response, mapping HTTP and API failures to provider errors
fn parse_response<T: DeserializeOwned>(action: &str, status: u16, body: &str) -> Result<T> {
    let api_error = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .filter(|e| e.code.is_some());

    if !(200..300).contains(&status) || api_error.is_some() {
        let message = describe_failure(action, status, api_error.as_ref(), body);
        tracing::error!("{}", message);
        return Err(Error::provider(PROVIDER_NAME, message));
    }

    serde_json::from_str(body).map_err(|e| {
        Error::provider(PROVIDER_NAME, format!("{action}: Failed to parse response: {e}"))
    })
}

fn describe_failure(
    action: &str,
    status: u16,
    api_error: Option<&ApiErrorBody>,
    body: &str,
) -> String {
    let code = api_error.and_then(|e| e.code.as_deref()).unwrap_or("");
    let detail = match api_error {
        Some(e) => format!("{} - {}", code, e.message.as_deref().unwrap_or("")),
        None => body.to_string(),
    };

    let auth_code = code.starts_with("InvalidAccessKeyId")
        || code.starts_with("SignatureDoesNotMatch")
        || code.starts_with("IncompleteSignature")
        || code.starts_with("Forbidden");
    let throttled = code.starts_with("Throttling");

    if auth_code || status == 401 || status == 403 {
        format!(
            "{action}: Authentication failed: invalid access key or insufficient permissions. \
             Status: {status}, {detail}"
        )
    } else if throttled || status == 429 {
        format!("{action}: Rate limited, retry later. Status: {status}, {detail}")
    } else if (500..=599).contains(&status) {
        format!("{action}: Alidns server error (transient): {status} - {detail}")
    } else {
        format!("{action} failed: {status} - {detail}")
    }
}

fn describe_records_params(
    domain: &str,
    host_label: &str,
    page_number: u64,
    page_size: u64,
) -> BTreeMap<&'static str, String> {
    BTreeMap::from([
        ("DomainName", domain.to_string()),
        ("RRKeyWord", host_label.to_string()),
        ("PageNumber", page_number.to_string()),
        ("PageSize", page_size.to_string()),
    ])
}

fn describe_domains_params(page_number: u64) -> BTreeMap<&'static str, String> {
    BTreeMap::from([
        ("PageNumber", page_number.to_string()),
        ("PageSize", ZONE_PAGE_SIZE.to_string()),
    ])
}

fn add_record_params(record: &NewRecord) -> BTreeMap<&'static str, String> {
    BTreeMap::from([
        ("DomainName", record.domain.clone()),
        ("RR", record.host_label.clone()),
        ("Type", record.record_type.to_string()),
        ("Value", record.value.clone()),
        ("TTL", record.ttl.to_string()),
        ("Line", record.line.clone()),
    ])
}

fn update_record_params(update: &RecordUpdate) -> BTreeMap<&'static str, String> {
    BTreeMap::from([
        ("RecordId", update.record_id.clone()),
        ("RR", update.host_label.clone()),
        ("Type", update.record_type.to_string()),
        ("Value", update.value.clone()),
        ("TTL", update.ttl.to_string()),
        ("Line", update.line.clone()),
    ])
}

fn missing_total(action: &str) -> Error {
    Error::provider(PROVIDER_NAME, format!("{action}: response has no TotalCount"))
}

fn record_page_from(response: DescribeDomainRecordsResponse) -> Result<RecordPage> {
    let total_count = response
        .total_count
        .ok_or_else(|| missing_total("DescribeDomainRecords"))?;
    let records = response
        .domain_records
        .and_then(|wrapper| wrapper.record)
        .unwrap_or_default()
        .into_iter()
        .map(ProviderRecord::from)
        .collect();

    Ok(RecordPage {
        records,
        total_count,
    })
}

/// Zone names on one `DescribeDomains` page, plus the account-wide total
fn zone_page_from(response: DescribeDomainsResponse) -> Result<(Vec<String>, u64)> {
    let total_count = response
        .total_count
        .ok_or_else(|| missing_total("DescribeDomains"))?;
    let names = response
        .domains
        .and_then(|wrapper| wrapper.domain)
        .unwrap_or_default()
        .into_iter()
        .map(|domain| domain.domain_name)
        .collect();
    Ok((names, total_count))
}

#[async_trait]
impl DnsProvider for AliyunProvider {
    async fn list_records(
        &self,
        domain: &str,
        host_label: &str,
        page_number: u64,
        page_size: u64,
    ) -> Result<RecordPage> {
        let params = describe_records_params(domain, host_label, page_number, page_size);
        let response: DescribeDomainRecordsResponse =
            self.call("DescribeDomainRecords", &params).await?;
        record_page_from(response)
    }

    async fn create_record(&self, record: &NewRecord) -> Result<String> {
        let params = add_record_params(record);

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send AddDomainRecord with {}",
                canonical_query(&params)
            );
            return Ok(DRY_RUN_RECORD_ID.to_string());
        }

        let response: AddDomainRecordResponse = self.call("AddDomainRecord", &params).await?;
        Ok(response.record_id)
    }

    async fn update_record(&self, update: &RecordUpdate) -> Result<()> {
        let params = update_record_params(update);

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send UpdateDomainRecord with {}",
                canonical_query(&params)
            );
            return Ok(());
        }

        let _: UpdateDomainRecordResponse = self.call("UpdateDomainRecord", &params).await?;
        Ok(())
    }

    async fn list_zones(&self) -> Result<Vec<String>> {
        let mut zones = Vec::new();
        let mut page_number = 1;

        loop {
            let params = describe_domains_params(page_number);
            let response: DescribeDomainsResponse = self.call("DescribeDomains", &params).await?;
            let (names, total_count) = zone_page_from(response)?;

            let empty_page = names.is_empty();
            zones.extend(names);
            if empty_page || zones.len() as u64 >= total_count {
                break;
            }
            page_number += 1;
        }

        tracing::debug!(count = zones.len(), "Listed Alidns zones");
        Ok(zones)
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aliddns_core::RecordType;
    use tokio_test::assert_ok;

    fn credentials(secret: &str) -> Credentials {
        Credentials {
            access_key_id: "LTAI5tTestKeyId".to_string(),
            access_key_secret: secret.to_string(),
        }
    }

    fn provider(dry_run: bool) -> AliyunProvider {
        let endpoint = "alidns.cn-hangzhou.aliyuncs.com";
        AliyunProvider::new(credentials("test-secret"), endpoint, dry_run).unwrap()
    }

    #[test]
    fn test_empty_credentials_rejected() {
        let missing_id = Credentials {
            access_key_id: String::new(),
            access_key_secret: "secret".to_string(),
        };
        assert!(matches!(
            AliyunProvider::new(missing_id, "alidns.aliyuncs.com", false),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            AliyunProvider::new(credentials(""), "alidns.aliyuncs.com", false),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            AliyunProvider::new(credentials("secret"), " https:// ", false),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_endpoint_normalized() {
        assert_eq!(
            normalize_endpoint("https://alidns.cn-hangzhou.aliyuncs.com/"),
            "alidns.cn-hangzhou.aliyuncs.com"
        );
        assert_eq!(normalize_endpoint(" alidns.aliyuncs.com "), "alidns.aliyuncs.com");
        assert_eq!(normalize_endpoint("http://alidns.aliyuncs.com"), "alidns.aliyuncs.com");
    }

    #[test]
    fn test_dry_run_mode() {
        assert!(provider(true).is_dry_run());
        assert!(!provider(false).is_dry_run());
    }

    #[test]
    fn test_provider_name() {
        assert_eq!(provider(false).provider_name(), "aliyun");
    }

    #[test]
    fn test_secret_not_exposed_in_debug() {
        let p =
            AliyunProvider::new(credentials("secret_value_12345"), "alidns.aliyuncs.com", false)
                .unwrap();

        let debug_str = format!("{:?}", p);
        assert!(!debug_str.contains("secret_value_12345"));
        assert!(debug_str.contains("AliyunProvider"));
        assert!(debug_str.contains("<REDACTED>"));
    }

    #[test]
    fn test_signed_request_shape() {
        let p = provider(false);
        let params = describe_records_params("example.com", "@", 1, 20);

        let signed = p
            .signed_request("DescribeDomainRecords", &params, "2024-01-15T08:00:00Z", "nonce-1")
            .unwrap();

        assert_eq!(
            signed.url,
            "https://alidns.cn-hangzhou.aliyuncs.com/\
             ?DomainName=example.com&PageNumber=1&PageSize=20&RRKeyWord=%40"
        );
        let header = |name: &str| {
            signed
                .headers
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(header("x-acs-action"), Some("DescribeDomainRecords"));
        assert_eq!(header("x-acs-version"), Some("2015-01-09"));
        assert_eq!(header("x-acs-date"), Some("2024-01-15T08:00:00Z"));
        assert_eq!(header("x-acs-signature-nonce"), Some("nonce-1"));
        assert_eq!(header("x-acs-content-sha256"), Some(EMPTY_BODY_SHA256));
        assert!(
            header("authorization")
                .unwrap()
                .starts_with("ACS3-HMAC-SHA256 Credential=LTAI5tTestKeyId,")
        );
    }

    #[test]
    fn test_parse_success_response() {
        let body = r#"{"RequestId": "x", "RecordId": "123"}"#;
        let parsed: AddDomainRecordResponse =
            parse_response("AddDomainRecord", 200, body).unwrap();
        assert_eq!(parsed.record_id, "123");
    }

    #[test]
    fn test_parse_auth_error() {
        let body = r#"{
            "RequestId": "x",
            "Code": "InvalidAccessKeyId.NotFound",
            "Message": "Specified access key is not found."
        }"#;
        let err =
            parse_response::<AddDomainRecordResponse>("AddDomainRecord", 404, body).unwrap_err();

        match err {
            Error::ProviderRequestFailed { provider, message } => {
                assert_eq!(provider, "aliyun");
                assert!(message.contains("Authentication failed"), "{message}");
                assert!(message.contains("InvalidAccessKeyId.NotFound"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_throttling_and_server_errors() {
        let throttled = r#"{
            "Code": "Throttling.User",
            "Message": "Request was denied due to user flow control."
        }"#;
        let err = parse_response::<AddDomainRecordResponse>("AddDomainRecord", 400, throttled)
            .unwrap_err();
        assert!(err.to_string().contains("Rate limited"));

        let err = parse_response::<AddDomainRecordResponse>("AddDomainRecord", 503, "upstream down")
            .unwrap_err();
        assert!(err.to_string().contains("server error (transient)"));
        assert!(err.to_string().contains("upstream down"));
    }

    #[test]
    fn test_parse_business_error() {
        let body =
            r#"{"Code": "DomainRecordDuplicate", "Message": "The DNS record already exists."}"#;
        let err = parse_response::<UpdateDomainRecordResponse>("UpdateDomainRecord", 400, body)
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("UpdateDomainRecord failed: 400"));
        assert!(message.contains("DomainRecordDuplicate"));
    }

    #[test]
    fn test_parse_malformed_success_body() {
        let err = parse_response::<AddDomainRecordResponse>("AddDomainRecord", 200, "not json")
            .unwrap_err();
        assert!(err.to_string().contains("Failed to parse response"));
    }

    fn new_record(record_type: RecordType, value: &str) -> NewRecord {
        NewRecord {
            domain: "example.com".to_string(),
            host_label: "www".to_string(),
            record_type,
            value: value.to_string(),
            ttl: aliddns_core::types::RECORD_TTL,
            line: aliddns_core::types::RECORD_LINE.to_string(),
        }
    }

    #[test]
    fn test_add_record_query() {
        let params = add_record_params(&new_record(RecordType::A, "192.0.2.1"));
        assert_eq!(
            canonical_query(&params),
            "DomainName=example.com&Line=default&RR=www&TTL=600&Type=A&Value=192.0.2.1"
        );
    }

    #[test]
    fn test_update_record_query() {
        let params = update_record_params(&RecordUpdate {
            record_id: "123".to_string(),
            host_label: "@".to_string(),
            record_type: RecordType::Aaaa,
            value: "2001:db8::1".to_string(),
            ttl: aliddns_core::types::RECORD_TTL,
            line: aliddns_core::types::RECORD_LINE.to_string(),
        });
        assert_eq!(
            canonical_query(&params),
            "Line=default&RR=%40&RecordId=123&TTL=600&Type=AAAA&Value=2001%3Adb8%3A%3A1"
        );
    }

    #[test]
    fn test_describe_domains_query() {
        assert_eq!(
            canonical_query(&describe_domains_params(3)),
            "PageNumber=3&PageSize=100"
        );
    }

    #[test]
    fn test_record_page_requires_total_count() {
        let body = r#"{"RequestId": "x", "DomainRecords": {"Record": []}}"#;
        let response: DescribeDomainRecordsResponse =
            parse_response("DescribeDomainRecords", 200, body).unwrap();

        match record_page_from(response).unwrap_err() {
            Error::ProviderRequestFailed { provider, message } => {
                assert_eq!(provider, "aliyun");
                assert!(message.contains("DescribeDomainRecords"), "{message}");
                assert!(message.contains("TotalCount"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_record_page_keeps_reported_total() {
        let body = r#"{
            "TotalCount": 45,
            "DomainRecords": {"Record": [
                {"RR": "www", "Type": "A", "Value": "192.0.2.1", "RecordId": "1"}
            ]}
        }"#;
        let response: DescribeDomainRecordsResponse =
            parse_response("DescribeDomainRecords", 200, body).unwrap();

        let page = record_page_from(response).unwrap();
        assert_eq!(page.total_count, 45);
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].id, "1");
    }

    #[test]
    fn test_zone_page() {
        let body = r#"{"TotalCount": 2, "Domains": {"Domain": [
            {"DomainName": "example.com.cn"}, {"DomainName": "example.com"}
        ]}}"#;
        let response: DescribeDomainsResponse =
            parse_response("DescribeDomains", 200, body).unwrap();
        let (names, total) = zone_page_from(response).unwrap();
        assert_eq!(names, vec!["example.com.cn", "example.com"]);
        assert_eq!(total, 2);

        let response: DescribeDomainsResponse =
            parse_response("DescribeDomains", 200, r#"{"Domains": {"Domain": []}}"#).unwrap();
        assert!(matches!(
            zone_page_from(response),
            Err(Error::ProviderRequestFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_dry_run_writes_make_no_request() {
        // dry-run returns before any network I/O, so the bogus endpoint is never contacted
        let p = AliyunProvider::new(credentials("secret"), "invalid.invalid", true).unwrap();

        let record_id = p
            .create_record(&new_record(RecordType::A, "192.0.2.1"))
            .await
            .unwrap();
        assert_eq!(record_id, DRY_RUN_RECORD_ID);

        assert_ok!(
            p.update_record(&RecordUpdate {
                record_id: "123".to_string(),
                host_label: "www".to_string(),
                record_type: RecordType::Aaaa,
                value: "2001:db8::1".to_string(),
                ttl: 600,
                line: "default".to_string(),
            })
            .await
        );
    }
}
