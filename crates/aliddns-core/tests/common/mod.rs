//! Test doubles and common utilities for contract tests
//!
//! The fake provider keeps an in-memory zone so that writes are visible to
//! later listings, pages its answers like the real API and records every
//! call it receives.

#![allow(dead_code)]

use aliddns_core::error::{Error, Result};
use aliddns_core::{
    AddressFamily, Credentials, DnsProvider, IpSource, NewRecord, ProviderRecord, RecordPage,
    RecordUpdate, SyncConfig,
};
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A list call the fake received
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListCall {
    pub domain: String,
    pub host_label: String,
    pub page_number: u64,
    pub page_size: u64,
}

#[derive(Default)]
struct FakeState {
    /// (domain, record) pairs
    zone: Vec<(String, ProviderRecord)>,
    list_calls: Vec<ListCall>,
    creates: Vec<NewRecord>,
    updates: Vec<RecordUpdate>,
    next_id: u64,
    fail_on_page: Option<u64>,
    fail_domains: Vec<String>,
    fail_writes: bool,
    reported_total: Option<u64>,
    hosted_zones: Vec<String>,
    fail_zone_listing: bool,
    zone_list_calls: usize,
}

/// An in-memory DnsProvider with keyword matching and paging
///
/// Clones share state, so a test can keep one handle for assertions while
/// the engine owns another.
#[derive(Clone, Default)]
pub struct FakeDnsProvider {
    state: Arc<Mutex<FakeState>>,
}

impl FakeDnsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record
    pub fn with_record(
        self,
        domain: &str,
        host_label: &str,
        record_type: &str,
        value: &str,
    ) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.next_id += 1;
            let id = format!("rec-{}", state.next_id);
            state.zone.push((
                domain.to_string(),
                ProviderRecord {
                    id,
                    host_label: host_label.to_string(),
                    record_type: record_type.to_string(),
                    value: value.to_string(),
                },
            ));
        }
        self
    }

    /// Seed `count` records for `host_label` with distinct values
    pub fn with_records(mut self, domain: &str, host_label: &str, count: usize) -> Self {
        for i in 0..count {
            self = self.with_record(domain, host_label, "TXT", &format!("value-{i}"));
        }
        self
    }

    /// Fail the list request for this page number
    pub fn failing_on_page(self, page_number: u64) -> Self {
        self.state.lock().unwrap().fail_on_page = Some(page_number);
        self
    }

    /// Fail every list request for this domain
    pub fn failing_for_domain(self, domain: &str) -> Self {
        self.state.lock().unwrap().fail_domains.push(domain.to_string());
        self
    }

    /// Fail every create and update
    pub fn failing_writes(self) -> Self {
        self.state.lock().unwrap().fail_writes = true;
        self
    }

    /// Report this total instead of the real match count
    pub fn reporting_total(self, total: u64) -> Self {
        self.state.lock().unwrap().reported_total = Some(total);
        self
    }

    /// Report these zones from `list_zones`
    pub fn with_zones(self, zones: &[&str]) -> Self {
        self.state.lock().unwrap().hosted_zones = zones.iter().map(|z| z.to_string()).collect();
        self
    }

    /// Fail every `list_zones` call
    pub fn failing_zone_listing(self) -> Self {
        self.state.lock().unwrap().fail_zone_listing = true;
        self
    }

    pub fn zone_list_calls(&self) -> usize {
        self.state.lock().unwrap().zone_list_calls
    }

    pub fn list_calls(&self) -> Vec<ListCall> {
        self.state.lock().unwrap().list_calls.clone()
    }

    pub fn creates(&self) -> Vec<NewRecord> {
        self.state.lock().unwrap().creates.clone()
    }

    pub fn updates(&self) -> Vec<RecordUpdate> {
        self.state.lock().unwrap().updates.clone()
    }

    pub fn write_count(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.creates.len() + state.updates.len()
    }

    /// Current records of `domain`
    pub fn records(&self, domain: &str) -> Vec<ProviderRecord> {
        self.state
            .lock()
            .unwrap()
            .zone
            .iter()
            .filter(|(d, _)| d == domain)
            .map(|(_, r)| r.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl DnsProvider for FakeDnsProvider {
    async fn list_records(
        &self,
        domain: &str,
        host_label: &str,
        page_number: u64,
        page_size: u64,
    ) -> Result<RecordPage> {
        let mut state = self.state.lock().unwrap();
        state.list_calls.push(ListCall {
            domain: domain.to_string(),
            host_label: host_label.to_string(),
            page_number,
            page_size,
        });

        let failing_domain = state.fail_domains.iter().any(|d| d == domain);
        if state.fail_on_page == Some(page_number) || failing_domain {
            return Err(Error::provider("fake", format!("page {page_number} unavailable")));
        }

        // keyword match, like the real API
        let matching: Vec<ProviderRecord> = state
            .zone
            .iter()
            .filter(|(d, r)| d == domain && r.host_label.contains(host_label))
            .map(|(_, r)| r.clone())
            .collect();

        let start = ((page_number - 1) * page_size) as usize;
        let records = matching
            .iter()
            .skip(start)
            .take(page_size as usize)
            .cloned()
            .collect();

        Ok(RecordPage {
            records,
            total_count: state.reported_total.unwrap_or(matching.len() as u64),
        })
    }

    async fn create_record(&self, record: &NewRecord) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.creates.push(record.clone());
        if state.fail_writes {
            return Err(Error::provider("fake", "create rejected"));
        }
        state.next_id += 1;
        let id = format!("rec-{}", state.next_id);
        state.zone.push((
            record.domain.clone(),
            ProviderRecord {
                id: id.clone(),
                host_label: record.host_label.clone(),
                record_type: record.record_type.to_string(),
                value: record.value.clone(),
            },
        ));
        Ok(id)
    }

    async fn update_record(&self, update: &RecordUpdate) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.updates.push(update.clone());
        if state.fail_writes {
            return Err(Error::provider("fake", "update rejected"));
        }
        let (_, record) = state
            .zone
            .iter_mut()
            .find(|(_, r)| r.id == update.record_id)
            .ok_or_else(|| Error::provider("fake", "no such record"))?;
        record.value = update.value.clone();
        record.host_label = update.host_label.clone();
        record.record_type = update.record_type.to_string();
        Ok(())
    }

    async fn list_zones(&self) -> Result<Vec<String>> {
        let mut state = self.state.lock().unwrap();
        state.zone_list_calls += 1;
        if state.fail_zone_listing {
            return Err(Error::provider("fake", "zone listing unavailable"));
        }
        Ok(state.hosted_zones.clone())
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

/// An IP source that answers with a fixed address, or fails
#[derive(Clone)]
pub struct StaticIpSource {
    ip: Option<IpAddr>,
    calls: Arc<AtomicUsize>,
}

impl StaticIpSource {
    pub fn new(ip: IpAddr) -> Self {
        Self {
            ip: Some(ip),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            ip: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the number of times current() was called
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for StaticIpSource {
    async fn current(&self) -> Result<IpAddr> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.ip
            .ok_or_else(|| Error::ip_source("lookup service unreachable"))
    }
}

/// Helper to create a minimal SyncConfig for testing
pub fn minimal_config(domains: &[&str]) -> SyncConfig {
    SyncConfig {
        credentials: Credentials {
            access_key_id: "test-key-id".to_string(),
            access_key_secret: "test-key-secret".to_string(),
        },
        domain_endpoint: "domain.aliyuncs.com".to_string(),
        dns_endpoint: "alidns.cn-hangzhou.aliyuncs.com".to_string(),
        domains: domains.iter().map(|d| d.to_string()).collect(),
        dns_type: "ipv4".to_string(),
        address_family: AddressFamily::Ipv4,
        poll_interval: Duration::from_secs(60),
    }
}
