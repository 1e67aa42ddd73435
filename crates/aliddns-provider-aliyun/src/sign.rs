//! ACS3-HMAC-SHA256 request signing
//!
//! Reference:
//! <https://www.alibabacloud.com/help/en/sdk/product-overview/v3-request-structure-and-signature>

use aliddns_core::{Error, Result};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::{ALIDNS_API_VERSION, AliyunProvider, EMPTY_BODY_SHA256, PROVIDER_NAME};

type HmacSha256 = Hmac<Sha256>;

/// Signature algorithm name, also the Authorization scheme
pub const SIGNATURE_ALGORITHM: &str = "ACS3-HMAC-SHA256";

/// Headers covered by the signature, sorted and lower-cased
pub const SIGNED_HEADERS: &str =
    "host;x-acs-action;x-acs-content-sha256;x-acs-date;x-acs-signature-nonce;x-acs-version";

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| Error::provider(PROVIDER_NAME, format!("cannot initialise HMAC: {e}")))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

impl AliyunProvider {
    /// Compute the Authorization header for one request
    ///
    /// # Parameters
    ///
    /// - `action`: API action name (e.g. `DescribeDomainRecords`)
    /// - `query_string`: canonical query string, already sorted and encoded
    /// - `timestamp`: `x-acs-date` value (`%Y-%m-%dT%H:%M:%SZ`, UTC)
    /// - `nonce`: `x-acs-signature-nonce` value, unique per request
    pub(crate) fn sign(
        &self,
        action: &str,
        query_string: &str,
        timestamp: &str,
        nonce: &str,
    ) -> Result<String> {
        let host = &self.endpoint;
        let canonical_headers = format!(
            "host:{host}\n\
             x-acs-action:{action}\n\
             x-acs-content-sha256:{EMPTY_BODY_SHA256}\n\
             x-acs-date:{timestamp}\n\
             x-acs-signature-nonce:{nonce}\n\
             x-acs-version:{ALIDNS_API_VERSION}\n"
        );

        // RPC style: parameters travel in the query string, the body is empty
        let canonical_request = format!(
            "POST\n/\n{query_string}\n{canonical_headers}\n{SIGNED_HEADERS}\n{EMPTY_BODY_SHA256}"
        );
        tracing::trace!("Canonical request:\n{}", canonical_request);

        let hashed_request = hex::encode(Sha256::digest(canonical_request.as_bytes()));
        let string_to_sign = format!("{SIGNATURE_ALGORITHM}\n{hashed_request}");

        let signature = hex::encode(hmac_sha256(
            self.credentials.access_key_secret.as_bytes(),
            string_to_sign.as_bytes(),
        )?);

        Ok(format!(
            "{SIGNATURE_ALGORITHM} Credential={},\
             SignedHeaders={SIGNED_HEADERS},Signature={signature}",
            self.credentials.access_key_id
        ))
    }
}
