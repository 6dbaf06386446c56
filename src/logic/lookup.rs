//! Egress Address Lookup
//!
//! Resolves the public address a session currently egresses from. Any
//! failure resolves to the `unknown` sentinel; lookup errors never leave
//! this module.

use std::time::Duration;
use serde::Deserialize;

use crate::constants::UNKNOWN_ADDRESS;
use crate::logic::error::NetworkLookupError;

pub trait AddressLookup: Send + Sync {
    fn try_lookup(&self) -> Result<String, NetworkLookupError>;

    /// Address or the `unknown` sentinel
    fn current_address(&self) -> String {
        match self.try_lookup() {
            Ok(addr) if !addr.trim().is_empty() => addr,
            Ok(_) => UNKNOWN_ADDRESS.to_string(),
            Err(e) => {
                log::debug!("Egress lookup failed: {}", e);
                UNKNOWN_ADDRESS.to_string()
            }
        }
    }
}

// ============================================================================
// HTTP LOOKUP
// ============================================================================

#[derive(Debug, Deserialize)]
struct EchoResponse {
    origin: String,
}

/// IP echo endpoint queried with a bounded timeout
pub struct HttpAddressLookup {
    url: String,
    agent: ureq::Agent,
}

impl HttpAddressLookup {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }
}

impl AddressLookup for HttpAddressLookup {
    fn try_lookup(&self) -> Result<String, NetworkLookupError> {
        let response = self
            .agent
            .get(&self.url)
            .call()
            .map_err(|e| NetworkLookupError::Request(e.to_string()))?;

        let body = response
            .into_string()
            .map_err(|e| NetworkLookupError::Parse(e.to_string()))?;

        parse_echo(&body)
    }
}

fn parse_echo(body: &str) -> Result<String, NetworkLookupError> {
    let echo: EchoResponse =
        serde_json::from_str(body).map_err(|e| NetworkLookupError::Parse(e.to_string()))?;
    Ok(echo.origin)
}

// ============================================================================
// FIXED ADDRESS
// ============================================================================

/// Known address, no network involved
pub struct StaticAddress(pub String);

impl AddressLookup for StaticAddress {
    fn try_lookup(&self) -> Result<String, NetworkLookupError> {
        Ok(self.0.clone())
    }
}
