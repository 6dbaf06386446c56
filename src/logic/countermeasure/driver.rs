//! Browser-automation collaborator interface
//!
//! The driver owns the page. This crate only asks it questions and tells
//! it what to do; how it does either is not our concern.

use std::collections::HashMap;
use serde::{Deserialize, Serialize};

use crate::logic::egress::EgressRecord;
use crate::logic::error::DriverError;

// ============================================================================
// DETECTION INDICATORS
// ============================================================================

/// Page features that count as evidence of detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Indicator {
    CaptchaContainer,
    CaptchaFrame,
    VerifyPrompt,
    BlockedNotice,
    RestrictedNotice,
    UnusualActivityNotice,
    /// 403 or 429 in a page heading
    ErrorStatusHeading,
}

/// Probe order. The first positive indicator ends the scan.
pub const PROBE_ORDER: [Indicator; 7] = [
    Indicator::CaptchaContainer,
    Indicator::CaptchaFrame,
    Indicator::VerifyPrompt,
    Indicator::BlockedNotice,
    Indicator::RestrictedNotice,
    Indicator::UnusualActivityNotice,
    Indicator::ErrorStatusHeading,
];

impl Indicator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Indicator::CaptchaContainer => "captcha_container",
            Indicator::CaptchaFrame => "captcha_frame",
            Indicator::VerifyPrompt => "verify_prompt",
            Indicator::BlockedNotice => "blocked_notice",
            Indicator::RestrictedNotice => "restricted_notice",
            Indicator::UnusualActivityNotice => "unusual_activity_notice",
            Indicator::ErrorStatusHeading => "error_status_heading",
        }
    }
}

impl std::fmt::Display for Indicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// ACTIONS
// ============================================================================

/// Action requested by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActionRequest {
    Navigate { url: String },
    Click { selector: String },
    /// Anything else the driver understands
    Custom { name: String, params: HashMap<String, String> },
}

impl ActionRequest {
    pub fn action_type(&self) -> &str {
        match self {
            ActionRequest::Navigate { .. } => "navigate",
            ActionRequest::Click { .. } => "click",
            ActionRequest::Custom { name, .. } => name,
        }
    }

    pub fn description(&self) -> String {
        match self {
            ActionRequest::Navigate { url } => format!("Navigate to {}", url),
            ActionRequest::Click { selector } => format!("Click {}", selector),
            ActionRequest::Custom { name, params } => format!("Custom: {} ({} params)", name, params.len()),
        }
    }
}

// ============================================================================
// DRIVER TRAIT
// ============================================================================

pub trait SessionDriver {
    /// Check one indicator. Per-indicator failures should be `DriverError::Probe`.
    fn try_indicator(&mut self, indicator: Indicator) -> Result<bool, DriverError>;

    /// Current page content, used for classification
    fn page_content(&mut self) -> Result<String, DriverError>;

    /// Client signature in use (e.g. user agent)
    fn client_signature(&mut self) -> Result<String, DriverError>;

    /// `Ok(false)` and `Err(_)` both count as a failed action
    fn execute_action(&mut self, action: &ActionRequest) -> Result<bool, DriverError>;

    /// Tear down the current context and start over through `egress`,
    /// presenting `client_signature` when one is given
    fn reinitialize_with_egress(
        &mut self,
        egress: &EgressRecord,
        client_signature: Option<&str>,
    ) -> Result<(), DriverError>;

    // Simulated activity primitives

    fn scroll_by(&mut self, dy: i32) -> Result<(), DriverError>;

    fn move_pointer(&mut self, dx: i32, dy: i32) -> Result<(), DriverError>;

    /// Harmless DOM read
    fn touch_dom(&mut self) -> Result<(), DriverError>;
}
