//! User-agent classification.
//!
//! Token matching mirrors what the dashboard groups on: a coarse
//! mobile/desktop split and a browser family, with everything
//! unrecognized bucketed as "Unknown".

use feedpulse_api_types::DeviceClass;
use serde::Serialize;

const MOBILE_TOKENS: [&str; 4] = ["Mobile", "Android", "iPhone", "iPad"];
const BROWSER_TOKENS: [&str; 5] = ["Chrome", "Firefox", "Safari", "Edge", "Opera"];

/// Device classification stamped onto every persisted session and event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub user_agent: String,
    pub is_mobile: bool,
    pub browser: String,
    pub device_type: DeviceClass,
}

impl DeviceInfo {
    /// Classify a raw user-agent header value. An absent header
    /// classifies as an unknown desktop browser.
    pub fn from_user_agent(user_agent: &str) -> Self {
        let is_mobile = MOBILE_TOKENS.iter().any(|token| user_agent.contains(token));
        let browser = BROWSER_TOKENS
            .iter()
            .find(|token| contains_ignore_case(user_agent, token))
            .map(|token| (*token).to_string())
            .unwrap_or_else(|| "Unknown".to_string());

        Self {
            user_agent: user_agent.to_string(),
            is_mobile,
            browser,
            device_type: if is_mobile {
                DeviceClass::Mobile
            } else {
                DeviceClass::Desktop
            },
        }
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    let needle = needle.to_ascii_lowercase();
    haystack.to_ascii_lowercase().contains(&needle)
}
