//! Deep links into the external order system. A pure string builder with
//! explicit inputs; detectors attach the result to their output rows.

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::model::is_unassigned_rma;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeepLinkConfig {
    pub base_url: String,
    pub company: String,
    pub page_id: String,
    /// Name of the field the external system filters on.
    pub field_name: String,
}

impl Default for DeepLinkConfig {
    fn default() -> Self {
        Self {
            base_url: "https://businesscentral.dynamics.com/Production".to_string(),
            company: "PROD".to_string(),
            page_id: "70001".to_string(),
            field_name: "No.".to_string(),
        }
    }
}

fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Builds the filter deep link for one RMA, or None when the case has no
/// RMA assigned (there is nothing to filter on).
pub fn record_link(config: &DeepLinkConfig, rma: &str) -> Option<String> {
    if is_unassigned_rma(rma) {
        return None;
    }
    Some(format!(
        "{}?company={}&page={}&filter='{}'%20IS%20%27{}%27",
        config.base_url,
        config.company,
        config.page_id,
        encode(&config.field_name),
        encode(rma.trim()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unassigned_rma_yields_no_link() {
        let config = DeepLinkConfig::default();
        assert_eq!(record_link(&config, "N/A"), None);
        assert_eq!(record_link(&config, "  "), None);
        assert_eq!(record_link(&config, ""), None);
    }

    #[test]
    fn link_encodes_field_and_value() {
        let config = DeepLinkConfig::default();
        let link = record_link(&config, "RMA 100&X").unwrap();
        assert_eq!(
            link,
            "https://businesscentral.dynamics.com/Production?company=PROD&page=70001&filter='No.'%20IS%20%27RMA+100%26X%27"
        );
    }
}
