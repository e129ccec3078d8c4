//! Client metadata enrichment via user agent parsing.
//!
//! Fills in device class, browser and OS from the user agent when the
//! client did not send them. Values the client sent always win.

use proposal_core::ClientMetadata;
use woothee::parser::Parser;

/// Fills missing device/browser/OS fields from the user agent.
pub struct UserAgentEnricher {
    parser: Parser,
}

impl UserAgentEnricher {
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
        }
    }

    pub fn enrich(&self, metadata: &mut ClientMetadata) {
        let Some(user_agent) = metadata.user_agent.as_deref().filter(|ua| !ua.is_empty()) else {
            return;
        };
        let Some(result) = self.parser.parse(user_agent) else {
            return;
        };

        if is_blank(&metadata.browser) && known(result.name) {
            metadata.browser = Some(result.name.to_string());
        }
        if is_blank(&metadata.os) && known(result.os) {
            metadata.os = Some(result.os.to_string());
        }
        if is_blank(&metadata.device) {
            metadata.device = device_class(user_agent, result.category).map(str::to_string);
        }
    }
}

impl Default for UserAgentEnricher {
    fn default() -> Self {
        Self::new()
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

fn known(value: &str) -> bool {
    !value.is_empty() && value != "UNKNOWN"
}

/// Maps a woothee category onto the desktop/mobile/tablet classes the
/// device breakdown counts. Woothee reports tablets as smartphones.
fn device_class(user_agent: &str, category: &str) -> Option<&'static str> {
    if user_agent.contains("iPad") || user_agent.contains("Tablet") {
        return Some("tablet");
    }
    match category {
        "pc" => Some("desktop"),
        "smartphone" | "mobilephone" => Some("mobile"),
        "crawler" => Some("bot"),
        "appliance" => Some("other"),
        _ => None,
    }
}
