//! Interpretation of `601 Configuration` items.

use tracing::debug;

/// APT configuration key whose value becomes the proxy for git commands.
pub const PROXY_CONFIG_KEY: &str = "Acquire::http::Proxy";

/// Settings extracted from one configuration message.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ConfigurationUpdate {
    /// Proxy URL applied to both HTTP and HTTPS traffic of child commands.
    pub proxy: Option<String>,
}

/// Interprets `Key=Value` configuration items.
///
/// Only [`PROXY_CONFIG_KEY`] is honored; the last occurrence wins. Items
/// without `=` and unrelated keys are ignored.
pub fn parse_config_items<S: AsRef<str>>(items: &[S]) -> ConfigurationUpdate {
    let mut update = ConfigurationUpdate::default();
    for item in items {
        let item = item.as_ref();
        let Some((key, value)) = item.split_once('=') else {
            debug!(item, "Ignoring configuration item without `=`");
            continue;
        };
        if key == PROXY_CONFIG_KEY {
            update.proxy = Some(value.to_string());
        }
    }

    update
}
