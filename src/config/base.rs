//! `[base]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[base]` section in manview.toml.
///
/// # Example
/// ```toml
/// [base]
/// title = "Fleet Manuals"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BaseConfig {
    /// Library title shown by front-ends.
    #[serde(default = "defaults::base::title")]
    #[educe(Default = defaults::base::title())]
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::super::ManviewConfig;

    #[test]
    fn test_base_config_title() {
        let config: ManviewConfig = toml::from_str(
            r#"
            [base]
            title = "Fleet Manuals"
        "#,
        )
        .unwrap();
        assert_eq!(config.base.title, "Fleet Manuals");
    }

    #[test]
    fn test_base_config_defaults() {
        let config: ManviewConfig = toml::from_str("").unwrap();
        assert_eq!(config.base.title, "Manuals");
    }
}
