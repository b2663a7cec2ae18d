//! `[viewer]` section configuration.
//!
//! Scroll geometry and timing shared by every viewer session.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[viewer]` section in manview.toml.
///
/// # Example
/// ```toml
/// [viewer]
/// nav_offset = 120         # px kept above a heading after navigation
/// detection_line = 150     # px from viewport top for active heading
/// smooth_scroll_ms = 800   # scroll-listener suppression, smooth
/// instant_scroll_ms = 100  # scroll-listener suppression, instant
/// settle_ms = 100          # delay before restoring the URL fragment
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ViewerConfig {
    #[serde(default = "defaults::viewer::nav_offset")]
    #[educe(Default = defaults::viewer::nav_offset())]
    pub nav_offset: u32,

    #[serde(default = "defaults::viewer::detection_line")]
    #[educe(Default = defaults::viewer::detection_line())]
    pub detection_line: u32,

    #[serde(default = "defaults::viewer::smooth_scroll_ms")]
    #[educe(Default = defaults::viewer::smooth_scroll_ms())]
    pub smooth_scroll_ms: u64,

    #[serde(default = "defaults::viewer::instant_scroll_ms")]
    #[educe(Default = defaults::viewer::instant_scroll_ms())]
    pub instant_scroll_ms: u64,

    #[serde(default = "defaults::viewer::settle_ms")]
    #[educe(Default = defaults::viewer::settle_ms())]
    pub settle_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::super::ManviewConfig;

    #[test]
    fn test_viewer_config_defaults() {
        let config: ManviewConfig = toml::from_str("").unwrap();
        let viewer = &config.viewer;
        assert_eq!(viewer.nav_offset, 120);
        assert_eq!(viewer.detection_line, 150);
        assert_eq!(viewer.smooth_scroll_ms, 800);
        assert_eq!(viewer.instant_scroll_ms, 100);
        assert_eq!(viewer.settle_ms, 100);
    }

    #[test]
    fn test_viewer_config_override() {
        let config: ManviewConfig = toml::from_str(
            r#"
            [viewer]
            nav_offset = 64
            smooth_scroll_ms = 500
        "#,
        )
        .unwrap();
        assert_eq!(config.viewer.nav_offset, 64);
        assert_eq!(config.viewer.smooth_scroll_ms, 500);
        assert_eq!(config.viewer.detection_line, 150);
    }

    #[test]
    fn test_viewer_unknown_field_rejected() {
        assert!(toml::from_str::<ManviewConfig>("[viewer]\noffset = 1").is_err());
    }
}
