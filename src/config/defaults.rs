//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

pub fn r#true() -> bool {
    true
}

// ============================================================================
// [base] Section Defaults
// ============================================================================

pub mod base {
    pub fn title() -> String {
        "Manuals".into()
    }
}

// ============================================================================
// [library] Section Defaults
// ============================================================================

pub mod library {
    use std::path::PathBuf;

    pub fn dir() -> PathBuf {
        "manuals".into()
    }
}

// ============================================================================
// [viewer] Section Defaults
// ============================================================================

pub mod viewer {
    /// Space left above a heading after navigating to it.
    pub fn nav_offset() -> u32 {
        120
    }

    /// Viewport line a heading must have crossed to become active.
    pub fn detection_line() -> u32 {
        150
    }

    pub fn smooth_scroll_ms() -> u64 {
        800
    }

    pub fn instant_scroll_ms() -> u64 {
        100
    }

    /// Delay between a content change and restoring the URL fragment.
    pub fn settle_ms() -> u64 {
        100
    }
}

// ============================================================================
// [serve] Section Defaults
// ============================================================================

pub mod serve {
    use std::path::PathBuf;

    pub fn interface() -> String {
        "127.0.0.1".into()
    }

    pub fn port() -> u16 {
        5280
    }

    pub fn static_dir() -> Option<PathBuf> {
        None
    }
}
