//! Navigation state for one rendered document.
//!
//! | Module      | Purpose                                           |
//! |-------------|---------------------------------------------------|
//! | `scroll`    | Active heading, programmatic scroll, fragments    |
//! | `expansion` | Sidebar section expansion map                     |
//! | `sidebar`   | Sidebar entries and click policy                  |
//! | `state`     | Session container and load lifecycle              |

pub mod expansion;
pub mod scroll;
pub mod sidebar;
pub mod state;

pub use expansion::ExpansionTracker;
pub use scroll::{
    ContentLayout, HeadingBox, Location, ScrollRequest, ScrollSettings, ScrollState, ScrollSync,
};
pub use sidebar::{SidebarAction, SidebarItem, SidebarSubItem};
pub use state::{DocumentView, LoadStatus, ViewModel, ViewerSession};
