//! Manview - parse, search and navigate converted HTML manuals.
//!
//! The crate is split into the document pipeline used by every front-end
//! and the pieces the `manview` binary adds on top of it:
//!
//! | Module       | Purpose                                              |
//! |--------------|------------------------------------------------------|
//! | `document`   | HTML tree, section parser, loader                    |
//! | `search`     | Normalized search and in-place highlighting          |
//! | `viewer`     | Scroll sync, sidebar expansion, per-load session     |
//! | `config`     | `manview.toml` handling                              |
//! | `library`    | Document catalog built from config                   |
//! | `serve`      | JSON + static HTTP server                            |
//! | `watch`      | Re-parse documents and config on change              |
//! | `commands`   | `outline`, `search` and `render` for one document    |

pub mod cli;
pub mod commands;
pub mod config;
pub mod document;
pub mod library;
pub mod logger;
pub mod search;
pub mod serve;
pub mod viewer;
pub mod watch;
