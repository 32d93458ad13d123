//! huggies - demo MCP connector for Huggies parenting tools
//!
//! Eight read-only tools over static knowledge tables, each paired with a
//! widget the host renders inline. The MCP runtime (registry, dispatch,
//! sessions, widget cache) is `skybridge`; this crate supplies the tables,
//! the handlers, the widget catalog, and the HTTP app around them.

pub mod app;
pub mod knowledge;
pub mod tools;
pub mod widgets;

pub use app::{build_state, router, AppState};
pub use knowledge::KnowledgeBase;
