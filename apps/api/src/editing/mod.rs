// Surgical editing: propose candidate rewrites for one section, then apply the
// chosen one to the caller's current document.

pub mod apply;
pub mod handlers;
pub mod models;
pub mod prompts;
pub mod proposal;
pub mod session_store;
