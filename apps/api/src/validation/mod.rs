pub mod formatter;
pub mod handlers;
pub mod health;

pub use formatter::format_latex;
pub use health::{check_health, HealthReport};
