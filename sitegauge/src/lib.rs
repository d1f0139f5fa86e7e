pub mod commands;
pub mod handlers;

pub use handlers::{build_audit_config, exit_code_for, handle_audit};

pub use sitegauge_core::audit::{AuditOptions, AuditOutcome, AuditProgressCallback, execute_audit};
