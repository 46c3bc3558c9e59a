pub mod audit_use_case;
pub mod ports;
pub mod recommendations;

pub use audit_use_case::{AuditReport, AuditService};
pub use ports::RecommendationPort;
