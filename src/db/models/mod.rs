//! Database models split into domain-specific modules.

pub mod attendance;
pub mod department;
pub mod document;
pub mod employee;
pub mod leave;
pub mod report;
pub mod review;
pub mod transaction;
pub mod user;

pub use attendance::*;
pub use department::*;
pub use document::*;
pub use employee::*;
pub use leave::*;
pub use report::*;
pub use review::*;
pub use transaction::*;
pub use user::*;
