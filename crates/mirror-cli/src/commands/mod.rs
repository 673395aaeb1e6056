//! Command implementations for mirror-cli

pub mod list;
pub mod plan;
pub mod status;
pub mod sync;

pub use list::run_list;
pub use plan::run_plan;
pub use status::run_status;
pub use sync::run_sync;
