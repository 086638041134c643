//! CLI commands implementation

pub mod bulk;
pub mod content;
pub mod init;
pub mod render;
pub mod schemas;
pub mod status;

pub use bulk::*;
pub use content::*;
pub use init::*;
pub use render::*;
pub use schemas::*;
pub use status::*;
