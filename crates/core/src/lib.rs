//! Domain types shared by every sitesmith crate.

pub mod domain;
pub mod error;

pub use domain::files::{GeneratedFileSet, DOCUMENTATION_FILE, ENTRY_POINT_FILE, LICENSE_FILE};
pub use domain::publish::{NotificationPayload, PublishOperation, PublishResult};
pub use domain::stage::TaskStage;
pub use domain::task::{Attachment, Round, Task};
pub use error::{CoreError, Result};
