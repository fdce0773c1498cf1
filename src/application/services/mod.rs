//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (ServerApi, Clock)
//! but are themselves concrete structs, not traits.

mod custom_info;
mod groups;
mod packages;
mod reports;
mod resolver;
mod subscriptions;
mod systems;
mod tasks;

pub use custom_info::CustomInfoService;
pub use groups::GroupService;
pub use packages::PackageService;
pub use reports::ReportService;
pub use resolver::SystemResolver;
pub use subscriptions::SubscriptionService;
pub use systems::{RegisterRequest, ReleaseSource, SystemChanges, SystemDetails, SystemService};
pub use tasks::{PollOptions, TaskPoller, POLL_INTERVAL};
