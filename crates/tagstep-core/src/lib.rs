//! `tagstep-core` — advances mailing-list members along a chain of lifecycle
//! tags for every address found in a CRM export.
//!
//! ```text
//! Advancer ──► ListClient (lookup list, fetch members)
//!    │
//!    ├──► planner::plan      (pure: tags → add / remove sets)
//!    │
//!    └──► BatchTagUpdater ──► ListClient (batches of ≤ 200, retried)
//! ```

pub mod advance;
pub mod client;
pub mod config;
pub mod error;
pub mod io;
pub mod lease;
pub mod paths;
pub mod planner;
pub mod report;
pub mod retry;
pub mod stage;
pub mod types;
pub mod updater;

#[cfg(test)]
mod testing;

pub use advance::{AdvancementPlan, Advancer};
pub use client::{HttpListClient, ListClient};
pub use config::{Config, Credentials};
pub use error::{RemoteCause, Result, TagstepError};
pub use stage::StageMap;
pub use types::{AdvancementResult, Member, TagStatus};
