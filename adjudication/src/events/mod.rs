//! Court notifications.
//!
//! ```text
//! ┌────────────┐  broadcast()  ┌──────────────┐  recv()  ┌──────────────┐
//! │   Court    │──────────────▶│   EventBus   │─────────▶│ CaseReceiver │
//! │ (run_case) │               │ (broadcast)  │          │  (per case)  │
//! └────────────┘               └──────────────┘          └──────────────┘
//! ```
//!
//! Events are notifications only. Nothing in the core reads them back.

pub mod bus;
pub mod types;

pub use bus::{CaseReceiver, EventBus, SharedEventBus};
pub use types::CourtEvent;
