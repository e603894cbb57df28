//! `bistro-events` — reactive state and simulated-latency plumbing.
//!
//! - [`observable`]: value holders with synchronous fan-out and live projections
//! - [`scheduler`]: delayed-task execution (tokio, immediate, virtual time)
//! - [`pending`]: future handles for scheduled operations
//! - [`in_flight`]: outstanding-operation flag shared by stores

pub mod context;
pub mod in_flight;
pub mod observable;
pub mod pending;
pub mod scheduler;

pub use context::StoreContext;
pub use in_flight::{InFlight, InFlightGuard};
pub use observable::{Observable, Projection, Subscription};
pub use pending::{Completer, Pending, pending};
pub use scheduler::{
    ImmediateScheduler, ManualScheduler, Scheduler, Task, TokioScheduler, schedule,
};
