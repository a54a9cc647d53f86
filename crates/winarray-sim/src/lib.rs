//! winarray Simulator
//!
//! Seeded scroll simulations of a [`RemoteArray`](winarray_remote::RemoteArray)
//! over a virtual remote collection, checking the windowing and fetching
//! invariants after every step.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use winarray_sim::{run_simulator, SimulatorConfig};
//!
//! let config = SimulatorConfig::default().with_seed(7).with_steps(500);
//! let report = run_simulator(config).await?;
//! println!("{}", report.generate_text());
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod simulator;

// Re-exports
pub use config::SimulatorConfig;
pub use error::SimError;
pub use simulator::{run_simulator, SimulatedAction, SimulatorReport, SimulatorStats, Violation};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
