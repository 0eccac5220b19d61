//! Synthetic traffic for the game backend services.
//!
//! A workload is a [`runner::User`] implementation: a set of weighted tasks a
//! simulated user repeats, plus an optional session start. HTTP workloads talk
//! to the profile and matchmaking services through [`client::HttpClient`];
//! the database workload goes through [`dispatch::Dispatcher`]. Both report
//! every request as a [`telemetry::RequestEvent`].

pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod runner;
pub mod session;
pub mod statistics;
pub mod store;
pub mod telemetry;
pub mod workload;

pub use error::TaskError;
