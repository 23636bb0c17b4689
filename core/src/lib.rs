pub mod cleaner;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod event_steps;
pub mod hiring;
pub mod jobs;
pub mod reference_engine;
pub mod rng;
pub mod sequencer;
pub mod snapshot;
pub mod step;
pub mod store;
pub mod transform;
pub mod types;
pub mod validator;
pub mod workforce;
pub mod workforce_steps;
pub mod year;
