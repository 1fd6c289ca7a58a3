// Library exports for the overseer overlay-engine supervisor

pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod process;
pub mod state;
