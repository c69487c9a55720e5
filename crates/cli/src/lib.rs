//! Command-line driver for the tether host running on the headless engine.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod output;
