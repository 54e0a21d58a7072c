//! Assessment of the value proposition of distributed generation (DG) equipment, typically
//! combined heat and power (CHP), across regions, sectors and years.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod analysis;
pub mod chp;
pub mod cli;
pub mod economics;
pub mod finance;
pub mod id;
pub mod inflation;
pub mod input;
pub mod log;
pub mod market;
pub mod output;
pub mod parameter;
pub mod plot;
pub mod rates;
pub mod region;
pub mod sensitivity;
pub mod settings;
pub mod units;

#[cfg(test)]
mod fixture;

/// Get the directory in which program configuration files are stored
pub fn get_config_dir() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("dg_valprop");
    path
}
