// src/lib.rs
// Public library: Hebbian weight store, energy-minimizing recall, and the
// HTTP adapter that serves them

pub mod config;
pub mod error;
pub mod memory;
pub mod models;
pub mod recall;
pub mod server;
pub mod utils;
pub mod weights;

pub use config::*;
pub use error::*;
pub use memory::*;
pub use models::*;
pub use recall::*;
pub use server::*;
pub use weights::*;

use log::info;

/// Initialize logging (call once at startup). `RUST_LOG` overrides the default `info` filter.
pub fn init_logging() {
    let initialized = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init()
        .is_ok();
    if initialized {
        info!("hebbgrid logging initialized");
    }
}
