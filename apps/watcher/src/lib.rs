pub mod commands;
pub mod config;
mod main_lib;

pub use main_lib::{
    describe_balances, describe_horses, describe_stable, handle, init_tracing, run, Stores,
};
