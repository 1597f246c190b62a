#![forbid(unsafe_code)]

mod config;
mod id_map;
mod order;
mod registry;
mod value;

pub use config::*;
pub use id_map::*;
pub use order::*;
pub use registry::*;
pub use value::*;
