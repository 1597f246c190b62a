#![forbid(unsafe_code)]

pub mod clone;

pub use clone::*;
