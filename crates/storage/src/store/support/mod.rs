#![forbid(unsafe_code)]

mod schema;
mod table_info;
mod time;
mod values;

pub(super) use schema::install_schema;
pub(super) use table_info::*;
pub(super) use time::now_ms;
pub(super) use values::*;
