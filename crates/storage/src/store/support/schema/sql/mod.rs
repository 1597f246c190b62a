#![forbid(unsafe_code)]

mod characters;
mod chronicle;
mod core;
mod indexes;
mod narrative;

pub(super) fn full_schema_sql() -> String {
    let mut sql = String::new();
    sql.push_str(core::SQL);
    sql.push_str(characters::SQL);
    sql.push_str(narrative::SQL);
    sql.push_str(chronicle::SQL);
    sql.push_str(indexes::SQL);
    sql
}
