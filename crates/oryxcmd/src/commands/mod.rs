//! One thin module per CLI verb; each validates nothing beyond its
//! argument arity (clap's job) and delegates to the registry.
use anyhow::Result;

pub mod add_guest;
pub mod add_source;
pub mod disable_guest;
pub mod enable_guest;
pub mod list_guests;
pub mod list_sources;
pub mod remove_guest;
pub mod remove_source;
pub mod runc;
pub mod show_guest;
pub mod show_source;

/// Prints a record as indented JSON with sorted keys, the format the
/// `show_*` verbs have always produced.
pub(crate) fn print_json<T: serde::Serialize>(record: &T) -> Result<()> {
    let value = serde_json::to_value(record)?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
