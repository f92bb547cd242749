//! Converts MapReduce application names to actual application code.
//!
//! # Example
//!
//! To get the word count application:
//! ```
//! # use anyhow::Result;
//! use mrtask::workload;
//! # fn main() -> Result<()> {
//! let wc = workload::named("wc")?;
//! let counts = (wc.map_fn)("in.txt", "to be or not to be");
//! assert_eq!(counts.len(), 6);
//! # Ok(())
//! # }
//! ```

use crate::Workload;
use anyhow::{bail, Result};

pub mod ii;
pub mod wc;

/// Names accepted by [`named`].
pub const NAMES: &[&str] = &["wc", "ii"];

/// Gets the [`Workload`] named `name`.
///
/// Returns [`None`] if no application with the given name was found.
pub fn try_named(name: &str) -> Option<Workload> {
    match name {
        "wc" => Some(Workload {
            map_fn: wc::map,
            reduce_fn: wc::reduce,
        }),
        "ii" => Some(Workload {
            map_fn: ii::map,
            reduce_fn: ii::reduce,
        }),
        _ => None,
    }
}

/// Gets the [`Workload`] named `name`.
///
/// Returns an [`anyhow::Error`] if no application with the given name was found.
pub fn named(name: &str) -> Result<Workload> {
    match try_named(name) {
        Some(app) => Ok(app),
        None => bail!("No app named `{}` found.", name),
    }
}
