//! Extracts data tables from Lua modules without running them.
//!
//! Game wikis often publish their data as Lua modules made of assignments
//! like `items["Magnum"] = { Name = "Magnum", Quality = "C" }`. This crate
//! reads the literal subset of Lua those modules use and returns every
//! `name["key"] = { ... }` assignment as a [`Table`]. Anything else in the
//! module, including code it cannot parse, is skipped rather than reported as
//! an error.
//!
//! ```
//! use luatab::{extract_tables, Value};
//!
//! let module = r#"
//!     local items = {}
//!     items["Magnum"] = { Name = "Magnum", Stats = { Damage = 14 } }
//!     items["Broken"] = { Name = "Broken", Damage = getDamage() }
//!     return items
//! "#;
//! let tables = extract_tables(module);
//! assert_eq!(tables.len(), 2);
//!
//! let magnum = tables.get_str("Magnum").unwrap();
//! let damage = magnum.get("Stats").and_then(|s| s.get("Damage"));
//! assert_eq!(damage, Some(&Value::Number(14.0)));
//!
//! let broken = tables.get_str("Broken").unwrap();
//! assert_eq!(broken.get("Damage"), Some(&Value::Opaque("getDamage()".into())));
//! ```

#![warn(future_incompatible)]
#![warn(non_ascii_idents)]
#![warn(rust_2018_idioms)]
#![warn(single_use_lifetimes)]
#![warn(trivial_casts)]
#![warn(trivial_numeric_casts)]
#![warn(unreachable_pub)]
#![warn(unused)]

mod diagnostic;
mod error;
mod eval;
mod extract;
mod rows;
mod stack;
mod syntax;
mod value;

pub use diagnostic::{Diagnostic, DropReason, Location, RejectReason};
pub use error::Error;
pub use extract::{
    extract_tables, extract_tables_from_bytes, extract_tables_with_diagnostics, Extraction,
};
pub use rows::{entity_rows, EntityRow};
pub use value::{Key, Table, Value};

/// Custom result type for the fallible edges of the crate.
pub type Result<T> = std::result::Result<T, Error>;
