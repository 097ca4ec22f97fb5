//! Reference percentile tables (WHO / CDC).
//!
//! A [`ReferenceTable`] is the validated form of a metric's curve: rows sorted
//! by age, each carrying reference values at a sparse set of percentile ranks.
//! A [`ReferenceSet`] groups the three tables of one growth standard and can be
//! loaded from the embedded defaults or from TOML/JSON files.

pub mod error;
pub mod row;
pub mod set;
pub mod table;

pub use error::TableError;
pub use row::{PercentilePoint, ReferenceRow};
pub use set::ReferenceSet;
pub use table::ReferenceTable;
