#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod array;
pub mod binpred;
pub mod error;
pub mod meta;
pub mod series;

pub use array::GeoColumn;
pub use binpred::{Predicate, PredicateResult};
pub use error::{GeoUnionError, Result};
pub use meta::{ColumnShape, FeatureTag};
pub use series::{GeoSeries, PointIndices};
