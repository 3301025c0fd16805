#![forbid(unsafe_code)]

//! Ready-made mask definitions for segmask.
//!
//! Every constructor returns a [`MaskDefinition`](segmask_core::MaskDefinition)
//! built from a small configuration struct. The [`common`] helpers are public
//! so custom masks can render, filter, and spin the same way.

pub mod common;
pub mod date;
pub mod ean;
pub mod integer;
pub mod ipv4;
pub mod ipv6;
pub mod isbn;
mod isbn_ranges;
pub mod isrc;
pub mod numeric;
pub mod uuid;
pub mod year;
pub mod year_month;

pub use date::{DateConfig, DateStyle, date_mask};
pub use ean::ean_mask;
pub use integer::{IntegerConfig, integer_mask};
pub use ipv4::ipv4_mask;
pub use ipv6::ipv6_mask;
pub use isbn::isbn_mask;
pub use isrc::isrc_mask;
pub use numeric::{NumericConfig, numeric_mask};
pub use uuid::{UuidConfig, uuid_mask};
pub use year::{YearConfig, year_mask};
pub use year_month::{YearMonth, YearMonthConfig, year_month_mask};
