//! Type coercion module
//!
//! Converts between declared wire types and loosely-typed values.
//!
//! # Overview
//!
//! Values reach the crate as raw strings (user payloads on the send path) or
//! as decoded JSON (the read path). Both are turned into a [`WireValue`]
//! carrying its [`WireType`], and [`decoerce`] / [`WireValue::to_json`] turn
//! typed values back into their raw and wire forms.

mod coercion;
mod types;

pub use coercion::{
    coerce, coerce_generic, coerce_json, coerce_untyped, decoerce, normalize_number,
    parse_datetime, parse_rfc3339,
};
pub use types::{WireType, WireValue};

#[cfg(test)]
mod tests;
