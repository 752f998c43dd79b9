//! Core domain logic for weekmenu.
//!
//! - [`shopping`] -- the shopping list engine: identity keying,
//!   reconciliation of regenerated batches against user edits, the ordering
//!   rules for the open/checked partitions, and the sync gateway that
//!   treats the store's response as authoritative.
//! - [`plan`] -- the meal plan engine: recipe scoring, rotation limits and
//!   plan generation over cook days.
//! - [`generate`] -- the generator seam between the two: turns the planned
//!   meals in a date range into raw shopping list entries.

pub mod generate;
pub mod plan;
pub mod shopping;
