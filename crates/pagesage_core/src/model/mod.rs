//! Domain model for a book index.
//!
//! # Responsibility
//! - Define the value types shared by repositories, services and exporters.
//! - Own the canonical `book:page[-page]` reference grammar.
//!
//! # Invariants
//! - A `PageRef` is always normalized: `page_end`, when present, is strictly
//!   greater than `page_start`.
//! - Term identity is the case-folded name; display keeps the stored casing.

pub mod book;
pub mod entry;
pub mod reference;
pub mod term;
