//! # macrohub-domain
//!
//! Pure domain model for the macrohub automation core.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Controls** (references to externally-owned device endpoints,
//!   typed values flowing from them, commands flowing back)
//! - Define the **macro lifecycle contract** ([`macros::MacroLogic`]) shared
//!   by every automation type
//! - Define the **cover macro** — sensor aggregation, the priority rule
//!   chain, and output computation for one shading device
//! - Versioned settings parsing with an ordered migration chain
//! - The macro-type showcase catalog
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod control;
pub mod cover;
pub mod macros;
pub mod migration;
pub mod showcase;
