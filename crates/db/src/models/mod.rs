//! Row structs and DTOs.
//!
//! Each submodule contains a `FromRow` struct matching the table row and,
//! where rows are inserted, a create DTO.

pub mod ad_version;
pub mod mixer_state;
pub mod stream_pointer;
