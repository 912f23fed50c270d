//! Data Transfer Objects for REST request/response serialization.
//!
//! All JSON fields are camelCase. JXP amounts fit in `u64`; on-chain
//! token amounts never cross this surface (they stay inside the engine
//! as `U256`).

pub mod admin_dto;
pub mod sync_dto;

pub use admin_dto::*;
pub use sync_dto::*;
