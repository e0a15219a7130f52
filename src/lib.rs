//! TetrECS (workspace facade crate).
//!
//! Re-exports the member crates under short names so callers can write
//! `tetrecs::core::Game` or `tetrecs::net::MultiplayerSession`. The
//! implementation lives in the dedicated crates under `crates/`.

pub use tetrecs_core as core;
pub use tetrecs_engine as engine;
pub use tetrecs_net as net;
pub use tetrecs_store as store;
pub use tetrecs_types as types;
