//! Character movement and capsule-vs-trimesh collision for the tower run.
//!
//! Goals:
//! - Deterministic fixed-order update: input, gravity, substepped move and
//!   push-out, ground snap, state bookkeeping
//! - Discrete collision against baked static triangle soup (BVH accelerated)
//! - All feel constants live in [`config::Tuning`] so they can be overridden
//!   from a config file without touching code
//!
//! The crate is renderer-agnostic: it owns positions and velocities, the
//! client owns meshes, lights and cameras.

pub mod bvh;
pub mod capsule;
pub mod checkpoint;
pub mod collide;
pub mod config;
pub mod geom;
pub mod player;
pub mod world;

pub use capsule::Capsule;
pub use checkpoint::Checkpoints;
pub use collide::{resolve_capsule, snap_to_ground, Resolution};
pub use config::Tuning;
pub use player::{PlayerController, PlayerInput};
pub use world::{CollisionWorld, CollisionWorldBuilder, RayHit};
