//! Orb and profile data model, import parsing and persisted state.

pub mod import;
pub mod orb;
pub mod persist;
pub mod profile;
pub mod rarity;

pub use orb::Orb;
pub use profile::{Objective, Profile, WeightMapKind};
pub use rarity::{normalize_category_rarity, slots_for_rarity, CategoryRarity, Rarity};
