// Entity Models
//
// - Company: canonical roster identity + alias index (normalized full name is the key)
// - Post: one annotated post row with its source link

pub mod company;
pub mod post;

pub use company::{AliasCollision, AliasIndex, CanonicalCompany, RosterColumns};
pub use post::{Post, PostColumns};
