//! Derived dependency indices used by the aliasing engines

pub mod packages;
pub mod products;

pub use packages::PackageTree;
pub use products::ProductIndex;
