pub mod input;
pub mod keys;
pub mod metadata;
pub mod prelude;
pub mod scope;
