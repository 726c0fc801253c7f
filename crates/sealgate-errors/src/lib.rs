pub mod code;
pub mod disposition;
pub mod kind;
pub mod model;
pub mod prelude;
pub mod render;

pub use code::{codes, ErrorCode};
pub use disposition::Disposition;
pub use kind::ErrorKind;
pub use model::{ErrorBuilder, ErrorObj};
