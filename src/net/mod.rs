pub mod tcp;
pub use self::tcp::*;
