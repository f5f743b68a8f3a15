pub mod secrets;
pub mod spotify;

pub use secrets::*;
pub use spotify::*;
