pub mod account;
pub mod destination;
pub mod payment;
pub mod quote;
pub mod response;

pub use account::*;
pub use destination::*;
pub use payment::*;
pub use quote::*;
pub use response::*;
