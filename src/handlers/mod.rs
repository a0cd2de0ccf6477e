pub mod accounts;
pub mod fx;
pub mod health;
pub mod payments;
pub mod rates;
pub mod stats;
pub mod stream;
pub mod webhooks;

pub use accounts::*;
pub use fx::*;
pub use health::*;
pub use payments::*;
pub use rates::*;
pub use stats::*;
pub use stream::*;
pub use webhooks::*;
