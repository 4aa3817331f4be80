pub mod client;
pub mod filing;
pub mod rate_limiter;
pub mod stock;

pub use self::client::EdgarClient;
pub use self::stock::Stock;
