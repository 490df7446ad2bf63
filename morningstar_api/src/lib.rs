mod client;
mod errors;
mod user_agent;
pub use self::client::{BearerToken, Client, ComponentOutcome, SearchHit};
pub use self::errors::Error;
