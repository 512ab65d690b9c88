//! Fetch Module
//!
//! Request and response values flowing through fetch interception.

mod request;
mod response;

pub use request::{same_origin, CacheMode, Destination, Request, RequestKey};
pub use response::{Response, ResponseType};
