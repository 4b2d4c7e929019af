//! HTTP parameter endpoint
//!
//! - `GET /getParams`: current parameters and direction
//! - `GET /setParams?rs=&ra=&rd=&cis=&fis=&sm=&dt=`: merge and queue a move
//! - anything else: 404

pub mod endpoint;
pub mod response;
pub mod route;

pub use endpoint::{Endpoint, Reply, RequestOutcome};
pub use response::{Response, RESPONSE_CAPACITY};
pub use route::Route;

/// Size of the request buffer
pub const REQUEST_CAPACITY: usize = 1024;
