pub mod structuring;
pub mod strategies;
pub mod dispatcher;
pub mod consistency;


pub use consistency::parse_consistency_response;
pub use dispatcher::{parse_timeline_response, ResponseParser};
