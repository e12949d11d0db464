pub mod traits;
pub mod json;
pub mod vendor_markdown;
pub mod markdown;
pub mod structured_text;

pub use traits::ParseStrategy;
pub use json::JsonStrategy;
pub use vendor_markdown::VendorMarkdownStrategy;
pub use markdown::MarkdownStrategy;
pub use structured_text::StructuredTextStrategy;
