pub mod client;
pub mod multipart;
pub mod partition;
pub mod store;

pub use client::connect;
pub use multipart::multipart_upload;
