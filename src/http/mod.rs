pub mod client;

pub use client::ThrottledClient;
