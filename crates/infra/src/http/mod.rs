//! HTTP transport with retry

pub mod client;

pub use client::{retry_until_definitive, HttpClient, HttpClientBuilder};
