//! Diary backend adapters

mod http;

pub use http::HttpDiaryClient;
