pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod models {
    pub mod codec;
    pub mod document;
}
pub mod storage {
    pub mod client;
}
pub mod api {
    pub mod documents;
    pub mod errors;
    pub mod files;
}
