pub mod annotate;
pub mod configure;
pub mod export;
pub mod info;
