pub mod export;
pub mod rollup;
pub mod summary;
