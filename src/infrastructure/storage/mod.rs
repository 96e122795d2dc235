//! Local file storage adapters

mod fs;

pub use fs::FsStorage;
