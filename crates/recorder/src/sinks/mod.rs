//! Sink implementations

mod file;

pub use self::file::ImageFileSink;
