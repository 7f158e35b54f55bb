// fisand-aio/src/lib.rs
//! Asynchronous IO operations for fisand (filesystem, json)

pub mod fs;
pub mod json_io;

pub use fs::{create_dir_all_async, is_directory_async, write_file_async};
pub use json_io::write_json_async;
