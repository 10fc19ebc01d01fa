pub mod json;

pub use json::{export_set_to_path, import_set_file};
