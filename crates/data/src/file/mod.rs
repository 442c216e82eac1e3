pub mod json_file_persister;
pub mod file_store;
