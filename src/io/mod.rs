pub mod reader;
pub mod writer;

pub use reader::{parse_objects, read_objects};
pub use writer::{CENTROIDS_FILE, MEMBERSHIP_FILE, OutputPaths, write_results};
