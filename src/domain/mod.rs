pub mod clustering;
pub mod error;

pub use clustering::{Clustering, ObjectSet, Termination, UNASSIGNED};
pub use error::KMeansError;
