pub mod errors;
pub mod forward;
pub mod recovery;
pub mod streaming;
