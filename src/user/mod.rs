//! Account profile surface: read, partial update, deletion.

pub mod handlers;

pub use handlers::ProfileResponse;
