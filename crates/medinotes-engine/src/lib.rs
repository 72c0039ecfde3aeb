pub mod editing;
pub mod layout;

// Re-export key types for easier usage
pub use editing::*;
pub use layout::*;
