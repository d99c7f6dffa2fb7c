pub mod slug;
pub mod validation;

pub use slug::generate_slug;
