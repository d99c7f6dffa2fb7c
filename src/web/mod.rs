pub mod admin;
pub mod api;
pub mod auth;
pub mod landing;
pub mod responses;
pub mod router;
pub mod state;
pub mod templates;

pub use state::AppState;
pub use templates::{escape_html, render_footer, render_login_page};
