mod about;
mod not_found;

pub use about::AboutPage;
pub use not_found::NotFoundPage;
