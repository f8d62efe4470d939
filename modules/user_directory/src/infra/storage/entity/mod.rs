pub mod profile_photo;
pub mod role;
pub mod user;
