pub mod client;
pub mod ctx;
pub mod error;
pub mod model;

pub use client::UserDirectoryApi;
pub use ctx::{CallCtx, Interrupted};
pub use error::UserDirectoryError;
pub use model::{
    NewPhoto, NewUser, PhotoContent, PhotoMeta, RoleName, User, UserPatch, UserStatus,
    ADMIN_ROLE_NAME,
};
