use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Extension, Router,
};

use crate::api::rest::handlers;
use crate::contract::ctx::CallCtx;
use crate::domain::{photos::ProfilePhotos, service::UserDirectory};

/// Services and per-call limits shared by the REST handlers.
pub struct ApiState {
    pub directory: Arc<UserDirectory>,
    pub photos: Arc<ProfilePhotos>,
    pub call_timeout: Duration,
}

impl ApiState {
    /// Fresh call context for one request.
    pub fn call_ctx(&self) -> CallCtx {
        CallCtx::new().with_timeout(self.call_timeout)
    }
}

/// Largest accepted multipart upload for a profile photo.
pub const MAX_PHOTO_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn register_routes(router: Router, state: ApiState) -> Router {
    router
        .route("/api/user/list", get(handlers::list_users))
        .route("/api/user/create", post(handlers::create_user))
        .route("/api/user/edit", put(handlers::edit_user))
        .route("/api/user/delete", delete(handlers::delete_user))
        .route(
            "/api/user/photo",
            post(handlers::upload_photo).layer(DefaultBodyLimit::max(MAX_PHOTO_UPLOAD_BYTES)),
        )
        .route("/api/user/photo/{userid}", get(handlers::get_profile_photo))
        .layer(Extension(Arc::new(state)))
}
