use std::sync::Arc;

use axum::{
    body::Body,
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, QueryRejection},
        Multipart, Path, Query,
    },
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
    Extension,
};
use bytes::Bytes;
use tokio_util::io::ReaderStream;
use tracing::{error, info};

use crate::api::rest::dto::{
    CreateUserReq, EditUserReq, IdDto, ListUsersQuery, UserDto, UserEditDto, UserListDto,
};
use crate::api::rest::error::{bad_request, map_domain_error};
use crate::api::rest::problem::ProblemResponse;
use crate::api::rest::routes::ApiState;
use crate::contract::model::{NewPhoto, UserPatch};

/// Header carrying the acting role id.
pub const ROLE_ID_HEADER: &str = "role-id";

const DEFAULT_PHOTO_CONTENT_TYPE: &str = "application/octet-stream";

fn acting_role_id(headers: &HeaderMap) -> String {
    headers
        .get(ROLE_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

/// List users, oldest first
pub async fn list_users(
    Extension(state): Extension<Arc<ApiState>>,
    query: Result<Query<ListUsersQuery>, QueryRejection>,
    uri: Uri,
) -> Result<Json<UserListDto>, ProblemResponse> {
    let Query(query) = query.map_err(|e| bad_request(e.body_text(), uri.path()))?;
    info!("Listing users with query: {:?}", query);

    let limit = state.directory.effective_limit(query.limit);
    match state
        .call_ctx()
        .bound(state.directory.list_users(query.limit))
        .await
    {
        Ok(users) => Ok(Json(UserListDto {
            limit,
            list: users.into_iter().map(UserDto::from).collect(),
        })),
        Err(e) => {
            error!("Failed to list users: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Create a new user
pub async fn create_user(
    uri: Uri,
    headers: HeaderMap,
    Extension(state): Extension<Arc<ApiState>>,
    body: Result<Json<CreateUserReq>, JsonRejection>,
) -> Result<(StatusCode, Json<IdDto>), ProblemResponse> {
    let Json(req_body) = body.map_err(|e| bad_request(e.body_text(), uri.path()))?;
    info!("Creating user: {:?}", req_body);

    let role_id = acting_role_id(&headers);
    match state
        .call_ctx()
        .bound(state.directory.create_user(req_body.into(), &role_id))
        .await
    {
        Ok(id) => Ok((StatusCode::CREATED, Json(IdDto { id }))),
        Err(e) => {
            error!("Failed to create user: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Merge the supplied fields over a stored user
pub async fn edit_user(
    uri: Uri,
    headers: HeaderMap,
    Extension(state): Extension<Arc<ApiState>>,
    body: Result<Json<EditUserReq>, JsonRejection>,
) -> Result<Json<UserEditDto>, ProblemResponse> {
    let Json(req_body) = body.map_err(|e| bad_request(e.body_text(), uri.path()))?;
    info!("Editing user: {:?}", req_body);

    let patch = UserPatch::try_from(req_body).map_err(|e| bad_request(e, uri.path()))?;
    let role_id = acting_role_id(&headers);
    match state
        .call_ctx()
        .bound(state.directory.edit_user(patch, &role_id))
        .await
    {
        Ok(user) => Ok(Json(UserEditDto::from(user))),
        Err(e) => {
            error!("Failed to edit user: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Delete a user by ID
pub async fn delete_user(
    uri: Uri,
    headers: HeaderMap,
    Extension(state): Extension<Arc<ApiState>>,
    body: Result<Json<IdDto>, JsonRejection>,
) -> Result<Json<IdDto>, ProblemResponse> {
    let Json(req_body) = body.map_err(|e| bad_request(e.body_text(), uri.path()))?;
    info!("Deleting user: {}", req_body.id);

    let role_id = acting_role_id(&headers);
    match state
        .call_ctx()
        .bound(state.directory.delete_user(&req_body.id, &role_id))
        .await
    {
        Ok(id) => Ok(Json(IdDto { id })),
        Err(e) => {
            error!("Failed to delete user {}: {}", req_body.id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Upload the profile photo of a user (multipart: `file` + `userId`)
pub async fn upload_photo(
    uri: Uri,
    Extension(state): Extension<Arc<ApiState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<IdDto>), ProblemResponse> {
    let mut multipart = multipart.map_err(|e| bad_request(e.body_text(), uri.path()))?;

    let mut user_id: Option<String> = None;
    let mut file: Option<(String, String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(e.body_text(), uri.path()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "userId" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| bad_request(e.body_text(), uri.path()))?;
                user_id = Some(text.trim().to_string());
            }
            "file" => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| bad_request("file part has no filename", uri.path()))?;
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_else(|| DEFAULT_PHOTO_CONTENT_TYPE.to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| bad_request(e.body_text(), uri.path()))?;
                file = Some((filename, content_type, data));
            }
            _ => {}
        }
    }

    let user_id = user_id.ok_or_else(|| bad_request("missing 'userId' field", uri.path()))?;
    let (filename, content_type, content) =
        file.ok_or_else(|| bad_request("missing 'file' field", uri.path()))?;
    info!(
        "Uploading photo '{}' ({} bytes) for user {}",
        filename,
        content.len(),
        user_id
    );

    let photo = NewPhoto {
        user_id,
        filename,
        content_type,
        size: i64::try_from(content.len()).unwrap_or(i64::MAX),
        content,
    };
    match state
        .call_ctx()
        .bound(state.photos.upload_photo(photo))
        .await
    {
        Ok(id) => Ok((StatusCode::CREATED, Json(IdDto { id }))),
        Err(e) => {
            error!("Failed to upload photo: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Stream the stored profile photo of a user
pub async fn get_profile_photo(
    uri: Uri,
    Extension(state): Extension<Arc<ApiState>>,
    Path(user_id): Path<String>,
) -> Result<Response, ProblemResponse> {
    info!("Fetching photo of user {}", user_id);

    let content = state
        .call_ctx()
        .bound(state.photos.get_photo_content(&user_id))
        .await
        .map_err(|e| {
            error!("Failed to fetch photo of user {}: {}", user_id, e);
            map_domain_error(&e, uri.path())
        })?;

    let body = Body::from_stream(ReaderStream::new(content.reader));
    Ok(([(header::CONTENT_TYPE, content.content_type)], body).into_response())
}
