use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn, Instrument, Span};
use uuid::Uuid;

use crate::contract::model::{NewPhoto, PhotoContent, PhotoMeta};
use crate::domain::error::DomainError;
use crate::domain::ports::PhotoContentStore;
use crate::domain::repo::PhotosRepository;
use crate::domain::service::{stamp_now, UserDirectory};

/// One profile photo per user: metadata in the database, bytes in the content store.
#[derive(Clone)]
pub struct ProfilePhotos {
    directory: UserDirectory,
    photos: Arc<dyn PhotosRepository>,
    content: Arc<dyn PhotoContentStore>,
    locks: Arc<UserLocks>,
}

impl ProfilePhotos {
    pub fn new(
        directory: UserDirectory,
        photos: Arc<dyn PhotosRepository>,
        content: Arc<dyn PhotoContentStore>,
    ) -> Self {
        Self {
            directory,
            photos,
            content,
            locks: Arc::new(UserLocks::default()),
        }
    }

    #[instrument(
        name = "user_directory.photos.upload_photo",
        skip(self, photo),
        fields(user_id = %photo.user_id, filename = %photo.filename, size = photo.size)
    )]
    pub async fn upload_photo(&self, photo: NewPhoto) -> Result<String, DomainError> {
        info!("Uploading profile photo");

        let filename = plain_file_name(&photo.filename)?;
        if !self.directory.user_exists(&photo.user_id).await? {
            return Err(DomainError::user_not_found(&photo.user_id));
        }

        // Runs detached: a caller that times out or is cancelled must not stop
        // the sequence between the metadata insert and its cleanup.
        let this = self.clone();
        let task = async move {
            let user_id = photo.user_id.clone();
            this.locks
                .run_locked(&user_id, this.store_photo(photo, filename))
                .await
        };
        tokio::spawn(task.instrument(Span::current()))
            .await
            .map_err(|e| DomainError::store(format!("photo upload task failed: {e}")))?
    }

    /// Check-and-insert plus content write; callers hold the user's lock.
    async fn store_photo(&self, photo: NewPhoto, filename: String) -> Result<String, DomainError> {
        if self
            .photos
            .find_by_user(&photo.user_id)
            .await
            .map_err(DomainError::from_store)?
            .is_some()
        {
            return Err(DomainError::photo_already_exists(&photo.user_id));
        }

        let meta = PhotoMeta {
            id: Uuid::new_v4().to_string(),
            user_id: photo.user_id,
            filename,
            content_type: photo.content_type,
            size: photo.size,
            created_at: stamp_now(),
        };
        self.photos
            .insert(meta.clone())
            .await
            .map_err(DomainError::from_store)?;

        if let Err(e) = self.content.write(&meta.filename, photo.content).await {
            error!(photo_id = %meta.id, "Failed to write photo content: {e:#}");
            match self.photos.delete(&meta.id).await {
                Ok(_) => warn!(photo_id = %meta.id, "Removed metadata of unwritten photo"),
                Err(cleanup) => error!(
                    photo_id = %meta.id,
                    "Metadata row left without content, cleanup failed: {cleanup:#}"
                ),
            }
            return Err(DomainError::store(format!(
                "failed to store photo content: {e:#}"
            )));
        }

        info!(photo_id = %meta.id, "Successfully stored profile photo");
        Ok(meta.id)
    }

    #[instrument(name = "user_directory.photos.get_photo_metadata", skip(self), fields(user_id = %user_id))]
    pub async fn get_photo_metadata(&self, user_id: &str) -> Result<PhotoMeta, DomainError> {
        self.photos
            .find_by_user(user_id)
            .await
            .map_err(DomainError::from_store)?
            .ok_or_else(|| DomainError::photo_not_found(user_id))
    }

    #[instrument(name = "user_directory.photos.get_photo_content", skip(self), fields(user_id = %user_id))]
    pub async fn get_photo_content(&self, user_id: &str) -> Result<PhotoContent, DomainError> {
        let meta = self.get_photo_metadata(user_id).await?;
        let reader = self.content.open(&meta.filename).await.map_err(|e| {
            error!(photo_id = %meta.id, "Failed to open photo content: {e:#}");
            DomainError::store(format!("failed to open photo content: {e:#}"))
        })?;

        debug!(content_type = %meta.content_type, "Opened photo content");
        Ok(PhotoContent {
            content_type: meta.content_type,
            size: meta.size,
            reader,
        })
    }
}

/// Accept only a bare file name: no directory parts, not `.` or `..`.
fn plain_file_name(raw: &str) -> Result<String, DomainError> {
    let trimmed = raw.trim();
    let plain = Path::new(trimmed)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| *n == trimmed && !n.contains('\\') && !n.contains('\0'));

    match plain {
        Some(name) => Ok(name.to_string()),
        None => Err(DomainError::invalid_argument(
            "filename",
            format!("'{raw}' is not a plain file name"),
        )),
    }
}

/// Per-user async mutexes; an entry lives only while someone holds or awaits it.
#[derive(Default)]
pub(crate) struct UserLocks {
    inner: DashMap<String, Arc<Mutex<()>>>,
}

/// Keeps one map entry alive; dropping it (even mid-wait) removes the entry
/// once no other slot refers to it.
struct LockSlot<'a> {
    locks: &'a UserLocks,
    key: String,
    mutex: Arc<Mutex<()>>,
}

impl UserLocks {
    /// Run `fut` while holding the mutex for `key`.
    pub(crate) async fn run_locked<F, T>(&self, key: &str, fut: F) -> T
    where
        F: Future<Output = T>,
    {
        let slot = LockSlot {
            locks: self,
            key: key.to_string(),
            mutex: self.inner.entry(key.to_string()).or_default().clone(),
        };
        let _held = slot.mutex.lock().await;
        fut.await
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl Drop for LockSlot<'_> {
    fn drop(&mut self) {
        // The map and this slot are the only owners left.
        self.locks.inner.remove_if(&self.key, |_, m| {
            Arc::ptr_eq(m, &self.mutex) && Arc::strong_count(m) == 2
        });
    }
}
