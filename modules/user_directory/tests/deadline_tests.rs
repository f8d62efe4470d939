//! Calls through the local client honour the caller's deadline and cancellation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;
use user_directory::{
    contract::{
        client::UserDirectoryApi,
        ctx::CallCtx,
        error::UserDirectoryError,
        model::{NewPhoto, PhotoMeta, User},
    },
    domain::{
        error::DomainError,
        photos::ProfilePhotos,
        ports::PhotoContentStore,
        repo::{PhotosRepository, RolesRepository, UsersRepository},
        roles::RoleAuthority,
        service::{ServiceConfig, UserDirectory},
    },
    gateways::local::UserDirectoryLocalClient,
    infra::content::FsContentStore,
};

/// A store that answers, but only after `delay`.
struct SlowStore {
    delay: Duration,
}

#[async_trait]
impl UsersRepository for SlowStore {
    async fn list(&self, _limit: u64) -> anyhow::Result<Vec<User>> {
        tokio::time::sleep(self.delay).await;
        Ok(Vec::new())
    }
    async fn find_by_id(&self, _id: &str) -> anyhow::Result<Option<User>> {
        tokio::time::sleep(self.delay).await;
        Ok(None)
    }
    async fn exists(&self, _id: &str) -> anyhow::Result<bool> {
        tokio::time::sleep(self.delay).await;
        Ok(false)
    }
    async fn insert(&self, _u: User) -> anyhow::Result<()> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
    async fn update(&self, _u: User) -> anyhow::Result<()> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
    async fn delete(&self, _id: &str) -> anyhow::Result<bool> {
        tokio::time::sleep(self.delay).await;
        Ok(false)
    }
}

#[async_trait]
impl PhotosRepository for SlowStore {
    async fn find_by_user(&self, _user_id: &str) -> anyhow::Result<Option<PhotoMeta>> {
        tokio::time::sleep(self.delay).await;
        Ok(None)
    }
    async fn insert(&self, _meta: PhotoMeta) -> anyhow::Result<()> {
        Ok(())
    }
    async fn delete(&self, _id: &str) -> anyhow::Result<bool> {
        Ok(false)
    }
}

struct FixedRoles(HashMap<String, String>);

#[async_trait]
impl RolesRepository for FixedRoles {
    async fn find_name(&self, id: &str) -> anyhow::Result<Option<String>> {
        Ok(self.0.get(id).cloned())
    }
}

fn client(delay: Duration) -> Arc<dyn UserDirectoryApi> {
    let store = Arc::new(SlowStore { delay });
    let roles = RoleAuthority::new(Arc::new(FixedRoles(HashMap::from([(
        "r1".to_string(),
        "ADMIN".to_string(),
    )]))));
    let directory = UserDirectory::new(store.clone(), roles, ServiceConfig::default());
    let content: Arc<dyn PhotoContentStore> = Arc::new(FsContentStore::new(std::env::temp_dir()));
    let photos = ProfilePhotos::new(directory.clone(), store, content);
    Arc::new(UserDirectoryLocalClient::new(
        Arc::new(directory),
        Arc::new(photos),
    ))
}

fn kind(err: anyhow::Error) -> UserDirectoryError {
    err.downcast::<UserDirectoryError>()
        .expect("contract error inside anyhow")
}

#[tokio::test(start_paused = true)]
async fn slow_store_times_out() {
    let api = client(Duration::from_secs(30));
    let ctx = CallCtx::new().with_timeout(Duration::from_millis(100));

    let err = api.list_users(&ctx, None).await.unwrap_err();
    assert_eq!(kind(err), UserDirectoryError::Timeout);

    let err = api.photo_metadata(&ctx, "u1").await.unwrap_err();
    assert_eq!(kind(err), UserDirectoryError::Timeout);
}

#[tokio::test(start_paused = true)]
async fn fast_store_beats_the_deadline() {
    let api = client(Duration::from_millis(10));
    let ctx = CallCtx::new().with_timeout(Duration::from_secs(1));

    // Reaches the store and comes back with the empty-directory answer.
    let err = api.list_users(&ctx, None).await.unwrap_err();
    assert!(matches!(kind(err), UserDirectoryError::NotFound { .. }));
}

#[tokio::test(start_paused = true)]
async fn cancellation_abandons_the_call() {
    let api = client(Duration::from_secs(30));
    let token = CancellationToken::new();
    let ctx = CallCtx::new().with_cancellation(token.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });

    let err = api.delete_user(&ctx, "u1", "r1").await.unwrap_err();
    assert_eq!(kind(err), UserDirectoryError::Cancelled);
    canceller.await.unwrap();
}

/// Every user exists; nothing else is stored.
struct AnyUser;

#[async_trait]
impl UsersRepository for AnyUser {
    async fn list(&self, _limit: u64) -> anyhow::Result<Vec<User>> {
        Ok(Vec::new())
    }
    async fn find_by_id(&self, _id: &str) -> anyhow::Result<Option<User>> {
        Ok(None)
    }
    async fn exists(&self, _id: &str) -> anyhow::Result<bool> {
        Ok(true)
    }
    async fn insert(&self, _u: User) -> anyhow::Result<()> {
        Ok(())
    }
    async fn update(&self, _u: User) -> anyhow::Result<()> {
        Ok(())
    }
    async fn delete(&self, _id: &str) -> anyhow::Result<bool> {
        Ok(false)
    }
}

#[derive(Default)]
struct MemPhotos(Mutex<Vec<PhotoMeta>>);

impl MemPhotos {
    fn rows_for(&self, user_id: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|m| m.user_id == user_id).count()
    }
}

#[async_trait]
impl PhotosRepository for MemPhotos {
    async fn find_by_user(&self, user_id: &str) -> anyhow::Result<Option<PhotoMeta>> {
        Ok(self.0.lock().unwrap().iter().find(|m| m.user_id == user_id).cloned())
    }
    async fn insert(&self, meta: PhotoMeta) -> anyhow::Result<()> {
        self.0.lock().unwrap().push(meta);
        Ok(())
    }
    async fn delete(&self, id: &str) -> anyhow::Result<bool> {
        let mut rows = self.0.lock().unwrap();
        let before = rows.len();
        rows.retain(|m| m.id != id);
        Ok(rows.len() < before)
    }
}

/// Content store whose writes take `delay` and then either land or fail.
struct SlowDisk {
    delay: Duration,
    fail: bool,
    files: Mutex<HashMap<String, Bytes>>,
}

#[async_trait]
impl PhotoContentStore for SlowDisk {
    async fn write(&self, filename: &str, content: Bytes) -> anyhow::Result<()> {
        tokio::time::sleep(self.delay).await;
        if self.fail {
            anyhow::bail!("device went away");
        }
        self.files.lock().unwrap().insert(filename.to_string(), content);
        Ok(())
    }

    async fn open(&self, filename: &str) -> anyhow::Result<Box<dyn AsyncRead + Send + Unpin>> {
        let bytes = self
            .files
            .lock()
            .unwrap()
            .get(filename)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no such file"))?;
        Ok(Box::new(std::io::Cursor::new(bytes.to_vec())))
    }
}

fn photo_store(fail: bool) -> (ProfilePhotos, Arc<MemPhotos>) {
    let roles = RoleAuthority::new(Arc::new(FixedRoles(HashMap::new())));
    let directory = UserDirectory::new(Arc::new(AnyUser), roles, ServiceConfig::default());
    let rows = Arc::new(MemPhotos::default());
    let disk = Arc::new(SlowDisk {
        delay: Duration::from_secs(10),
        fail,
        files: Mutex::new(HashMap::new()),
    });
    (ProfilePhotos::new(directory, rows.clone(), disk), rows)
}

fn avatar() -> NewPhoto {
    NewPhoto {
        user_id: "u1".to_string(),
        filename: "u1.png".to_string(),
        content_type: "image/png".to_string(),
        size: 4,
        content: Bytes::from_static(b"\x89PNG"),
    }
}

#[tokio::test(start_paused = true)]
async fn upload_outliving_its_deadline_still_cleans_up_a_failed_write() {
    let (photos, rows) = photo_store(true);
    let ctx = CallCtx::new().with_timeout(Duration::from_millis(200));

    let res = ctx.bound(photos.upload_photo(avatar())).await;
    assert_eq!(
        res,
        Err(DomainError::TimedOut {
            after: Duration::from_millis(200)
        })
    );

    // Let the detached write finish and fail.
    tokio::time::sleep(Duration::from_secs(11)).await;
    assert_eq!(rows.rows_for("u1"), 0);

    // The user is not stuck behind a phantom photo.
    let retry = photos.upload_photo(avatar()).await;
    assert!(matches!(retry, Err(DomainError::Store { .. })), "{retry:?}");
    assert_eq!(rows.rows_for("u1"), 0);
}

#[tokio::test(start_paused = true)]
async fn upload_outliving_its_deadline_completes_whole() {
    let (photos, rows) = photo_store(false);
    let ctx = CallCtx::new().with_timeout(Duration::from_millis(200));

    assert!(ctx.bound(photos.upload_photo(avatar())).await.is_err());

    tokio::time::sleep(Duration::from_secs(11)).await;
    assert_eq!(rows.rows_for("u1"), 1);

    let content = photos.get_photo_content("u1").await.unwrap();
    let mut bytes = Vec::new();
    let mut reader = content.reader;
    reader.read_to_end(&mut bytes).await.unwrap();
    assert_eq!(bytes, b"\x89PNG");
}
