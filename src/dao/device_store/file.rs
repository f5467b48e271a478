use std::{collections::BTreeMap, io::ErrorKind, path::PathBuf, sync::Arc};

use futures::future::{BoxFuture, FutureExt};
use tokio::{fs, sync::Mutex};

use crate::dao::{
    device_store::DeviceStore,
    storage::{StorageError, StorageResult},
};

type Entries = BTreeMap<String, String>;

/// JSON-file backed store living next to the kiosk binary.
///
/// Every operation reads the whole file and mutations rewrite it through a temporary
/// file, so a crash never leaves a half-written document behind.
#[derive(Clone)]
pub struct FileDeviceStore {
    inner: Arc<Inner>,
}

struct Inner {
    path: PathBuf,
    gate: Mutex<()>,
}

impl FileDeviceStore {
    /// Open (lazily) the store at `path`. The file is created on the first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Inner {
                path: path.into(),
                gate: Mutex::new(()),
            }),
        }
    }

    fn update<F>(&self, mutate: F) -> BoxFuture<'static, StorageResult<()>>
    where
        F: FnOnce(&mut Entries) + Send + 'static,
    {
        let inner = self.inner.clone();
        async move {
            let _gate = inner.gate.lock().await;
            let mut entries = inner.read_entries().await?;
            mutate(&mut entries);
            inner.write_entries(&entries).await
        }
        .boxed()
    }
}

impl Inner {
    async fn read_entries(&self) -> StorageResult<Entries> {
        match fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Entries::new()),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| {
                StorageError::unavailable(
                    format!("failed to decode `{}`", self.path.display()),
                    source,
                )
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Entries::new()),
            Err(source) => Err(StorageError::unavailable(
                format!("failed to read `{}`", self.path.display()),
                source,
            )),
        }
    }

    async fn write_entries(&self, entries: &Entries) -> StorageResult<()> {
        let write_failed = |source: std::io::Error| {
            StorageError::unavailable(format!("failed to write `{}`", self.path.display()), source)
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(write_failed)?;
        }

        let payload = serde_json::to_vec_pretty(entries).map_err(|source| {
            StorageError::unavailable("failed to encode device entries".into(), source)
        })?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, payload).await.map_err(write_failed)?;
        fs::rename(&tmp, &self.path).await.map_err(write_failed)
    }
}

impl DeviceStore for FileDeviceStore {
    fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<String>>> {
        let inner = self.inner.clone();
        let key = key.to_string();
        async move {
            let _gate = inner.gate.lock().await;
            Ok(inner.read_entries().await?.remove(&key))
        }
        .boxed()
    }

    fn set(&self, key: &str, value: String) -> BoxFuture<'static, StorageResult<()>> {
        let key = key.to_string();
        self.update(move |entries| {
            entries.insert(key, value);
        })
    }

    fn remove(&self, key: &str) -> BoxFuture<'static, StorageResult<()>> {
        let key = key.to_string();
        self.update(move |entries| {
            entries.remove(&key);
        })
    }
}
