//! Publishing the generated site to object storage.
//!
//! A target of the form `gs://<bucket>` is a Google Cloud Storage bucket.  Any other target is a
//! local directory standing in for a bucket, which is what the tests and dry runs use.
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use google_cloud_storage::client::{Client, ClientConfig};
use google_cloud_storage::http::objects::delete::DeleteObjectRequest;
use google_cloud_storage::http::objects::list::ListObjectsRequest;
use google_cloud_storage::http::objects::upload::{Media, UploadObjectRequest, UploadType};
use log::{debug, info};
use walkdir::WalkDir;

use crate::error::{Error, Result};

pub const GCS_PREFIX: &str = "gs://";

/// The few bucket operations needed to publish a site.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Names of every object in the bucket.
    async fn list(&self) -> Result<Vec<String>>;

    async fn delete(&self, object: &str) -> Result<()>;

    async fn upload(&self, object: &str, data: Vec<u8>, content_type: &str) -> Result<()>;
}

pub struct GcsBucket {
    client: Client,
    bucket: String,
}

impl GcsBucket {
    /// Connect with application default credentials.
    ///
    /// # Errors
    /// Returns `Err` if no credentials are available.
    pub async fn new(bucket: &str) -> Result<Self> {
        let config = ClientConfig::default().with_auth().await.map_err(|e| {
            Error::StorageAuth(format!(
                "{e}. Did you do `gcloud auth application-default login` before running?"
            ))
        })?;
        Ok(GcsBucket {
            client: Client::new(config),
            bucket: bucket.to_string(),
        })
    }
}

#[async_trait]
impl ObjectStore for GcsBucket {
    async fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut page_token = None;
        loop {
            let response = self
                .client
                .list_objects(&ListObjectsRequest {
                    bucket: self.bucket.clone(),
                    page_token: page_token.take(),
                    ..Default::default()
                })
                .await?;
            names.extend(response.items.unwrap_or_default().into_iter().map(|o| o.name));
            match response.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        debug!("(GcsBucket.list) {} objects in {}", names.len(), self.bucket);
        Ok(names)
    }

    async fn delete(&self, object: &str) -> Result<()> {
        self.client
            .delete_object(&DeleteObjectRequest {
                bucket: self.bucket.clone(),
                object: object.to_string(),
                ..Default::default()
            })
            .await?;
        Ok(())
    }

    async fn upload(&self, object: &str, data: Vec<u8>, content_type: &str) -> Result<()> {
        let mut media = Media::new(object.to_string());
        media.content_type = content_type.to_string().into();
        media.content_length = Some(data.len() as u64);
        self.client
            .upload_object(
                &UploadObjectRequest {
                    bucket: self.bucket.clone(),
                    ..Default::default()
                },
                data,
                &UploadType::Simple(media),
            )
            .await?;
        Ok(())
    }
}

/// A directory used as a bucket.  Object names are paths relative to it.
#[derive(Debug, Clone)]
pub struct LocalBucket {
    root: PathBuf,
}

impl LocalBucket {
    #[must_use]
    pub fn new(root: &Path) -> Self {
        LocalBucket {
            root: root.to_path_buf(),
        }
    }
}

#[async_trait]
impl ObjectStore for LocalBucket {
    async fn list(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(vec![]);
        }
        let mut names = Vec::new();
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file() {
                names.push(object_name(entry.path().strip_prefix(&self.root)?));
            }
        }
        Ok(names)
    }

    async fn delete(&self, object: &str) -> Result<()> {
        fs::remove_file(self.root.join(object))?;
        Ok(())
    }

    async fn upload(&self, object: &str, data: Vec<u8>, _content_type: &str) -> Result<()> {
        let path = self.root.join(object);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, data)?;
        Ok(())
    }
}

/// Open the store for `target`, a `gs://` bucket or a local directory.
///
/// # Errors
/// Returns `Err` if cloud storage credentials are missing.
pub async fn open_store(target: &str) -> Result<Box<dyn ObjectStore>> {
    match target.strip_prefix(GCS_PREFIX) {
        Some(bucket) => Ok(Box::new(GcsBucket::new(bucket.trim_end_matches('/')).await?)),
        None => Ok(Box::new(LocalBucket::new(Path::new(target)))),
    }
}

// Object names always use `/`, whatever the platform.
fn object_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Content type served for a file, from its extension.
#[must_use]
pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" => "text/javascript; charset=utf-8",
        "json" => "application/json",
        "txt" => "text/plain; charset=utf-8",
        "xml" => "application/xml",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        _ => "application/octet-stream",
    }
}

/// Delete every object of the bucket.  Returns the number of objects deleted.
///
/// # Errors
/// Returns `Err` if the bucket cannot be listed or an object cannot be deleted.
pub async fn clean_bucket(store: &dyn ObjectStore) -> Result<usize> {
    info!("Cleaning bucket");
    let objects = store.list().await?;
    for object in &objects {
        info!("Deleting {object}");
        store.delete(object).await?;
    }
    Ok(objects.len())
}

/// Upload every site file whose site relative path starts with `prefix`, keyed by that path.
/// Returns the number of files uploaded.
///
/// # Errors
/// Returns `Err` if the site cannot be read or an upload fails.
pub async fn upload_to_bucket(store: &dyn ObjectStore, site_directory: &Path, prefix: &str) -> Result<usize> {
    info!("Uploading files to bucket");
    let mut uploaded = 0;

    for entry in WalkDir::new(site_directory).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let object = object_name(entry.path().strip_prefix(site_directory)?);
        if !object.starts_with(prefix) {
            continue;
        }

        info!("Uploading {object}");
        let data = fs::read(entry.path())?;
        store
            .upload(&object, data, content_type_for(entry.path()))
            .await?;
        uploaded += 1;
    }

    Ok(uploaded)
}
