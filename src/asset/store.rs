use async_trait::async_trait;
use mime::Mime;

use crate::{
    asset::RemoteAsset,
    client::{Error as ClientError, Gemini},
};

/// A local file ready to be sent to the remote store.
#[derive(Debug, Clone)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub display_name: String,
    pub mime_type: Mime,
}

/// The remote side of the poller: somewhere files go in and status comes out.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Upload the bytes once and return the initial snapshot.
    async fn upload(&self, upload: Upload) -> Result<RemoteAsset, ClientError>;

    /// Fetch the current snapshot by handle.
    async fn fetch(&self, handle: &str) -> Result<RemoteAsset, ClientError>;
}

#[async_trait]
impl AssetStore for Gemini {
    async fn upload(&self, upload: Upload) -> Result<RemoteAsset, ClientError> {
        let file = self
            .create_file(upload.bytes)
            .display_name(upload.display_name)
            .with_mime_type(upload.mime_type)
            .upload()
            .await?;
        Ok(file.into())
    }

    async fn fetch(&self, handle: &str) -> Result<RemoteAsset, ClientError> {
        Ok(self.get_file(handle).await?.into())
    }
}
