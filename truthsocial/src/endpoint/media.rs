use std::path::Path;

use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, TruthSocialError};
use crate::utils::deserialize_id;
use crate::TruthSocialClient;

/// An uploaded media attachment
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct MediaResult {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub text_url: Option<String>,
    #[serde(default)]
    pub meta: Option<Map<String, Value>>,
}

/// Media references made only of digits are ids of earlier uploads
fn is_media_id(media: &str) -> bool {
    !media.is_empty() && media.bytes().all(|b| b.is_ascii_digit())
}

impl TruthSocialClient {
    /// Upload a file as a media attachment
    pub async fn upload_media(&self, file_path: impl AsRef<Path>) -> Result<MediaResult> {
        let path = file_path.as_ref();
        let data = tokio::fs::read(path)
            .await
            .map_err(|error| TruthSocialError::Media {
                path: path.to_path_buf(),
                error,
            })?;

        let mime = infer::get(&data)
            .map(|t| t.mime_type())
            .unwrap_or("application/octet-stream");
        let form = Form::new().part("file", file_part(path, data, mime)?);

        let media: MediaResult = self.post_multipart("/api/v1/media", form).await?;
        tracing::info!(parent: self.span(), "Uploaded {:?} as {:?}", path, media.id);
        Ok(media)
    }

    pub(crate) async fn resolve_media(&self, media_files: &[&str]) -> Result<Vec<String>> {
        let mut media_ids = Vec::with_capacity(media_files.len());
        for media in media_files {
            if is_media_id(media) {
                media_ids.push(media.to_string());
            } else if let Some(id) = self.upload_media(media).await?.id {
                media_ids.push(id);
            }
        }
        Ok(media_ids)
    }
}

fn file_part(path: &Path, data: Vec<u8>, mime: &str) -> Result<Part> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_owned());
    Part::bytes(data)
        .file_name(file_name)
        .mime_str(mime)
        .map_err(|e| TruthSocialError::Media {
            path: path.to_path_buf(),
            error: std::io::Error::new(std::io::ErrorKind::InvalidInput, e),
        })
}
