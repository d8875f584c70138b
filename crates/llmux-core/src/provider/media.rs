//! Loading image parts into bytes for inline encoding

use super::context::ProviderContext;
use super::http::send_checked;
use crate::content::{ImagePart, ImageSource};
use crate::error::{LlmuxError, LlmuxResult};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::header::CONTENT_TYPE;
use std::path::Path;

const FALLBACK_MIME: &str = "image/jpeg";

/// Image bytes with a resolved MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct InlineImage {
    pub mime: String,
    pub data: Vec<u8>,
}

impl InlineImage {
    pub fn base64(&self) -> String {
        BASE64.encode(&self.data)
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.base64())
    }
}

fn guess_from_path(path: &str) -> Option<String> {
    mime_guess::from_path(path).first().map(|m| m.essence_str().to_string())
}

fn explicit_mime(image: &ImagePart) -> Option<String> {
    image.mime.clone().filter(|m| !m.trim().is_empty())
}

/// Read an image part into memory
///
/// The MIME type comes from the part itself, then the HTTP `Content-Type`
/// of a fetched URL, then the file extension, then `image/jpeg`. Remote
/// fetches are bounded by the context's image fetch timeout.
pub(crate) async fn load_image(
    ctx: &ProviderContext,
    image: &ImagePart,
    provider: &str,
) -> LlmuxResult<InlineImage> {
    let explicit = explicit_mime(image);

    let (data, mime) = match &image.source {
        ImageSource::Bytes(bytes) => (bytes.clone(), explicit),
        ImageSource::Stream(reader) => {
            let reader = reader.clone();
            let bytes = tokio::task::spawn_blocking(move || reader.read_all())
                .await
                .map_err(|e| LlmuxError::io(format!("Image reader task failed: {}", e)))??;
            (bytes.to_vec(), explicit)
        }
        ImageSource::Path(path) => {
            let data = tokio::fs::read(path).await.map_err(|e| {
                LlmuxError::io_with_path(
                    format!("Failed to read image: {}", e),
                    path.display().to_string(),
                )
            })?;
            let mime = explicit.or_else(|| guess_from_path(&path.to_string_lossy()));
            (data, mime)
        }
        ImageSource::Url(url) => {
            tracing::debug!(url = %url, "fetching remote image for inline encoding");
            let request = ctx.http.get(url).timeout(ctx.image_fetch_timeout);
            let response = send_checked(request, provider).await?;
            let header_mime = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(';').next())
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty());
            let data = response.bytes().await.map_err(|e| {
                LlmuxError::transport_with_provider(
                    format!("Failed to download image: {}", e),
                    provider,
                )
            })?;
            let mime = explicit
                .or(header_mime)
                .or_else(|| url_path(url).and_then(|p| guess_from_path(&p)));
            (data.to_vec(), mime)
        }
    };

    Ok(InlineImage {
        mime: mime.unwrap_or_else(|| FALLBACK_MIME.to_string()),
        data,
    })
}

fn url_path(url: &str) -> Option<String> {
    reqwest::Url::parse(url)
        .ok()
        .map(|u| u.path().to_string())
        .filter(|p| Path::new(p).extension().is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::content::{ImageInput, image};
    use std::io::Write;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn context() -> ProviderContext {
        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        ProviderContext::new(&ClientConfig::default())
            .unwrap()
            .with_http_client(http)
    }

    fn part(source: impl Into<ImageInput>, mime: Option<&str>) -> ImagePart {
        match image(source, mime, None).unwrap() {
            crate::content::ContentPart::Image(part) => part,
            other => panic!("expected image part, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_bytes_default_to_jpeg() {
        let loaded = load_image(&context(), &part(vec![1u8, 2, 3], None), "google")
            .await
            .unwrap();
        assert_eq!(loaded.mime, "image/jpeg");
        assert_eq!(loaded.base64(), "AQID");
        assert_eq!(loaded.data_url(), "data:image/jpeg;base64,AQID");
    }

    #[tokio::test]
    async fn test_path_mime_from_extension() {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(&[0x89, b'P', b'N', b'G']).unwrap();

        let loaded = load_image(&context(), &part(file.path(), None), "google")
            .await
            .unwrap();
        assert_eq!(loaded.mime, "image/png");
        assert_eq!(loaded.data, vec![0x89, b'P', b'N', b'G']);
    }

    #[tokio::test]
    async fn test_missing_path_is_io_error() {
        let err = load_image(&context(), &part("/nonexistent/cat.gif", None), "google")
            .await
            .unwrap_err();
        assert!(matches!(err, LlmuxError::Io { path: Some(_), .. }));
    }

    #[tokio::test]
    async fn test_stream_source_is_read() {
        let source = ImageInput::reader(std::io::Cursor::new(vec![9u8, 9]));
        let loaded = load_image(&context(), &part(source, Some("image/webp")), "google")
            .await
            .unwrap();
        assert_eq!(loaded.mime, "image/webp");
        assert_eq!(loaded.data, vec![9, 9]);
    }

    #[tokio::test]
    async fn test_url_mime_from_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cat"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(vec![0x47u8, 0x49, 0x46], "image/gif"),
            )
            .mount(&server)
            .await;

        let url = format!("{}/cat", server.uri());
        let loaded = load_image(&context(), &part(url.as_str(), None), "google")
            .await
            .unwrap();
        assert_eq!(loaded.mime, "image/gif");
        assert_eq!(loaded.data, vec![0x47, 0x49, 0x46]);
    }

    #[tokio::test]
    async fn test_url_explicit_mime_wins() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img.png"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(vec![1u8], "application/octet-stream"),
            )
            .mount(&server)
            .await;

        let url = format!("{}/img.png", server.uri());
        let loaded = load_image(&context(), &part(url.as_str(), Some("image/avif")), "google")
            .await
            .unwrap();
        assert_eq!(loaded.mime, "image/avif");
    }

    #[tokio::test]
    async fn test_url_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
            .mount(&server)
            .await;

        let url = format!("{}/missing.png", server.uri());
        let err = load_image(&context(), &part(url.as_str(), None), "google")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(404));
    }
}
