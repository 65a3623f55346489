use anyhow::{Context, Result, anyhow};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Downloads company logos into `<public_path>/logos`.
pub struct LogoStore {
    dir: Option<PathBuf>,
    client: reqwest::Client,
}

impl LogoStore {
    /// `public_path` of `None` disables logo downloads.
    pub fn new(public_path: Option<&Path>, client: reqwest::Client) -> Self {
        Self {
            dir: public_path.map(|p| p.join("logos")),
            client,
        }
    }

    /// Returns the stored file name, or `None` when there is no logo or it could not be saved.
    pub async fn download_and_save(&self, logo_url: Option<&str>) -> Option<String> {
        let url = logo_url.map(str::trim).filter(|u| !u.is_empty())?;
        let Some(dir) = &self.dir else {
            debug!(%url, "No public path configured, skipping logo");
            return None;
        };

        match self.save(dir, url).await {
            Ok(file_name) => Some(file_name),
            Err(e) => {
                warn!(%url, error = %e, "Logo download failed");
                None
            }
        }
    }

    async fn save(&self, dir: &Path, url: &str) -> Result<String> {
        let file_name = file_name_from_url(url)?;
        let file_path = dir.join(&file_name);

        if file_path.exists() {
            debug!(%file_name, "Logo already present");
            return Ok(file_name);
        }

        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

        let bytes = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        tokio::fs::write(&file_path, &bytes)
            .await
            .with_context(|| format!("Failed to write logo to {}", file_path.display()))?;

        info!(%file_name, "Saved logo");
        Ok(file_name)
    }
}

/// Last path segment of the URL, without query or fragment.
fn file_name_from_url(url: &str) -> Result<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/')
        .next()
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .map(str::to_string)
        .ok_or_else(|| anyhow!("Logo URL has no file name: {url}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::HttpConfig;
    use crate::providers::util::build_client;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn logo_store(public: Option<&Path>) -> LogoStore {
        LogoStore::new(public, build_client(&HttpConfig::default()).unwrap())
    }

    async fn create_logo_mock_server(expected_calls: u64) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/media/akp.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PNGDATA".to_vec()))
            .expect(expected_calls)
            .mount(&mock_server)
            .await;
        mock_server
    }

    #[tokio::test]
    async fn test_downloads_logo() {
        let mock_server = create_logo_mock_server(1).await;
        let public = TempDir::new().unwrap();
        let logos = logo_store(Some(public.path()));
        let url = format!("{}/media/akp.png?v=3", mock_server.uri());

        let saved = logos.download_and_save(Some(&url)).await;

        assert_eq!(saved.as_deref(), Some("akp.png"));
        let content = std::fs::read(public.path().join("logos").join("akp.png")).unwrap();
        assert_eq!(content, b"PNGDATA");
    }

    #[tokio::test]
    async fn test_existing_logo_is_not_downloaded_again() {
        let mock_server = create_logo_mock_server(0).await;
        let public = TempDir::new().unwrap();
        std::fs::create_dir_all(public.path().join("logos")).unwrap();
        std::fs::write(public.path().join("logos").join("akp.png"), b"OLD").unwrap();
        let logos = logo_store(Some(public.path()));
        let url = format!("{}/media/akp.png", mock_server.uri());

        let saved = logos.download_and_save(Some(&url)).await;

        assert_eq!(saved.as_deref(), Some("akp.png"));
        let content = std::fs::read(public.path().join("logos").join("akp.png")).unwrap();
        assert_eq!(content, b"OLD");
    }

    #[tokio::test]
    async fn test_failed_download_yields_none() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;
        let public = TempDir::new().unwrap();
        let logos = logo_store(Some(public.path()));
        let url = format!("{}/media/missing.png", mock_server.uri());

        assert!(logos.download_and_save(Some(&url)).await.is_none());
        assert!(!public.path().join("logos").join("missing.png").exists());
    }

    #[tokio::test]
    async fn test_missing_url_or_public_path_yields_none() {
        let public = TempDir::new().unwrap();

        assert!(logo_store(Some(public.path())).download_and_save(None).await.is_none());
        assert!(
            logo_store(Some(public.path()))
                .download_and_save(Some("  "))
                .await
                .is_none()
        );
        assert!(
            logo_store(None)
                .download_and_save(Some("https://cdn.example.com/akp.png"))
                .await
                .is_none()
        );
    }

    #[test]
    fn test_file_name_from_url() {
        assert_eq!(
            file_name_from_url("https://cdn.example.com/logos/akp.png?size=64").unwrap(),
            "akp.png"
        );
        assert!(file_name_from_url("https://cdn.example.com/logos/").is_err());
        assert!(file_name_from_url("https://cdn.example.com/..").is_err());
    }
}
