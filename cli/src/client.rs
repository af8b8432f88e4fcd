use anyhow::{bail, Context, Result};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};

/// A document as listed by the server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: u64,
    pub title: String,
    pub age_restriction: String,
    pub file_url: String,
    pub upload_date: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadRequest<'a> {
    title: &'a str,
    age_restriction: &'a str,
    file_data: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct UploadResponse {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    #[serde(default)]
    pub deleted: bool,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    success: bool,
}

/// Thin HTTP client over the Docshelf JSON API.
pub struct DocshelfClient {
    http: reqwest::Client,
    base_url: Url,
}

impl DocshelfClient {
    pub fn new(server: &str) -> Result<Self> {
        let mut base_url =
            Url::parse(server).with_context(|| format!("Invalid server URL '{server}'"))?;
        // join() drops the last segment unless the path ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
        })
    }

    /// Resolve a path or absolute URL returned by the server.
    pub fn resolve(&self, location: &str) -> Result<Url> {
        self.base_url
            .join(location)
            .with_context(|| format!("Invalid URL '{location}'"))
    }

    /// Check the admin password. A 401 is a plain `false`.
    pub async fn verify_password(&self, password: &str) -> Result<bool> {
        let response = self
            .http
            .post(self.resolve("api/auth")?)
            .json(&serde_json::json!({ "password": password }))
            .send()
            .await
            .context("Failed to reach the auth endpoint")?;

        match response.status() {
            StatusCode::OK | StatusCode::UNAUTHORIZED => {
                let body: AuthResponse = response.json().await?;
                Ok(body.success)
            }
            status => bail!("Unexpected auth response: {status}"),
        }
    }

    pub async fn list_documents(&self) -> Result<Vec<Document>> {
        let response = self
            .http
            .get(self.resolve("api/documents")?)
            .send()
            .await
            .context("Failed to fetch documents")?;

        Ok(check(response).await?.json().await?)
    }

    pub async fn upload(
        &self,
        title: &str,
        age_restriction: &str,
        file_data: &str,
    ) -> Result<UploadResponse> {
        let response = self
            .http
            .post(self.resolve("api/documents")?)
            .json(&UploadRequest {
                title,
                age_restriction,
                file_data,
            })
            .send()
            .await
            .context("Failed to upload document")?;

        Ok(check(response).await?.json().await?)
    }

    pub async fn delete(&self, id: u64) -> Result<DeleteResponse> {
        let response = self
            .http
            .delete(self.resolve("api/documents")?)
            .query(&[("id", id)])
            .send()
            .await
            .context("Failed to delete document")?;

        Ok(check(response).await?.json().await?)
    }

    pub async fn download(&self, file_url: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(self.resolve(file_url)?)
            .send()
            .await
            .context("Failed to download document")?;

        Ok(check(response).await?.bytes().await?.to_vec())
    }
}

/// Turn a non-success response into an error carrying the server's message.
async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .or_else(|| v.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or(body);

    bail!("Server returned {status}: {message}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_paths() {
        let client = DocshelfClient::new("http://localhost:3000").unwrap();
        assert_eq!(
            client.resolve("api/documents").unwrap().as_str(),
            "http://localhost:3000/api/documents"
        );
        assert_eq!(
            client
                .resolve("/api/files/documents/1_A%2520B_18%252B.pdf")
                .unwrap()
                .as_str(),
            "http://localhost:3000/api/files/documents/1_A%2520B_18%252B.pdf"
        );
    }

    #[test]
    fn test_resolve_keeps_mount_path() {
        let client = DocshelfClient::new("https://example.com/shelf").unwrap();
        assert_eq!(
            client.resolve("api/auth").unwrap().as_str(),
            "https://example.com/shelf/api/auth"
        );
    }

    #[test]
    fn test_resolve_absolute_url() {
        let client = DocshelfClient::new("http://localhost:3000").unwrap();
        assert_eq!(
            client
                .resolve("https://cdn.example.com/documents/1_A_B.pdf")
                .unwrap()
                .as_str(),
            "https://cdn.example.com/documents/1_A_B.pdf"
        );
    }

    #[test]
    fn test_invalid_server_url() {
        assert!(DocshelfClient::new("not a url").is_err());
    }

    #[test]
    fn test_document_ignores_extra_fields() {
        let doc: Document = serde_json::from_str(
            r#"{
                "id": 7,
                "title": "Book",
                "ageRestriction": "18+",
                "fileUrl": "/api/files/documents/7_Book_18%252B.pdf",
                "uploadDate": "1/2/2024",
                "uploadedAt": "2024-01-02T00:00:00Z"
            }"#,
        )
        .unwrap();
        assert_eq!(doc.id, 7);
        assert_eq!(doc.age_restriction, "18+");
    }
}
