use std::path::Path;

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::client::{DeleteResponse, DocshelfClient, Document, UploadResponse};

const PDF_MIME: &str = "application/pdf";

/// What the user is looking at: the fetched listing, the current search term
/// and whether admin actions are unlocked.
///
/// The admin flag only gates commands in this client. The server does not
/// enforce it.
#[derive(Debug, Default)]
pub struct View {
    pub documents: Vec<Document>,
    pub search_term: String,
    pub is_admin: bool,
}

impl View {
    pub fn new(search_term: impl Into<String>) -> Self {
        Self {
            search_term: search_term.into(),
            ..Self::default()
        }
    }

    /// Replace the listing with a fresh copy from the server.
    pub async fn refresh(&mut self, client: &DocshelfClient) -> Result<()> {
        self.documents = client.list_documents().await?;
        Ok(())
    }

    /// Verify the password and set the admin flag.
    pub async fn unlock(&mut self, client: &DocshelfClient, password: Option<&str>) -> Result<()> {
        let Some(password) = password else {
            bail!("Admin password required (--password or DOCSHELF_PASSWORD)");
        };
        if !client.verify_password(password).await? {
            bail!("Incorrect password");
        }
        self.is_admin = true;
        Ok(())
    }

    /// Upload a document and re-fetch the listing.
    pub async fn upload(
        &mut self,
        client: &DocshelfClient,
        title: &str,
        age_restriction: &str,
        file_data: &str,
    ) -> Result<UploadResponse> {
        self.require_admin()?;
        let uploaded = client.upload(title, age_restriction, file_data).await?;
        self.refresh(client).await?;
        Ok(uploaded)
    }

    /// Delete a document and re-fetch the listing.
    pub async fn delete(&mut self, client: &DocshelfClient, id: u64) -> Result<DeleteResponse> {
        self.require_admin()?;
        let response = client.delete(id).await?;
        self.refresh(client).await?;
        Ok(response)
    }

    fn require_admin(&self) -> Result<()> {
        if !self.is_admin {
            bail!("Admin actions are locked; log in first");
        }
        Ok(())
    }

    pub fn visible(&self) -> Vec<&Document> {
        filter_documents(&self.documents, &self.search_term)
    }

    pub fn find(&self, id: u64) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }
}

/// Case-insensitive substring match on the title. An empty term keeps
/// everything.
pub fn filter_documents<'a>(documents: &'a [Document], term: &str) -> Vec<&'a Document> {
    let needle = term.to_lowercase();
    documents
        .iter()
        .filter(|doc| doc.title.to_lowercase().contains(&needle))
        .collect()
}

/// Plain-text table of documents.
pub fn render_table(documents: &[&Document]) -> String {
    if documents.is_empty() {
        return "No documents found.\n".to_string();
    }

    let id_width = documents
        .iter()
        .map(|d| d.id.to_string().len())
        .max()
        .unwrap_or(0)
        .max("ID".len());
    let title_width = documents
        .iter()
        .map(|d| d.title.chars().count())
        .max()
        .unwrap_or(0)
        .max("TITLE".len());
    let age_width = documents
        .iter()
        .map(|d| d.age_restriction.chars().count())
        .max()
        .unwrap_or(0)
        .max("AGE".len());

    let mut out = format!(
        "{:<id_width$}  {:<title_width$}  {:<age_width$}  UPLOADED\n",
        "ID", "TITLE", "AGE"
    );
    for doc in documents {
        out.push_str(&format!(
            "{:<id_width$}  {:<title_width$}  {:<age_width$}  {}\n",
            doc.id, doc.title, doc.age_restriction, doc.upload_date
        ));
    }
    out
}

/// Read a PDF from disk as the base64 data URL the upload endpoint expects.
pub async fn read_pdf_data_url(path: &Path) -> Result<String> {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    if mime.essence_str() != PDF_MIME {
        bail!("{} is not a PDF file", path.display());
    }

    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if content.is_empty() {
        bail!("{} is empty", path.display());
    }

    Ok(format!("data:{PDF_MIME};base64,{}", STANDARD.encode(content)))
}
