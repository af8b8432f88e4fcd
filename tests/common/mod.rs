use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::minio::MinIO;

use docshelf::app::{build_router, AppState};
use docshelf::auth::admin::AdminSecret;
use docshelf::config::{DateFormat, DEFAULT_MAX_UPLOAD_BYTES};
use docshelf::error::AppError;
use docshelf::models::document::Document;
use docshelf::storage::client::{public_object_url, ObjectSummary, S3StorageClient, StorageClient};

/// Admin password every test router is configured with.
pub const TEST_PASSWORD: &str = "test-password";

/// A tiny but well-formed PDF header; the service never parses the payload.
pub const PDF_BYTES: &[u8] = b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\n%%EOF\n";

/// Blob store kept in memory, in insertion order.
#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<Vec<(String, Vec<u8>, DateTime<Utc>)>>,
    deletes: AtomicUsize,
}

impl MemoryStorage {
    /// Insert an object directly, bypassing the API.
    pub fn seed(&self, key: &str, content: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .push((key.to_string(), content.to_vec(), Utc::now()));
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .map(|(key, _, _)| key.clone())
            .collect()
    }

    /// Number of `delete_object` calls that reached the store.
    pub fn delete_calls(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageClient for MemoryStorage {
    async fn put_object(
        &self,
        key: &str,
        content: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, AppError> {
        let mut objects = self.objects.lock().unwrap();
        objects.retain(|(k, _, _)| k != key);
        objects.push((key.to_string(), content, Utc::now()));
        Ok(public_object_url(None, key))
    }

    async fn get_object(&self, key: &str) -> Result<Option<Vec<u8>>, AppError> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .find(|(k, _, _)| k == key)
            .map(|(_, content, _)| content.clone()))
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>, AppError> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _, _)| k.starts_with(prefix))
            .map(|(key, _, uploaded_at)| ObjectSummary {
                key: key.clone(),
                url: public_object_url(None, key),
                uploaded_at: *uploaded_at,
            })
            .collect())
    }

    async fn delete_object(&self, key: &str) -> Result<(), AppError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.objects.lock().unwrap().retain(|(k, _, _)| k != key);
        Ok(())
    }
}

fn router_for(storage: Arc<dyn StorageClient>, max_upload_bytes: usize) -> Router {
    let app_state = AppState {
        storage_client: storage,
        admin_secret: AdminSecret::new(TEST_PASSWORD).expect("Test password is not empty"),
        date_format: DateFormat::default(),
    };

    build_router(app_state, max_upload_bytes, None)
}

/// Router wired to an in-memory blob store.
pub struct TestEnv {
    pub router: Router,
    pub storage: Arc<MemoryStorage>,
}

impl TestEnv {
    pub fn in_memory() -> Self {
        Self::with_upload_limit(DEFAULT_MAX_UPLOAD_BYTES)
    }

    pub fn with_upload_limit(max_upload_bytes: usize) -> Self {
        let storage = Arc::new(MemoryStorage::default());
        let router = router_for(storage.clone(), max_upload_bytes);
        Self { router, storage }
    }

    /// Build a `TestServer` that does NOT expect success by default.
    pub fn server(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .build(self.router.clone())
    }
}

/// Holds a running MinIO container and a router wired to it.
///
/// The container is stopped when this struct is dropped.
pub struct S3TestEnv {
    _minio: ContainerAsync<MinIO>,
    pub router: Router,
    pub storage: Arc<S3StorageClient>,
}

impl S3TestEnv {
    pub async fn start() -> Self {
        let minio_container = MinIO::default()
            .start()
            .await
            .expect("Failed to start MinIO container");

        let minio_port = minio_container
            .get_host_port_ipv4(9000)
            .await
            .expect("Failed to get MinIO port");
        let minio_endpoint = format!("http://127.0.0.1:{}", minio_port);

        let s3_config = aws_sdk_s3::config::Builder::new()
            .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new("us-east-1"))
            .endpoint_url(&minio_endpoint)
            .credentials_provider(aws_sdk_s3::config::Credentials::new(
                "minioadmin",
                "minioadmin",
                None,
                None,
                "docshelf-tests",
            ))
            .force_path_style(true)
            .build();
        let s3_client = aws_sdk_s3::Client::from_conf(s3_config);

        let bucket_name = "docshelf-test";
        s3_client
            .create_bucket()
            .bucket(bucket_name)
            .send()
            .await
            .expect("Failed to create test bucket");

        let storage = Arc::new(S3StorageClient::new(
            s3_client,
            bucket_name.to_string(),
            None,
            false,
        ));
        let router = router_for(storage.clone(), DEFAULT_MAX_UPLOAD_BYTES);

        Self {
            _minio: minio_container,
            router,
            storage,
        }
    }

    pub fn server(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .build(self.router.clone())
    }
}

/// Data URL the browser would send for `PDF_BYTES`.
pub fn pdf_data_url() -> String {
    format!("data:application/pdf;base64,{}", STANDARD.encode(PDF_BYTES))
}

/// Helper: upload a document via the API.
pub async fn upload(
    server: &axum_test::TestServer,
    title: &str,
    age_restriction: &str,
) -> axum_test::TestResponse {
    server
        .post("/api/documents")
        .json(&serde_json::json!({
            "title": title,
            "ageRestriction": age_restriction,
            "fileData": pdf_data_url(),
        }))
        .await
}

/// Helper: fetch the current listing via the API.
pub async fn list(server: &axum_test::TestServer) -> Vec<Document> {
    let response = server.get("/api/documents").await;
    response.assert_status_ok();
    response.json::<Vec<Document>>()
}
