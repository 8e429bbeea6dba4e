//! Google Drive API connector implementation
//!
//! Implements the `RemoteStore` trait for Google Drive API v3.

use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
use bridge_traits::remote::{
    ChildQuery, KindFilter, ObjectField, ObjectKind, ObjectPage, RemoteObject, RemoteStore,
};
use bridge_traits::storage::FileSystemAccess;
use bytes::{BufMut, Bytes, BytesMut};
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::error::GoogleDriveError;
use crate::types::{mime, DriveFile, FileIdResponse, FileMetadataBody, FilesListResponse};

/// Google Drive API base URL
const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Google Drive upload endpoint base URL
const DRIVE_UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";

/// Fields every projection carries, whatever the caller asked for
const BASE_FIELDS: [ObjectField; 3] = [ObjectField::Id, ObjectField::Name, ObjectField::MimeType];

/// Google Drive API connector
///
/// # Example
///
/// ```ignore
/// use provider_google_drive::GoogleDriveConnector;
/// use bridge_traits::remote::{ChildQuery, RemoteStore};
///
/// let connector = GoogleDriveConnector::new(http_client, file_system, access_token);
/// let page = connector
///     .list_children(&ChildQuery::children_of("root").named("backup"), None)
///     .await?;
/// ```
pub struct GoogleDriveConnector {
    http_client: Arc<dyn HttpClient>,

    /// Source of upload payloads
    file_system: Arc<dyn FileSystemAccess>,

    /// OAuth 2.0 access token with the `drive` scope
    access_token: String,

    api_base: String,
    upload_base: String,
    retry_policy: RetryPolicy,
}

impl GoogleDriveConnector {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        file_system: Arc<dyn FileSystemAccess>,
        access_token: String,
    ) -> Self {
        Self {
            http_client,
            file_system,
            access_token,
            api_base: DRIVE_API_BASE.to_string(),
            upload_base: DRIVE_UPLOAD_BASE.to_string(),
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Point the connector at another endpoint (test servers, proxies)
    pub fn with_base_urls(mut self, api_base: impl Into<String>, upload_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self.upload_base = upload_base.into();
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    fn field_name(field: ObjectField) -> &'static str {
        match field {
            ObjectField::Id => "id",
            ObjectField::Name => "name",
            ObjectField::MimeType => "mimeType",
            ObjectField::Size => "size",
            ObjectField::ModifiedTime => "modifiedTime",
            ObjectField::Parents => "parents",
            ObjectField::Md5Checksum => "md5Checksum",
        }
    }

    /// Comma-separated projection, base fields first, no duplicates
    fn field_list(fields: &[ObjectField]) -> String {
        let mut names: Vec<&'static str> = Vec::new();
        for field in BASE_FIELDS.iter().chain(fields.iter()) {
            let name = Self::field_name(*field);
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names.join(",")
    }

    /// Escape a literal for the Drive query language
    fn escape_literal(value: &str) -> String {
        value.replace('\\', "\\\\").replace('\'', "\\'")
    }

    /// Build the `q` parameter for a scoped child listing
    fn build_query(query: &ChildQuery) -> String {
        let mut clauses = vec![format!(
            "'{}' in parents",
            Self::escape_literal(&query.parent_id)
        )];

        if let Some(name) = &query.name {
            clauses.push(format!("name = '{}'", Self::escape_literal(name)));
        }

        match &query.kind {
            Some(KindFilter::Folder) => clauses.push(format!("mimeType = '{}'", mime::FOLDER)),
            Some(KindFilter::NotFolder) => clauses.push(format!("mimeType != '{}'", mime::FOLDER)),
            Some(KindFilter::MimeType(mime_type)) => clauses.push(format!(
                "mimeType = '{}'",
                Self::escape_literal(mime_type)
            )),
            None => {}
        }

        clauses.push("trashed = false".to_string());
        clauses.join(" and ")
    }

    fn classify(mime_type: &str) -> ObjectKind {
        if mime_type == mime::FOLDER {
            ObjectKind::Folder
        } else if mime_type == mime::FILE || !mime_type.starts_with(mime::NATIVE_PREFIX) {
            ObjectKind::File
        } else {
            ObjectKind::Other
        }
    }

    /// Parse RFC 3339 timestamp into UTC
    fn parse_timestamp(rfc3339: &str) -> crate::error::Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(rfc3339)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| GoogleDriveError::ParseError(format!("modifiedTime '{}': {}", rfc3339, e)))
    }

    /// Convert DriveFile to RemoteObject
    fn convert_file(drive_file: DriveFile) -> crate::error::Result<RemoteObject> {
        let size = match drive_file.size {
            Some(raw) => Some(raw.parse::<u64>().map_err(|e| {
                GoogleDriveError::ParseError(format!("size '{}': {}", raw, e))
            })?),
            None => None,
        };
        let modified_time = match drive_file.modified_time.as_deref() {
            Some(raw) => Some(Self::parse_timestamp(raw)?),
            None => None,
        };

        Ok(RemoteObject {
            kind: Self::classify(&drive_file.mime_type),
            mime_type: (!drive_file.mime_type.is_empty()).then_some(drive_file.mime_type),
            id: drive_file.id,
            name: drive_file.name,
            size,
            modified_time,
            parents: drive_file.parents,
            md5_checksum: drive_file.md5_checksum,
        })
    }

    /// Send an authorized request and map non-2xx statuses to provider errors.
    /// Retry is delegated to the `HttpClient`.
    async fn send(&self, request: HttpRequest, object_id: Option<&str>) -> Result<HttpResponse> {
        let request = request.bearer_token(&self.access_token);
        let response = self
            .http_client
            .execute_with_retry(request, self.retry_policy.clone())
            .await?;

        if response.is_success() {
            debug!(status = response.status, "API request succeeded");
            return Ok(response);
        }

        let error = match response.status {
            401 | 403 => GoogleDriveError::AuthenticationFailed(response.text_lossy()),
            404 => GoogleDriveError::FileNotFound {
                file_id: object_id.unwrap_or("<query>").to_string(),
            },
            429 => GoogleDriveError::RateLimitExceeded {
                retry_after_seconds: response
                    .headers
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case("retry-after"))
                    .and_then(|(_, v)| v.parse().ok())
                    .unwrap_or(0),
            },
            status => GoogleDriveError::ApiError {
                status_code: status,
                message: response.text_lossy(),
            },
        };
        Err(error.into())
    }

    fn parse_id(response: &HttpResponse) -> Result<String> {
        let created: FileIdResponse = serde_json::from_slice(&response.body).map_err(|e| {
            GoogleDriveError::ParseError(format!("Failed to parse file id response: {}", e))
        })?;
        Ok(created.id)
    }

    /// Assemble a `multipart/related` body: JSON metadata part, then media
    fn multipart_body(
        boundary: &str,
        metadata: &FileMetadataBody,
        mime_type: &str,
        content: &[u8],
    ) -> Result<Bytes> {
        let metadata_json = serde_json::to_vec(metadata).map_err(|e| {
            GoogleDriveError::ParseError(format!("Failed to encode upload metadata: {}", e))
        })?;

        let mut body = BytesMut::with_capacity(content.len() + metadata_json.len() + 256);
        body.put_slice(format!("--{}\r\n", boundary).as_bytes());
        body.put_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
        body.put_slice(&metadata_json);
        body.put_slice(format!("\r\n--{}\r\n", boundary).as_bytes());
        body.put_slice(format!("Content-Type: {}\r\n\r\n", mime_type).as_bytes());
        body.put_slice(content);
        body.put_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
        Ok(body.freeze())
    }
}

#[async_trait]
impl RemoteStore for GoogleDriveConnector {
    #[instrument(skip(self, query), fields(parent_id = %query.parent_id, name = ?query.name))]
    async fn list_children(
        &self,
        query: &ChildQuery,
        page_token: Option<String>,
    ) -> Result<ObjectPage> {
        let mut url = format!(
            "{}/files?q={}&spaces=drive&pageSize={}&fields={}",
            self.api_base,
            urlencoding::encode(&Self::build_query(query)),
            query.page_size,
            urlencoding::encode(&format!(
                "nextPageToken,files({})",
                Self::field_list(&query.fields)
            )),
        );
        if let Some(token) = page_token {
            url.push_str(&format!("&pageToken={}", urlencoding::encode(&token)));
        }

        let response = self.send(HttpRequest::new(HttpMethod::Get, url), None).await?;
        let list_response: FilesListResponse =
            serde_json::from_slice(&response.body).map_err(|e| {
                GoogleDriveError::ParseError(format!("Failed to parse files list response: {}", e))
            })?;

        let objects = list_response
            .files
            .into_iter()
            .map(Self::convert_file)
            .collect::<crate::error::Result<Vec<_>>>()?;

        debug!(count = objects.len(), has_more = list_response.next_page_token.is_some(), "Listed children");
        Ok(ObjectPage {
            objects,
            next_page_token: list_response.next_page_token,
        })
    }

    #[instrument(skip(self, fields), fields(file_id = %id))]
    async fn get_object(&self, id: &str, fields: &[ObjectField]) -> Result<RemoteObject> {
        let url = format!(
            "{}/files/{}?fields={}",
            self.api_base,
            urlencoding::encode(id),
            urlencoding::encode(&Self::field_list(fields))
        );

        let response = self.send(HttpRequest::new(HttpMethod::Get, url), Some(id)).await?;
        let drive_file: DriveFile = serde_json::from_slice(&response.body).map_err(|e| {
            GoogleDriveError::ParseError(format!("Failed to parse file metadata: {}", e))
        })?;

        Ok(Self::convert_file(drive_file)?)
    }

    #[instrument(skip(self))]
    async fn create_object(
        &self,
        name: &str,
        kind: ObjectKind,
        parent_id: Option<String>,
    ) -> Result<String> {
        let body = FileMetadataBody {
            name: Some(name.to_string()),
            mime_type: match kind {
                ObjectKind::Folder => Some(mime::FOLDER.to_string()),
                ObjectKind::File | ObjectKind::Other => None,
            },
            parents: parent_id.clone().map(|p| vec![p]),
        };
        let url = format!("{}/files?fields=id", self.api_base);

        let request = HttpRequest::new(HttpMethod::Post, url).json(&body)?;
        let response = self.send(request, parent_id.as_deref()).await?;
        let id = Self::parse_id(&response)?;

        info!(id = %id, "Created object");
        Ok(id)
    }

    fn supports_create_with_parent(&self) -> bool {
        true
    }

    #[instrument(skip(self))]
    async fn update_parents(
        &self,
        id: &str,
        add_parent: &str,
        remove_parents: &[String],
    ) -> Result<()> {
        let mut url = format!(
            "{}/files/{}?addParents={}&fields=id,parents",
            self.api_base,
            urlencoding::encode(id),
            urlencoding::encode(add_parent)
        );
        if !remove_parents.is_empty() {
            url.push_str(&format!(
                "&removeParents={}",
                urlencoding::encode(&remove_parents.join(","))
            ));
        }

        let request = HttpRequest::new(HttpMethod::Patch, url).json(&serde_json::json!({}))?;
        self.send(request, Some(id)).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn rename_object(&self, id: &str, new_name: &str) -> Result<()> {
        let url = format!("{}/files/{}?fields=id", self.api_base, urlencoding::encode(id));
        let body = FileMetadataBody {
            name: Some(new_name.to_string()),
            ..Default::default()
        };

        let request = HttpRequest::new(HttpMethod::Patch, url).json(&body)?;
        self.send(request, Some(id)).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_object(&self, id: &str) -> Result<()> {
        let url = format!("{}/files/{}", self.api_base, urlencoding::encode(id));

        self.send(HttpRequest::new(HttpMethod::Delete, url), Some(id)).await?;
        info!(id = %id, "Deleted object");
        Ok(())
    }

    #[instrument(skip(self, local_path), fields(local = ?local_path))]
    async fn upload_content(
        &self,
        local_path: &Path,
        name: &str,
        mime_type: &str,
        parent_id: Option<String>,
    ) -> Result<String> {
        let content = self.file_system.read_file(local_path).await?;
        let metadata = FileMetadataBody {
            name: Some(name.to_string()),
            mime_type: None,
            parents: parent_id.clone().map(|p| vec![p]),
        };
        let boundary = format!("drive-mirror-{}", uuid::Uuid::new_v4().simple());
        let body = Self::multipart_body(&boundary, &metadata, mime_type, &content)?;

        let url = format!("{}/files?uploadType=multipart&fields=id", self.upload_base);
        let request = HttpRequest::new(HttpMethod::Post, url).body(
            format!("multipart/related; boundary={}", boundary),
            body,
        );
        let response = self.send(request, parent_id.as_deref()).await?;
        let id = Self::parse_id(&response)?;

        info!(id = %id, size = content.len(), "Uploaded file");
        Ok(id)
    }

    #[instrument(skip(self))]
    async fn copy_object(&self, id: &str) -> Result<String> {
        let url = format!(
            "{}/files/{}/copy?fields=id",
            self.api_base,
            urlencoding::encode(id)
        );

        let request = HttpRequest::new(HttpMethod::Post, url).json(&serde_json::json!({}))?;
        let response = self.send(request, Some(id)).await?;
        Self::parse_id(&response)
    }
}
