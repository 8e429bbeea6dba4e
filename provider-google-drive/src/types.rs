//! Google Drive API request and response types
//!
//! See: https://developers.google.com/drive/api/v3/reference/files#resource

use serde::{Deserialize, Serialize};

/// MIME types Drive assigns to its own object kinds
pub mod mime {
    pub const FOLDER: &str = "application/vnd.google-apps.folder";
    pub const FILE: &str = "application/vnd.google-apps.file";
    pub const DOCUMENT: &str = "application/vnd.google-apps.document";
    pub const SPREADSHEET: &str = "application/vnd.google-apps.spreadsheet";
    pub const PRESENTATION: &str = "application/vnd.google-apps.presentation";
    pub const SHORTCUT: &str = "application/vnd.google-apps.shortcut";
    pub const PHOTO: &str = "application/vnd.google-apps.photo";

    /// Prefix shared by every Drive-native type
    pub const NATIVE_PREFIX: &str = "application/vnd.google-apps.";
}

/// Drive file resource, as projected by the `fields` parameter.
///
/// Only `id` is guaranteed; everything else depends on the projection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub mime_type: String,

    /// Size in bytes, sent as a decimal string (omitted for folders)
    pub size: Option<String>,

    /// Modification time (RFC 3339, UTC)
    pub modified_time: Option<String>,

    pub md5_checksum: Option<String>,

    #[serde(default)]
    pub parents: Vec<String>,
}

/// files.list response
///
/// See: https://developers.google.com/drive/api/v3/reference/files/list
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesListResponse {
    #[serde(default)]
    pub files: Vec<DriveFile>,

    pub next_page_token: Option<String>,
}

/// Minimal response of create/copy/update calls requested with `fields=id`
#[derive(Debug, Deserialize)]
pub struct FileIdResponse {
    pub id: String,
}

/// Metadata body for files.create and files.copy
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadataBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parents: Option<Vec<String>>,
}
