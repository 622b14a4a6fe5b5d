use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored image metadata as resolved by the repository.
///
/// `path` is relative to the storage root and always uses forward slashes.
/// A record with `deleted` set is logically removed and must never be
/// transformable, even though its row persists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: i64,
    /// Owning user; the authorization gate compares this against the caller
    pub user_id: i64,
    /// Display name, used to derive output filenames
    pub name: String,
    pub original_name: String,
    pub path: String,
    pub size: i64,
    pub width: i32,
    pub height: i32,
    pub media_type: String,
    pub access_count: i64,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ImageRecord {
    /// Lowercased extension of the stored name, defaulting to `jpg` when the
    /// name carries none.
    pub fn extension(&self) -> String {
        match self.name.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => ext.to_lowercase(),
            _ => "jpg".to_string(),
        }
    }

    /// Stored name with its extension stripped.
    pub fn base_name(&self) -> &str {
        match self.name.rsplit_once('.') {
            Some((base, ext)) if !ext.is_empty() => base,
            _ => &self.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_named(name: &str) -> ImageRecord {
        ImageRecord {
            id: 1,
            user_id: 1,
            name: name.to_string(),
            original_name: name.to_string(),
            path: format!("originals/{}", name),
            size: 0,
            width: 0,
            height: 0,
            media_type: "image/jpeg".to_string(),
            access_count: 0,
            deleted: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_extension_lowercased() {
        assert_eq!(record_named("photo.JPG").extension(), "jpg");
        assert_eq!(record_named("photo.webp").extension(), "webp");
    }

    #[test]
    fn test_extension_defaults_to_jpg() {
        assert_eq!(record_named("noext").extension(), "jpg");
        assert_eq!(record_named("dot.").extension(), "jpg");
    }

    #[test]
    fn test_base_name() {
        assert_eq!(record_named("photo.final.png").base_name(), "photo.final");
        assert_eq!(record_named("noext").base_name(), "noext");
    }
}
