use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use crate::leave::error::LeaveError;

pub const MAX_ATTACHMENT_BYTES: usize = 5 * 1024 * 1024;
pub const ALLOWED_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "pdf", "doc", "docx"];

#[derive(Debug, Clone)]
pub struct AttachmentUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

pub fn validate(upload: &AttachmentUpload) -> Result<(), LeaveError> {
    let extension = Path::new(&upload.filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    if !extension.is_some_and(|e| ALLOWED_EXTENSIONS.contains(&e.as_str())) {
        return Err(LeaveError::Validation(format!(
            "Invalid attachment type. Allowed: {}",
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }
    if upload.bytes.is_empty() {
        return Err(LeaveError::Validation("Attachment is empty".to_string()));
    }
    if upload.bytes.len() > MAX_ATTACHMENT_BYTES {
        return Err(LeaveError::Validation("Attachment exceeds the 5 MB limit".to_string()));
    }
    Ok(())
}

/// Stores an already validated upload and returns an opaque reference.
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    async fn save(&self, upload: &AttachmentUpload) -> std::io::Result<String>;

    /// Deletes a stored upload whose request never committed.
    async fn remove(&self, reference: &str) -> std::io::Result<()>;
}

/// Files under a local directory, named `<uuid>_<original name>`.
#[derive(Debug, Clone)]
pub struct LocalAttachmentStore {
    root: PathBuf,
}

impl LocalAttachmentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

fn sanitize(filename: &str) -> String {
    let base = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("attachment");
    base.chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect()
}

#[async_trait]
impl AttachmentStore for LocalAttachmentStore {
    async fn save(&self, upload: &AttachmentUpload) -> std::io::Result<String> {
        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.root.join(format!("{}_{}", Uuid::new_v4(), sanitize(&upload.filename)));
        tokio::fs::write(&path, &upload.bytes).await?;
        tracing::debug!(path = %path.display(), bytes = upload.bytes.len(), "Attachment stored");
        Ok(path.to_string_lossy().into_owned())
    }

    async fn remove(&self, reference: &str) -> std::io::Result<()> {
        tokio::fs::remove_file(reference).await
    }
}

#[cfg(test)]
mod tests {
    use super::{sanitize, validate, AttachmentStore, AttachmentUpload, LocalAttachmentStore, MAX_ATTACHMENT_BYTES};
    use crate::leave::error::ErrorKind;

    fn upload(name: &str, size: usize) -> AttachmentUpload {
        AttachmentUpload { filename: name.to_string(), bytes: vec![7u8; size] }
    }

    #[test]
    fn accepts_allowed_extensions_in_any_case() {
        for name in ["note.pdf", "scan.JPG", "x.jpeg", "p.png", "letter.doc", "letter.DOCX"] {
            assert!(validate(&upload(name, 10)).is_ok(), "{name}");
        }
    }

    #[test]
    fn rejects_other_extensions_and_bare_names() {
        for name in ["run.exe", "archive.zip", "README", "pdf"] {
            let err = validate(&upload(name, 10)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "{name}");
        }
    }

    #[test]
    fn size_limit_is_inclusive() {
        assert!(validate(&upload("a.pdf", MAX_ATTACHMENT_BYTES)).is_ok());
        assert!(validate(&upload("a.pdf", MAX_ATTACHMENT_BYTES + 1)).is_err());
        assert!(validate(&upload("a.pdf", 0)).is_err());
    }

    #[test]
    fn sanitize_strips_directories_and_odd_characters() {
        assert_eq!(sanitize("../../etc/pass wd.pdf"), "pass_wd.pdf");
        assert_eq!(sanitize("médical.png"), "m_dical.png");
    }

    #[actix_web::test]
    async fn local_store_writes_the_bytes() {
        let root = std::env::temp_dir().join(format!("leave-attachments-{}", uuid::Uuid::new_v4()));
        let store = LocalAttachmentStore::new(&root);

        let path = store.save(&upload("doctor note.pdf", 32)).await.unwrap();
        assert!(path.ends_with("_doctor_note.pdf"));
        assert_eq!(tokio::fs::read(&path).await.unwrap().len(), 32);

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }

    #[actix_web::test]
    async fn local_store_removes_what_it_saved() {
        let root = std::env::temp_dir().join(format!("leave-attachments-{}", uuid::Uuid::new_v4()));
        let store = LocalAttachmentStore::new(&root);

        let path = store.save(&upload("scan.png", 8)).await.unwrap();
        store.remove(&path).await.unwrap();
        assert!(!std::path::Path::new(&path).exists());
        assert!(store.remove(&path).await.is_err());

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }
}
