//! Files attached to a prompt as extra context.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::GenerationError;

/// Content of an attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentKind {
    Text(String),
    Image { mime_type: String, bytes: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub kind: AttachmentKind,
}

impl Attachment {
    pub fn text(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AttachmentKind::Text(content.into()),
        }
    }

    pub fn image(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            kind: AttachmentKind::Image {
                mime_type: mime_type.into(),
                bytes,
            },
        }
    }

    /// Read a file, classifying it by the MIME type guessed from its name.
    ///
    /// Images are kept as bytes; everything else is read as (lossy) UTF-8.
    pub fn from_path(path: &Path) -> Result<Self, GenerationError> {
        let bytes = std::fs::read(path).map_err(|source| GenerationError::Attachment {
            path: path.to_path_buf(),
            source,
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let mime = mime_guess::from_path(path).first_or_octet_stream();

        if mime.type_() == mime_guess::mime::IMAGE {
            Ok(Self::image(name, mime.essence_str(), bytes))
        } else {
            Ok(Self::text(name, String::from_utf8_lossy(&bytes).into_owned()))
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self.kind, AttachmentKind::Image { .. })
    }

    /// Base64 payload for image attachments.
    pub fn encoded(&self) -> Option<String> {
        match &self.kind {
            AttachmentKind::Image { bytes, .. } => Some(STANDARD.encode(bytes)),
            AttachmentKind::Text(_) => None,
        }
    }
}
