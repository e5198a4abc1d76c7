use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::MediaKind;

/// Client-local pairing of a byte blob with a locally-valid URL reference.
/// The `local_url` is issued by the object-URL registry at the same instant
/// the record is created and stays valid until explicitly revoked; a
/// submitted consultation never carries it, only durable URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaFile {
    pub id: Uuid,
    pub name: String,
    pub kind: MediaKind,
    pub content_type: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub local_url: String,
}

impl MediaFile {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}
