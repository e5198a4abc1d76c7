use crate::models::ModelError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// Serde renames keep the JSON form identical to the as_str form, so the
/// wire sees "in-review", never "InReview".
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ModelError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(Role {
    Patient => "patient",
    Doctor => "doctor",
});

str_enum!(ConsultationStatus {
    Pending => "pending",
    InReview => "in-review",
    Completed => "completed",
});

str_enum!(MenstrualCycle {
    Regular => "regular",
    Irregular => "irregular",
    VeryIrregular => "very-irregular",
});

str_enum!(PreviousDiagnosis {
    Pcod => "pcod",
    Pcos => "pcos",
    NotDiagnosed => "not-diagnosed",
});

str_enum!(ReportsAvailable {
    Yes => "yes",
    No => "no",
});

str_enum!(MediaKind {
    Image => "image",
    Audio => "audio",
    Video => "video",
});

impl MenstrualCycle {
    /// Label shown next to the cycle option in the intake form.
    pub fn display_label(&self) -> &'static str {
        match self {
            Self::Regular => "Regular (cycle within 21-35 days)",
            Self::Irregular => "Irregular (varies by a few days)",
            Self::VeryIrregular => "Very Irregular (unpredictable or absent)",
        }
    }
}

impl PreviousDiagnosis {
    pub fn display_label(&self) -> &'static str {
        match self {
            Self::Pcod => "PCOD",
            Self::Pcos => "PCOS",
            Self::NotDiagnosed => "Not diagnosed yet",
        }
    }
}

impl MediaKind {
    /// Bucket name the upload endpoint reports for this kind (note the
    /// plural for images).
    pub fn bucket(&self) -> &'static str {
        match self {
            Self::Image => "images",
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }

    /// Classify a MIME type string by its top-level type.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let top = mime.split('/').next().unwrap_or("");
        match top {
            "image" => Some(Self::Image),
            "audio" => Some(Self::Audio),
            "video" => Some(Self::Video),
            _ => None,
        }
    }

    /// Inverse of [`MediaKind::bucket`], for upload responses.
    pub fn from_bucket(bucket: &str) -> Option<Self> {
        match bucket {
            "images" => Some(Self::Image),
            "audio" => Some(Self::Audio),
            "video" => Some(Self::Video),
            _ => None,
        }
    }
}
