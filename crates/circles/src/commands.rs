use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr, VariantNames};

#[derive(
    Debug, Clone,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
    PartialEq
)]
#[serde(tag = "type", content = "params")]
#[strum(serialize_all = "snake_case")]
pub enum CircleCommand {
    /// Detect circles in an uploaded image file and return an annotated copy
    #[serde(rename = "detect")]
    Detect {
        #[schemars(range(min = 1))]
        min_radius: Option<u32>,
        #[schemars(range(min = 2))]
        max_radius: Option<u32>,
    },

    /// Detect circles in a base64-encoded image
    #[serde(rename = "detect_base64")]
    DetectBase64 {
        #[schemars(range(min = 1))]
        min_radius: Option<u32>,
        #[schemars(range(min = 2))]
        max_radius: Option<u32>,
    },

    /// Cut every detected circle out as its own image
    #[serde(rename = "extract")]
    Extract,
}

impl CircleCommand {
    /// Get the JSON schema for all commands
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(CircleCommand)
    }

    /// Get a list of all available command names
    pub fn command_names() -> &'static [&'static str] {
        <Self as VariantNames>::VARIANTS
    }

    /// Every command with its parameters unset
    pub fn all() -> Vec<Self> {
        Self::iter().collect()
    }

    /// HTTP route serving the command
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Detect { .. } => "/detect",
            Self::DetectBase64 { .. } => "/detect_base64",
            Self::Extract => "/extract",
        }
    }

    /// Get a description of the command
    pub fn description(&self) -> &'static str {
        match self {
            Self::Detect { .. } => "Detect circles in uploaded image",
            Self::DetectBase64 { .. } => "Detect circles in base64 encoded image",
            Self::Extract => "Extract individual circles as separate images",
        }
    }

    /// Get parameter requirements for the command
    pub fn parameters_info(&self) -> Vec<(&'static str, &'static str, bool)> {
        match self {
            Self::Detect { .. } => vec![
                ("image", "Image file, multipart field", true),
                ("min_radius", "Minimum circle radius (default: 10)", false),
                ("max_radius", "Maximum circle radius (default: 200)", false),
            ],
            Self::DetectBase64 { .. } => vec![
                ("image", "Base64 encoded image or data URI, JSON field", true),
                ("min_radius", "Minimum circle radius (default: 10)", false),
                ("max_radius", "Maximum circle radius (default: 200)", false),
            ],
            Self::Extract => vec![
                ("image", "Image file, multipart field", true),
            ],
        }
    }
}
