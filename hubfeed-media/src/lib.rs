use thiserror::Error as ThisError;

#[derive(Clone, Debug, ThisError)]
pub enum MediaError {
    #[error("media base URL is not configured")]
    MissingBaseUrl,
}

/// Sizing variant for resolved image URLs. Each variant carries a fixed
/// width/height pair appended as a query to relative media paths.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageVariant {
    Avatar,
    Post,
    Thumbnail,
}

impl ImageVariant {
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            ImageVariant::Avatar => (128, 128),
            ImageVariant::Post => (1024, 768),
            ImageVariant::Thumbnail => (320, 240),
        }
    }
}

/// Resolves possibly-relative media paths against a configured base URL.
///
/// Construction fails when the base URL is absent. A missing base URL
/// would otherwise corrupt every image in the feed, so this is a hard
/// startup error rather than a fallback.
#[derive(Clone, Debug)]
pub struct MediaResolver {
    base_url: String,
}

impl MediaResolver {
    pub fn new(base_url: Option<&str>) -> Result<Self, MediaError> {
        match base_url {
            Some(base) if !base.trim().is_empty() => Ok(Self {
                base_url: base.trim_end_matches('/').to_string(),
            }),
            _ => Err(MediaError::MissingBaseUrl),
        }
    }

    /// Returns `None` for an absent path, passes absolute URLs through
    /// unchanged, and otherwise joins the path onto the base URL with the
    /// variant's sizing query.
    pub fn resolve(&self, path: Option<&str>, variant: ImageVariant) -> Option<String> {
        let path = path?;
        if path.is_empty() {
            return None;
        }
        if path.starts_with("http://") || path.starts_with("https://") {
            return Some(path.to_string());
        }

        let (width, height) = variant.dimensions();
        Some(format!(
            "{}/{}?w={}&h={}&fm=webp",
            self.base_url,
            path.trim_start_matches('/'),
            width,
            height
        ))
    }
}
