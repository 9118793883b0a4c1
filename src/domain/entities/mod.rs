//! Domain entity definitions.

mod api_key;
mod banner;
mod banner_input;
mod cache_entry;
mod ids;
mod provider;
mod resolved;
mod settings;

pub use api_key::ApiKey;
pub use banner::{BannerPosition, BannerSpec, DEFAULT_ANCHOR, DEFAULT_CONTENT_START, Metadata};
pub use banner_input::{
    BannerInput, IMAGE_EXTENSIONS, VIDEO_EXTENSIONS, extension_of, is_accepted_media,
    is_video_path, mime_for_extension,
};
pub use cache_entry::{BannerState, CacheEntry, CacheKey, IconState};
pub use ids::{DocumentPath, LeafId};
pub use provider::{ImageSize, Orientation, ProviderKind, SearchOptions};
pub use resolved::{OBJECT_URL_SCHEME, ResolvedBanner, SourceKind};
pub use settings::{BannerSettings, CachePolicy, FieldNames, FolderBanner};
