pub mod item;
pub mod loaders;
pub mod notification;
pub mod scan;

pub use item::{mime_for_name, ImageBlob, ProcessedResult, ProcessingStatus, ScanItem};
pub use loaders::{is_supported_image, load_all_images, load_image};
pub use notification::{Notification, NotificationKind};
pub use scan::{EngineResult, PredictResponse, UploadResponse};
