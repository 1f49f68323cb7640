pub mod notification_center;
pub mod result_exporter;

pub use notification_center::NotificationCenter;
pub use result_exporter::{export_name, ResultExporter};
