//! 协作方的薄适配器实现：子进程转换与 HTTP 胶水。

mod http;
mod libreoffice;

pub use http::{HttpLearningSink, HttpStorageClient, HttpWebhookNotifier, LearningEndpoints};
pub use libreoffice::{LibreOfficeConverter, LibreOfficeRenderer};
