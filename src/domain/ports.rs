use crate::config::toml_config::{AnalysisSettings, AnonymizerSettings};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;

    /// Replaces `path` atomically; readers never observe a partial file.
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Like `write_file`, but `check` sees the bytes as written and can veto
    /// the final rename.
    fn write_file_checked(
        &self,
        path: &str,
        data: &[u8],
        check: &(dyn Fn(&[u8]) -> Result<()> + Sync),
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn anonymizer(&self) -> &AnonymizerSettings;
    fn analysis(&self) -> &AnalysisSettings;
    fn column_aliases(&self) -> &HashMap<String, String>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    type Extracted: Send;
    type Transformed: Send;

    async fn extract(&self) -> Result<Self::Extracted>;
    async fn transform(&self, data: Self::Extracted) -> Result<Self::Transformed>;
    /// Returns where the result went (a path, or "stdout").
    async fn load(&self, result: Self::Transformed) -> Result<String>;
}
