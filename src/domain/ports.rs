use crate::domain::model::Archive;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Something that turns an archived project into a PDF.
#[async_trait]
pub trait Compiler: Send + Sync {
    async fn compile(&self, archive: Archive) -> Result<Vec<u8>>;
}

#[async_trait]
impl<C: Compiler + ?Sized> Compiler for Arc<C> {
    async fn compile(&self, archive: Archive) -> Result<Vec<u8>> {
        (**self).compile(archive).await
    }
}
