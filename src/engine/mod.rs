mod pipeline;

pub use pipeline::PipelineClient;

use crate::error::PanelError;
use crate::model::{PanelRequest, PanelResult};
use async_trait::async_trait;

/// Executes one analysis request against the service.
///
/// The dispatcher only sees this trait so tests can substitute a canned transport.
#[async_trait]
pub trait PanelTransport: Send + Sync {
    async fn full_pipeline(&self, request: &PanelRequest) -> Result<PanelResult, PanelError>;
}
