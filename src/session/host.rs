use super::controller::WidgetController;
use super::runtime::WidgetRuntime;
use crate::config::{RawWidgetConfig, resolve};
use crate::error::{SessionError, WidgetError};
use crate::transport::{TransportAdapter, TransportFactory};
use std::sync::Arc;

/// One embedding location. Holds at most one widget.
#[derive(Debug, Default)]
pub struct WidgetHost {
    mounted: bool,
}

impl WidgetHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Resolve the configuration and build the widget runtime.
    ///
    /// Configuration errors are logged and returned; nothing is mounted and
    /// no transport is created, so the caller may retry with a fixed config.
    pub fn mount(
        &mut self,
        raw: RawWidgetConfig,
        factory: Arc<dyn TransportFactory>,
    ) -> Result<WidgetRuntime, WidgetError> {
        if self.mounted {
            return Err(SessionError::AlreadyMounted.into());
        }

        let config =
            resolve(raw).inspect_err(|e| tracing::error!(error = %e, "widget not mounted"))?;

        let adapter = TransportAdapter::new(
            factory,
            config.connection.clone(),
            config.limits.max_upload_bytes,
        );
        tracing::info!(
            widget_id = %config.connection.widget_id,
            prechat = config.prechat_enabled(),
            "widget mounted"
        );
        let controller = WidgetController::new(Arc::new(config));
        self.mounted = true;
        Ok(WidgetRuntime::new(controller, adapter))
    }
}
