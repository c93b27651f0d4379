pub mod loader;
pub mod remote;
mod resolver;
pub mod schema;

pub use loader::{default_config_path, expand_path};
pub use remote::{GistEndpoints, fetch_gist_config};
pub use resolver::resolve;
pub use schema::{
    AvatarConfig, ConnectionSettings, PrechatConfig, RawWidgetConfig, ThemeConfig, WidgetConfig,
    WidgetLimits,
};
