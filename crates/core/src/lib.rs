pub mod capability;
pub mod client;
pub mod config;
pub mod health;
pub mod loader;
pub mod media_type;
pub mod metrics;
pub mod provider;
pub mod reconciler;
pub mod registry;
pub mod rendition;
pub mod testing;

pub use capability::{resolve, CapabilityMap, TransformCoreConfig};
pub use client::{ClientError, HttpTransformApi, TransformApi, TransformRequest};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError,
    RemoteServiceDescriptor, SanitizedConfig, TransformServiceConfig,
};
pub use health::{no_shutdown, HealthGate, HealthStatus};
pub use loader::{
    LoadReport, LoaderError, LoaderExecutor, LoaderOutcome, ServiceLoader, TransformCoreLoader,
};
pub use media_type::{MediaType, MediaTypeError};
pub use provider::{
    collect_bytes, ByteStream, ConversionError, RenditionInput, RenditionProvider,
    TransformCoreProvider,
};
pub use reconciler::{reconcile, PlannedHandler, ReconcilePlan};
pub use registry::{ComponentRegistry, HandlerId, InMemoryRegistry, RegistryError};
pub use rendition::{ProviderSummary, RenditionError, RenditionService};
