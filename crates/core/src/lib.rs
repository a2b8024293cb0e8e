pub mod config;
pub mod digest;
pub mod error;
pub mod exists;
pub mod fileset;
pub mod integrity;
pub mod network;
pub mod observer;
pub mod registry;
pub mod report;
pub mod types;

pub use error::CheckError;
pub use exists::check_exists;
pub use integrity::{check_integrity, check_integrity_with, IntegrityOptions};
pub use network::{check_blocked, check_connect, ProbeOptions, Protocol};
pub use observer::{CheckObserver, LogObserver, NullObserver};
pub use registry::{check_registry_value, RegistryOptions, RegistryReader, SystemRegistry};
pub use report::CheckResponse;
pub use types::{PerformanceMetric, Severity};
