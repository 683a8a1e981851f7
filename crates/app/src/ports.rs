//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside
//! world. They are defined here (in `app`) so that both the use-case layer
//! and the adapter layer can depend on them without creating circular
//! dependencies.

pub mod clock;
pub mod messenger;
pub mod renderer;
pub mod storage;

pub use clock::{Clock, SystemClock};
pub use messenger::Messenger;
pub use renderer::Renderer;
pub use storage::{
    AuditFilter, AuditLogRepository, AuditPage, CustomerRepository, InsertOutcome,
    InvoiceRepository, NotificationRepository, PackageRepository, TenantRepository,
};

/// Boxed error used by best-effort collaborator ports (renderer, messenger)
/// whose failures are logged rather than propagated.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
