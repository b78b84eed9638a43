//! Error types, one enum per protocol domain.

mod delivery;
mod host;
mod store;
mod surface;
mod verify;

pub use delivery::DeliveryError;
pub use host::HostError;
pub use store::StoreError;
pub use surface::SurfaceError;
pub use verify::VerifyError;
