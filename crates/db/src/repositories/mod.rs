//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the
//! application.

pub mod ambulance;
pub mod assignment;
pub mod attachment;
pub mod audit;
pub mod region;
pub mod user;
pub mod workflow;

pub use ambulance::{AmbulanceRepository, UpdateAmbulanceInput};
pub use assignment::AssignmentRepository;
pub use attachment::AttachmentRepository;
pub use audit::AuditRepository;
pub use region::RegionRepository;
pub use user::{UpdateUserInput, UserRepository};
pub use workflow::{BillQuery, BillWithPayment, WorkflowRepository};
