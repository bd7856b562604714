//! Service-request lifecycle engine
//!
//! Owns the request state machine (PENDING → IN_PROGRESS →
//! VALIDATED/REJECTED) and every valid transition. Balance effects
//! (service payment, agent commission, optional rejection refund) are
//! composed with the transition in a single transaction.

pub mod model;
pub mod service;

pub use model::{
    AssignRequestPayload, CloseRequestPayload, ListRequestsQuery, RejectRequestPayload,
    RequestStatus, ServiceRequest, SubmitServiceRequest,
};
pub use service::{RequestError, RequestService};
