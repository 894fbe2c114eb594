//! Canvasforge Jobs
//!
//! Sends captured pixels and a prompt to an image provider, polls for the
//! outcome and inserts the results back onto the canvas.
//!
//! Everything runs on one thread: jobs are `spawn_local` tasks sharing the
//! editor through `Rc<RefCell<_>>`, and the editor is only borrowed between
//! suspension points.

pub mod error;
pub mod orchestrator;
pub mod placement;
pub mod poll;
pub mod provider;
pub mod settings;

pub use error::{JobError, JobResult};
pub use orchestrator::{ActiveJob, JobHandle, JobId, JobNotice, JobOrchestrator, JobRequest, JobTicket, NoticeKind};
pub use placement::place_result;
pub use poll::poll_until_complete;
pub use provider::{EditRequest, PollResponse, PollStatus, Provider, ProviderError, ProviderKind, ProviderResult};
pub use settings::JobSettings;
