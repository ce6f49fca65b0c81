pub mod verification;

pub use verification::{
    event_channel, EventReceiver, EventSender, Notice, VerificationController, WorkflowEvent,
    WorkflowState,
};
