pub mod accounts;
pub mod database;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod notifier;
pub mod registration;
pub mod sequence;

pub use accounts::AccountProvisioner;
pub use database::Database;
pub use error::ServiceError;
pub use ledger::FeeLedger;
pub use metrics::{get_metrics, init_metrics};
pub use notifier::{
    GatewaySmsProvider, MockSmsProvider, NotificationDispatcher, SmsProvider,
};
pub use registration::RegistrationWorkflow;
pub use sequence::SequenceAllocator;
