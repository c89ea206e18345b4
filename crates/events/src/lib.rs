//! Side-effect pipeline for committed domain actions.
//!
//! - [`DomainEvent`]: the `(subject, action, actor, metadata)` tuple announced
//!   after a mutation commits.
//! - [`Dispatcher`]: fans an event out to a fixed, ordered list of
//!   [`Subscriber`]s, inline or through a bounded queue.
//! - [`ActivityLogger`] and [`NotificationRouter`]: the two subscribers, each
//!   writing through a store trait ([`ActivityStore`], [`NotificationDirectory`]).
//! - [`PgStore`] and [`MemoryStore`]: store implementations.
//! - [`delivery`]: outbound email.

pub mod activity;
pub mod delivery;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod memory;
pub mod pg;
pub mod router;
pub mod subscriber;

pub use activity::{ActivityLogger, ActivityStore};
pub use delivery::email::{send_detached, EmailConfig, LogMailer, MailTemplate, Mailer, SmtpMailer};
pub use dispatcher::{Dispatcher, QueueSettings};
pub use error::Error;
pub use event::{DomainEvent, EventActor, RequestContext};
pub use memory::MemoryStore;
pub use pg::PgStore;
pub use router::{NotificationDirectory, NotificationRouter};
pub use subscriber::{standard_subscribers, Subscriber};
