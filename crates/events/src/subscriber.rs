use std::sync::Arc;

use async_trait::async_trait;

use crate::activity::{ActivityLogger, ActivityStore};
use crate::error::Error;
use crate::event::DomainEvent;
use crate::router::{NotificationDirectory, NotificationRouter};

/// A handler for committed domain events.
///
/// Subscribers are called one after another in registration order. A failing
/// subscriber never stops the ones after it.
#[async_trait]
pub trait Subscriber: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn handle(&self, event: &DomainEvent) -> Result<(), Error>;
}

/// The application's subscriber list: the activity logger, then the
/// notification router.
pub fn standard_subscribers(
    activity: Arc<dyn ActivityStore>,
    directory: Arc<dyn NotificationDirectory>,
) -> Vec<Arc<dyn Subscriber>> {
    vec![
        Arc::new(ActivityLogger::new(activity)),
        Arc::new(NotificationRouter::new(directory)),
    ]
}
