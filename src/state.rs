use std::sync::Arc;

use crate::config::Config;
use crate::identity::IdentityProvider;
use crate::review::ReviewWorkflow;

pub struct AppState {
    pub review: ReviewWorkflow,
    pub identity: Arc<dyn IdentityProvider>,
    pub config: Arc<Config>,
}
