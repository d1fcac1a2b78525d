use std::sync::Arc;

use memberdir_config::Settings;
use memberdir_services::{MemberDao, MemberService, MemberStore};
use mongodb::Database;

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub members: MemberService,
}

impl AppState {
    pub fn new(store: Arc<dyn MemberStore>, settings: Settings) -> Self {
        Self {
            members: MemberService::new(store),
            settings,
        }
    }

    /// State backed by the configured MongoDB members collection.
    pub fn from_database(db: &Database, settings: Settings) -> Self {
        let dao = MemberDao::new(db, &settings.members.collection);
        Self::new(Arc::new(dao), settings)
    }
}
