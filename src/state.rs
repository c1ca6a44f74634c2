use crate::checkin::CheckInService;
use crate::storage::Store;

#[derive(Clone)]
pub struct AppState {
    pub service: CheckInService,
}

impl AppState {
    pub fn new(store: Store) -> Self {
        Self {
            service: CheckInService::new(store),
        }
    }

    pub fn store(&self) -> &Store {
        self.service.store()
    }
}
