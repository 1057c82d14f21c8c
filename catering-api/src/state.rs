use std::sync::Arc;

use catering_core::{BookingRepository, Clock, NotificationDispatcher, StoreProbe, UserRepository};
use catering_lifecycle::{ExpirySweeper, LifecycleController};

#[derive(Clone)]
pub struct AppState {
    pub lifecycle: Arc<LifecycleController>,
    pub sweeper: Arc<ExpirySweeper>,
    pub bookings: Arc<dyn BookingRepository>,
    pub users: Arc<dyn UserRepository>,
    pub probe: Arc<dyn StoreProbe>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        users: Arc<dyn UserRepository>,
        probe: Arc<dyn StoreProbe>,
        notifier: Arc<dyn NotificationDispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let lifecycle = Arc::new(LifecycleController::new(
            bookings.clone(),
            notifier.clone(),
            clock.clone(),
        ));
        let sweeper = Arc::new(ExpirySweeper::new(bookings.clone(), notifier, clock.clone()));

        Self {
            lifecycle,
            sweeper,
            bookings,
            users,
            probe,
            clock,
        }
    }
}
