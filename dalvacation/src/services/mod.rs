pub mod http;
pub mod identity;
pub mod profile;
pub mod pubsub;
pub mod reservation;
pub mod rooms;
