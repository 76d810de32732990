pub mod rest;
pub mod stream;
pub mod tracker;

pub use rest::{AuthEndpoints, OrderAction, OrderManagerClient, PlaceOrder};
pub use stream::run_order_loop;
pub use tracker::{OrderEvent, OrderRecord, OrderTracker};
