pub mod codec;
pub mod stream;

pub use codec::{FamilyRecord, FamilySnapshot, FeedUpdate};
pub use stream::run_feed_loop;
