pub mod comment;
pub mod entity;
pub mod page;
pub mod thread;

pub use comment::{Comment, CommentId, VoteState};
pub use entity::{Entity, EntityId, ListingKey, MergeDirection, MergeRecord};
pub use page::Page;
pub use thread::{Parent, PrivacyFilter, SortMode, ThreadKey};
