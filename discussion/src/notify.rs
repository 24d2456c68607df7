use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::error::SyncError;

/// The user-facing action an outcome is reported for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Load,
    Post,
    Reply,
    Edit,
    Delete,
    Vote,
    Pin,
    Unpin,
    MakePrivate,
    MakePublic,
    Approve,
    Merge,
}

impl Operation {
    /// Votes, loads and new comments show up in the thread itself, so they
    /// are not announced.
    pub fn success_message(&self) -> Option<&'static str> {
        match self {
            Operation::Load | Operation::Post | Operation::Reply | Operation::Vote => None,
            Operation::Edit => Some("Comment updated"),
            Operation::Delete => Some("Comment deleted"),
            Operation::Pin => Some("Comment pinned"),
            Operation::Unpin => Some("Comment unpinned"),
            Operation::MakePrivate => Some("Comment is now private"),
            Operation::MakePublic => Some("Comment is now public"),
            Operation::Approve => Some("Comment approved"),
            Operation::Merge => Some("Posts merged"),
        }
    }

    pub fn failure_message(&self) -> &'static str {
        match self {
            Operation::Load => "Could not load comments",
            Operation::Post => "Could not post your comment",
            Operation::Reply => "Could not post your reply",
            Operation::Edit => "Could not update the comment",
            Operation::Delete => "Could not delete the comment",
            Operation::Vote => "Could not record your vote",
            Operation::Pin => "Could not pin the comment",
            Operation::Unpin => "Could not unpin the comment",
            Operation::MakePrivate | Operation::MakePublic => {
                "Could not change the comment visibility"
            }
            Operation::Approve => "Could not approve the comment",
            Operation::Merge => "Could not merge the posts",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Notification {
    Success {
        operation: Operation,
        message: String,
    },
    Failure {
        operation: Operation,
        message: String,
        retryable: bool,
    },
}

/// Fans engine outcomes out to whoever renders them.
#[derive(Clone)]
pub struct Notifier {
    events: broadcast::Sender<Notification>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity);
        Self { events }
    }

    pub fn subscribe(&self) -> BroadcastStream<Notification> {
        BroadcastStream::new(self.events.subscribe())
    }

    pub fn success(&self, operation: Operation) {
        if let Some(message) = operation.success_message() {
            self.send(Notification::Success {
                operation,
                message: message.to_string(),
            });
        }
    }

    pub fn failure(&self, operation: Operation, error: &SyncError) {
        if error.is_silent() {
            return;
        }

        self.send(Notification::Failure {
            operation,
            message: format!("{}: {error}", operation.failure_message()),
            retryable: error.is_retryable(),
        });
    }

    fn send(&self, notification: Notification) {
        // nobody listening is fine
        let _ = self.events.send(notification);
    }
}
