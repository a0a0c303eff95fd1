//! Timeouts - Per-operation deadlines for provider calls

use std::fmt;
use std::future::Future;
use std::time::Duration;

use crate::provider::{ProviderError, ProviderResult};

const MINUTE: Duration = Duration::from_secs(60);

/// Lifecycle operation a timeout applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
        };
        f.write_str(s)
    }
}

/// Deadlines for each lifecycle operation of a resource type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceTimeouts {
    pub create: Duration,
    pub read: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Default for ResourceTimeouts {
    fn default() -> Self {
        Self {
            create: 30 * MINUTE,
            read: 5 * MINUTE,
            update: 30 * MINUTE,
            delete: 30 * MINUTE,
        }
    }
}

impl ResourceTimeouts {
    /// Same deadline for create, update and delete; reads stay at the default
    pub fn write_minutes(minutes: u32) -> Self {
        let write = MINUTE * minutes;
        Self {
            create: write,
            update: write,
            delete: write,
            ..Self::default()
        }
    }

    pub fn with_read(mut self, read: Duration) -> Self {
        self.read = read;
        self
    }

    pub fn for_operation(&self, op: Operation) -> Duration {
        match op {
            Operation::Create => self.create,
            Operation::Read => self.read,
            Operation::Update => self.update,
            Operation::Delete => self.delete,
        }
    }
}

/// Run `fut`, failing with a ProviderError once `limit` has elapsed
pub async fn with_timeout<T, F>(op: Operation, limit: Duration, fut: F) -> ProviderResult<T>
where
    F: Future<Output = ProviderResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::new(format!(
            "timed out after {}s waiting for {}",
            limit.as_secs(),
            op
        ))),
    }
}
