use async_trait::async_trait;

/// Answers whether the current user may open premium quizzes.
#[async_trait]
pub trait EntitlementProvider: Send + Sync {
    async fn premium_active(&self) -> bool;
}

/// Fixed answer, e.g. resolved once from the user profile at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticEntitlement(pub bool);

#[async_trait]
impl EntitlementProvider for StaticEntitlement {
    async fn premium_active(&self) -> bool {
        self.0
    }
}
