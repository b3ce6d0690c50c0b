/// The single outstanding user-triggered action. Created on user intent,
/// destroyed when the action settles; its existence is the busy guard.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingAction {
    Submit { recipient: String, amount: f64 },
    Mine,
}
