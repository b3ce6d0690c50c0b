use std::fmt;

/// Named views the presentation layer can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Ledger,
    ConductTransaction,
    TransactionPool,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Home => "home",
            Route::Ledger => "ledger",
            Route::ConductTransaction => "conduct-transaction",
            Route::TransactionPool => "transaction-pool",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Injected navigation capability. The core decides *when* to move the user;
/// the presentation layer decides what moving means.
pub trait Navigator: Send + Sync {
    fn navigate_to(&self, route: Route);
}
