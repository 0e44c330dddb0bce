pub mod server;

/// Parsed CLI intent, produced by `dispatch::handler` and executed by the
/// binary.
#[derive(Debug)]
pub enum Action {
    Server(server::Args),
}

impl Action {
    /// Run the action to completion.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        match self {
            Self::Server(args) => server::execute(args).await,
        }
    }
}
