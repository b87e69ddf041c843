use sqlx::PgConnection;

/// Something which holds onto a live database connection that queries can run against
pub trait ConnectionHandle {
    fn borrow_connection(&mut self) -> &mut PgConnection;
}

/// Provides access to the external systems the domain's driven ports talk to.
/// Driven adapters receive one of these instead of owning clients themselves so
/// the same adapter can run against the pool or inside a transaction.
pub trait ExternalConnectivity: Sync {
    type DbHandle<'cxn_borrow>: ConnectionHandle + Send
    where
        Self: 'cxn_borrow;

    async fn database_cxn(&mut self) -> Result<Self::DbHandle<'_>, anyhow::Error>;
}

/// An [ExternalConnectivity] whose database work belongs to an open transaction
pub trait TransactionHandle: ExternalConnectivity {
    async fn commit(self) -> Result<(), anyhow::Error>;
}

/// Something which can open a transaction against its external systems
pub trait Transactable {
    type Handle: TransactionHandle;

    async fn start_transaction(&self) -> Result<Self::Handle, anyhow::Error>;
}
