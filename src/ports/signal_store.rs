//! Persistence ports for the signal and position ledgers.

use crate::domain::error::FibtraderError;
use crate::domain::signal_table::{PositionTable, SignalTable};

pub trait SignalStore {
    /// Load the stored table, or an empty one if nothing has been saved yet.
    fn load(&self) -> Result<SignalTable, FibtraderError>;

    fn save(&self, table: &SignalTable) -> Result<(), FibtraderError>;
}

pub trait PositionStore {
    fn load_positions(&self) -> Result<PositionTable, FibtraderError>;

    fn save_positions(&self, table: &PositionTable) -> Result<(), FibtraderError>;
}
