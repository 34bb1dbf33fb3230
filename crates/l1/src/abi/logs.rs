use alloy_primitives::Log;
use alloy_sol_types::{sol, SolEvent};

sol! {
    #[derive(Debug)]
    event CommitBatch(uint256 indexed batch_index, bytes32 indexed batch_hash);

    #[derive(Debug)]
    event FinalizeBatch(uint256 indexed batch_index, bytes32 indexed batch_hash, bytes32 state_root, bytes32 withdraw_root);

    #[derive(Debug)]
    event RevertBatch(uint256 indexed batch_index, bytes32 indexed batch_hash);
}

/// Tries to decode the provided log into the type T.
pub fn try_decode_log<T: SolEvent>(log: &Log) -> Option<Log<T>> {
    T::decode_log(log).ok()
}
