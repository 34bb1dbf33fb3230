use alloy_sol_types::sol;

sol! {
    #[derive(Debug)]
    function commitBatch(
        uint8 version,
        bytes calldata parent_batch_header,
        bytes[] memory chunks,
        bytes calldata skipped_l1_message_bitmap
    ) external;

    #[derive(Debug)]
    function finalizeBatchWithProof4844(
        bytes calldata batch_header,
        bytes32 prev_state_root,
        bytes32 post_state_root,
        bytes32 withdraw_root,
        bytes calldata blob_data_proof,
        bytes calldata aggr_proof
    ) external;

    #[derive(Debug)]
    function importGenesisBatch(
        bytes calldata batch_header,
        bytes32 state_root
    ) external;

    #[derive(Debug)]
    function setL1BaseFee(uint256 new_base_fee) external;

    #[derive(Debug)]
    function setL2BaseFee(uint256 new_base_fee) external;
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Bytes, B256, U256};
    use alloy_sol_types::SolCall;

    #[test]
    fn commit_batch_calldata_roundtrips() {
        let call = commitBatchCall {
            version: 1,
            parent_batch_header: Bytes::from_static(&[1, 2, 3]),
            chunks: vec![Bytes::from_static(&[4]), Bytes::from_static(&[5, 6])],
            skipped_l1_message_bitmap: Bytes::new(),
        };
        let calldata = call.abi_encode();
        assert_eq!(&calldata[..4], commitBatchCall::SELECTOR);

        let decoded = commitBatchCall::abi_decode(&calldata).unwrap();
        assert_eq!(decoded.version, 1);
        assert_eq!(decoded.chunks.len(), 2);
    }

    #[test]
    fn oracle_calls_have_distinct_selectors() {
        assert_ne!(setL1BaseFeeCall::SELECTOR, setL2BaseFeeCall::SELECTOR);
        let call = setL1BaseFeeCall { new_base_fee: U256::from(1_000_000_000u64) };
        let decoded = setL1BaseFeeCall::abi_decode(&call.abi_encode()).unwrap();
        assert_eq!(decoded.new_base_fee, U256::from(1_000_000_000u64));
    }

    #[test]
    fn genesis_import_encodes_header_and_root() {
        let call = importGenesisBatchCall {
            batch_header: Bytes::from_static(&[0; 89]),
            state_root: B256::repeat_byte(0x42),
        };
        let decoded = importGenesisBatchCall::abi_decode(&call.abi_encode()).unwrap();
        assert_eq!(decoded.state_root, B256::repeat_byte(0x42));
    }
}
