//! The L1 contract surface of the relayer: the rollup contract events and
//! calls, and the gas oracle update calls on both chains.

mod abi;

pub use abi::*;
