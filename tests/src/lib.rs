//! End-to-end tests of the rollup relayer pipeline.
