/// This module contains the batch database model.
pub mod batch;

/// This module contains the chunk database model.
pub mod chunk;

/// This module contains the L1 block database model.
pub mod l1_block;

/// This module contains the L2 block database model.
pub mod l2_block;

/// This module contains the metadata model.
pub mod metadata;
