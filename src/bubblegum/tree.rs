//! Concurrent merkle tree shape.

use thiserror::Error;

use crate::config::TreeConfig;

/// (max_depth, max_buffer_size) pairs the compression program can allocate.
pub const SUPPORTED_SHAPES: &[(u32, u32)] = &[
    (3, 8),
    (5, 8),
    (6, 16),
    (7, 16),
    (8, 16),
    (9, 16),
    (10, 32),
    (11, 32),
    (12, 32),
    (13, 32),
    (14, 64),
    (14, 256),
    (14, 1024),
    (14, 2048),
    (15, 64),
    (16, 64),
    (17, 64),
    (18, 64),
    (19, 64),
    (20, 64),
    (20, 256),
    (20, 1024),
    (20, 2048),
    (24, 64),
    (24, 256),
    (24, 512),
    (24, 1024),
    (24, 2048),
    (26, 512),
    (26, 1024),
    (26, 2048),
    (30, 512),
    (30, 1024),
    (30, 2048),
];

/// Largest canopy the compression program accepts.
pub const MAX_CANOPY_DEPTH: u32 = 17;

/// Account discriminator plus the tree header.
const HEADER_SIZE: usize = 2 + 54;

/// sequence_number, active_index, buffer_size.
const TREE_PREFIX_SIZE: usize = 3 * 8;

const NODE_SIZE: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("unsupported tree shape: max_depth {max_depth} with max_buffer_size {max_buffer_size}")]
    UnsupportedShape { max_depth: u32, max_buffer_size: u32 },

    #[error("canopy_depth {canopy_depth} must be less than max_depth {max_depth}")]
    CanopyTooDeep { canopy_depth: u32, max_depth: u32 },

    #[error("canopy_depth {0} exceeds the maximum of 17")]
    CanopyTooLarge(u32),
}

/// Parameters of a tree to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeParams {
    pub max_depth: u32,
    pub max_buffer_size: u32,
    pub canopy_depth: u32,
    pub public: Option<bool>,
}

impl TreeParams {
    pub fn validate(&self) -> Result<(), TreeError> {
        if !SUPPORTED_SHAPES.contains(&(self.max_depth, self.max_buffer_size)) {
            return Err(TreeError::UnsupportedShape {
                max_depth: self.max_depth,
                max_buffer_size: self.max_buffer_size,
            });
        }
        if self.canopy_depth > MAX_CANOPY_DEPTH {
            return Err(TreeError::CanopyTooLarge(self.canopy_depth));
        }
        if self.canopy_depth >= self.max_depth {
            return Err(TreeError::CanopyTooDeep {
                canopy_depth: self.canopy_depth,
                max_depth: self.max_depth,
            });
        }
        Ok(())
    }

    /// Bytes to allocate for the tree account.
    ///
    /// Header, then the change-log ring buffer (root, path, index and padding
    /// per entry), the rightmost proof, and the canopy nodes.
    pub fn account_size(&self) -> usize {
        let depth = self.max_depth as usize;
        let buffer = self.max_buffer_size as usize;
        let path_size = NODE_SIZE * depth + NODE_SIZE + 4 + 4;
        let change_log_size = NODE_SIZE + NODE_SIZE * depth + 4 + 4;
        let tree_size = TREE_PREFIX_SIZE + buffer * change_log_size + path_size;
        let canopy_size = ((1usize << (self.canopy_depth + 1)) - 2) * NODE_SIZE;
        HEADER_SIZE + tree_size + canopy_size
    }

    /// Number of leaves the tree can hold.
    pub fn capacity(&self) -> u64 {
        1u64 << self.max_depth
    }
}

impl From<&TreeConfig> for TreeParams {
    fn from(config: &TreeConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            max_buffer_size: config.max_buffer_size,
            canopy_depth: config.canopy_depth,
            public: config.public,
        }
    }
}
