//! ABI descriptor handed to the backend.
//!
//! The JSON ABI itself is produced elsewhere; the backend only needs the
//! published link so the deployed code can report where its ABI lives.

/// Deployment metadata for the program being compiled.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbiDescriptor {
    /// Link returned by the `get_abi_ipfs` getter, e.g. `ipfs://Qm...`.
    pub link: String,
}

impl AbiDescriptor {
    pub fn new(link: impl Into<String>) -> Self {
        Self { link: link.into() }
    }
}
