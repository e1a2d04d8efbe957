//! Key material, the purpose registry and filesystem loading.

pub mod loader;
pub mod material;
pub mod registry;

pub use loader::{KeyPaths, load_registry};
pub use material::{AlgorithmFamily, KeyMaterial, PrivateKey, PublicKey, RawKey};
pub use registry::{KeyRegistry, Purpose};
