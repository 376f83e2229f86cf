pub mod shipments;
pub mod sync;
pub mod system;
