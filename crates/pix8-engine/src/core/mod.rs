pub mod fixed;
pub mod scene;
