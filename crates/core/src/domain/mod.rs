pub mod files;
pub mod publish;
pub mod stage;
pub mod task;
