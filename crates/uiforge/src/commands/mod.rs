pub mod build;
pub mod dev;
pub mod generate;
pub mod init;
pub mod preview;
pub mod serve;
