pub mod init;
pub mod list;
pub mod new;
pub mod run;
pub mod status;
