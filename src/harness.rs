pub mod oracle;
pub mod grid;
pub mod runner;
pub mod report;
