pub mod mixer;
pub mod versions;
