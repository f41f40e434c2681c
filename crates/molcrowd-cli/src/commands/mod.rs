pub mod arena;
pub mod run;
