pub mod evaluation;
pub mod run;
pub mod screening;
