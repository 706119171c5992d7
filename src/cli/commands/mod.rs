pub mod completions;
pub mod profiles;
pub mod run;
pub mod status;
