mod catalog;
mod repl;
mod stdio;

pub(crate) use catalog::run_catalog_mode;
pub(crate) use repl::run_repl_mode;
pub(crate) use stdio::run_stdio_mode;
