mod bootstrap;
mod loop_runner;
mod select;
mod services;
mod settings;

pub(crate) use loop_runner::run;
