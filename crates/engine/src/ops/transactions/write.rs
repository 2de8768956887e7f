mod common;
mod create;
mod delete;
mod update;
